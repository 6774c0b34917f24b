// libs/scheduling-cell/src/services/recommender.rs
use std::slice;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, instrument};

use shared_config::AppConfig;
use shared_models::{
    BlockSet, Doctor, Patient, PatientRecommendations, Recommendation, SchedulingError, Timeslot,
    Weights,
};

use crate::models::SolveRequest;
use crate::services::policy::adjust_for_quality_score;
use crate::services::solver::{build_solver, AssignmentSolver};
use crate::services::validation::{validate_patient, validate_roster};

/// Ranked alternatives for one patient, built by re-solving with earlier picks blocked.
#[derive(Clone)]
pub struct RecommendationService {
    solver: Arc<dyn AssignmentSolver>,
    max_recommendations: usize,
}

impl RecommendationService {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_solver(build_solver(config), config.max_recommendations)
    }

    pub fn with_solver(solver: Arc<dyn AssignmentSolver>, max_recommendations: usize) -> Self {
        Self {
            solver,
            max_recommendations,
        }
    }

    pub fn solver_name(&self) -> &'static str {
        self.solver.name()
    }

    /// **TOP-K RECOMMENDATIONS**
    /// Validates the roster and the target patient's record, then ranks up to
    /// `max_recommendations` appointments for `patient_id`.
    ///
    /// Other patients are not considered: two patients may both be offered the
    /// same (doctor, timeslot) as their first choice, and a malformed record on
    /// another patient does not affect this one.
    pub fn get_top_k_recommendations(
        &self,
        patient_id: &str,
        patients: &[Patient],
        doctors: &[Doctor],
        timeslots: &[Timeslot],
        weights: &Weights,
    ) -> Result<PatientRecommendations, SchedulingError> {
        let patient = patients
            .iter()
            .find(|p| p.id == patient_id)
            .ok_or_else(|| SchedulingError::PatientNotFound(patient_id.to_string()))?;

        validate_roster(patients, doctors, timeslots, weights)?;
        validate_patient(patient, doctors)?;

        self.recommend_for(patient, doctors, timeslots, weights)
    }

    /// Recommendation loop for an already-validated patient.
    #[instrument(skip_all, fields(patient_id = %patient.id))]
    pub(crate) fn recommend_for(
        &self,
        patient: &Patient,
        doctors: &[Doctor],
        timeslots: &[Timeslot],
        weights: &Weights,
    ) -> Result<PatientRecommendations, SchedulingError> {
        let start = Instant::now();
        debug!("Building recommendations for patient {}", patient.id);

        // **Score-triggered escalation on private copies**
        let adjustment = adjust_for_quality_score(patient, weights);
        let target = slice::from_ref(&adjustment.patient);

        let mut blocked = BlockSet::new();
        let mut recommendations = Vec::with_capacity(self.max_recommendations);

        for rank in 1..=self.max_recommendations {
            let request = SolveRequest::new(target, doctors, timeslots, adjustment.weights, &blocked);
            let mut outcome = self.solver.solve(&request)?;

            let Some(assignment) = outcome.assignments.remove(&patient.id) else {
                debug!("Feasible set exhausted after {} recommendations", rank - 1);
                break;
            };

            blocked.insert(assignment.triple());
            recommendations.push(Recommendation { rank, assignment });
        }

        info!(
            patient_id = %patient.id,
            solver = self.solver.name(),
            recommendations = recommendations.len(),
            notification = ?adjustment.notification.as_ref().map(|n| n.level),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Recommendations ready"
        );

        Ok(PatientRecommendations {
            recommendations,
            notification: adjustment.notification,
        })
    }
}
