// libs/scheduling-cell/src/services/batch.rs
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tracing::{error, info, instrument};

use shared_config::AppConfig;
use shared_models::{
    Doctor, Patient, PatientRecommendations, Roster, SchedulingError, Timeslot, Weights,
};

use crate::services::policy::adjust_for_quality_score;
use crate::services::recommender::RecommendationService;
use crate::services::validation::{validate_patient, validate_roster};

/// patient id -> ranked recommendations and notification
pub type BatchResults = BTreeMap<String, PatientRecommendations>;

/// Runs the recommender for every patient on the roster.
///
/// Roster-wide problems (weights, duplicate ids) fail the batch up front. After
/// that each patient is validated and solved independently: one patient's
/// malformed record or solver failure leaves that patient with an empty list
/// and never aborts the rest of the batch. Only cancellation stops the run.
#[derive(Clone)]
pub struct BatchOptimizer {
    recommender: RecommendationService,
    concurrency: usize,
}

impl BatchOptimizer {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_recommender(RecommendationService::new(config), config.batch_concurrency)
    }

    pub fn with_recommender(recommender: RecommendationService, concurrency: usize) -> Self {
        Self {
            recommender,
            concurrency: concurrency.max(1),
        }
    }

    /// Sequential batch, patients processed in roster order.
    #[instrument(skip_all, fields(patients = patients.len()))]
    pub fn optimize_all_patients(
        &self,
        patients: &[Patient],
        doctors: &[Doctor],
        timeslots: &[Timeslot],
        weights: &Weights,
    ) -> Result<BatchResults, SchedulingError> {
        let start = Instant::now();
        validate_roster(patients, doctors, timeslots, weights)?;

        let mut results = BatchResults::new();
        for patient in patients {
            let outcome = validate_patient(patient, doctors)
                .and_then(|()| self.recommender.recommend_for(patient, doctors, timeslots, weights));
            results.insert(patient.id.clone(), isolate_failure(patient, weights, outcome)?);
        }

        log_summary(&results, start);
        Ok(results)
    }

    /// **CONCURRENT BATCH**
    /// Same results as [`optimize_all_patients`](Self::optimize_all_patients), with up to
    /// `concurrency` patients solved at once on the blocking pool.
    #[instrument(skip_all, fields(patients = roster.patients.len(), concurrency = self.concurrency))]
    pub async fn optimize_all_patients_concurrent(
        &self,
        roster: Arc<Roster>,
        weights: Weights,
    ) -> Result<BatchResults, SchedulingError> {
        let start = Instant::now();
        validate_roster(&roster.patients, &roster.doctors, &roster.timeslots, &weights)?;

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let results = futures::future::join_all((0..roster.patients.len()).map(|position| {
            let semaphore = Arc::clone(&semaphore);
            let roster = Arc::clone(&roster);
            let recommender = self.recommender.clone();

            async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| SchedulingError::Backend(e.to_string()))?;

                let task = tokio::task::spawn_blocking(move || {
                    let patient = &roster.patients[position];
                    validate_patient(patient, &roster.doctors).and_then(|()| {
                        recommender.recommend_for(patient, &roster.doctors, &roster.timeslots, &weights)
                    })
                })
                .await;

                task.unwrap_or_else(|e| {
                    Err(SchedulingError::Backend(format!("recommendation task failed: {}", e)))
                })
            }
        }))
        .await;

        let mut batch = BatchResults::new();
        for (patient, outcome) in roster.patients.iter().zip(results) {
            batch.insert(patient.id.clone(), isolate_failure(patient, &weights, outcome)?);
        }

        log_summary(&batch, start);
        Ok(batch)
    }
}

/// Turns a per-patient error into an empty result. Cancellation still propagates.
fn isolate_failure(
    patient: &Patient,
    weights: &Weights,
    outcome: Result<PatientRecommendations, SchedulingError>,
) -> Result<PatientRecommendations, SchedulingError> {
    match outcome {
        Ok(recommendations) => Ok(recommendations),
        Err(SchedulingError::Cancelled) => Err(SchedulingError::Cancelled),
        Err(e) => {
            error!("Recommendations failed for patient {}: {}", patient.id, e);
            Ok(PatientRecommendations {
                recommendations: Vec::new(),
                notification: adjust_for_quality_score(patient, weights).notification,
            })
        }
    }
}

fn log_summary(results: &BatchResults, start: Instant) {
    let served = results.values().filter(|r| !r.is_empty()).count();
    let flagged = results.values().filter(|r| r.notification.is_some()).count();

    info!(
        patients = results.len(),
        served,
        flagged,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Batch optimization complete"
    );
}
