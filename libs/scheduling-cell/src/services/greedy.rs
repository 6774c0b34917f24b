// libs/scheduling-cell/src/services/greedy.rs
use std::collections::BTreeSet;

use tracing::debug;

use shared_models::SchedulingError;

use crate::models::{Candidate, SolveOutcome, SolveRequest, SolveStatus};
use crate::services::feasibility::feasible_candidates;
use crate::services::solver::AssignmentSolver;

/// Highest score first; equal scores fall back to patient, doctor, timeslot id.
///
/// Polynomial in the number of feasible triples and never times out. Not
/// globally optimal when patients compete for the same slot.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedySolver;

impl AssignmentSolver for GreedySolver {
    fn name(&self) -> &'static str {
        "greedy"
    }

    fn solve(&self, request: &SolveRequest<'_>) -> Result<SolveOutcome, SchedulingError> {
        let candidates = feasible_candidates(request);
        let chosen = greedy_assign(candidates);
        debug!("Greedy pass committed {} assignments", chosen.len());
        Ok(SolveOutcome::from_chosen(chosen, SolveStatus::Greedy))
    }
}

/// Commits candidates in score order while the patient and (doctor, slot) pair are free.
pub fn greedy_assign(mut candidates: Vec<Candidate>) -> Vec<Candidate> {
    candidates.sort_by(|a, b| {
        b.score()
            .total_cmp(&a.score())
            .then_with(|| a.sort_key().cmp(&b.sort_key()))
    });

    let mut assigned_patients = BTreeSet::new();
    let mut used_pairs = BTreeSet::new();
    let mut chosen = Vec::new();

    for candidate in candidates {
        if assigned_patients.contains(&candidate.patient_id) {
            continue;
        }
        let pair = (candidate.doctor_id.clone(), candidate.timeslot_id.clone());
        if used_pairs.contains(&pair) {
            continue;
        }

        assigned_patients.insert(candidate.patient_id.clone());
        used_pairs.insert(pair);
        chosen.push(candidate);
    }

    chosen
}
