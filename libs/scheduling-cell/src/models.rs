use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use shared_models::{Assignment, BlockSet, Doctor, Patient, Timeslot, Triple, Weights};

/// Reported scores are rounded to this many decimal places.
pub const SCORE_DECIMALS: i32 = 4;

/// Scores closer than this are treated as ties.
pub const SCORE_TOLERANCE: f64 = 1e-9;

// ==============================================================================
// SOLVE REQUEST
// ==============================================================================

/// One assignment problem. Borrowed so callers can reuse the roster across solves.
#[derive(Debug, Clone, Copy)]
pub struct SolveRequest<'a> {
    pub patients: &'a [Patient],
    pub doctors: &'a [Doctor],
    pub timeslots: &'a [Timeslot],
    pub weights: Weights,
    pub blocked: &'a BlockSet,
}

impl<'a> SolveRequest<'a> {
    pub fn new(
        patients: &'a [Patient],
        doctors: &'a [Doctor],
        timeslots: &'a [Timeslot],
        weights: Weights,
        blocked: &'a BlockSet,
    ) -> Self {
        Self {
            patients,
            doctors,
            timeslots,
            weights,
            blocked,
        }
    }
}

// ==============================================================================
// CANDIDATES
// ==============================================================================

/// Per-factor contributions of one triple, before weighting, plus the weighted total.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub proximity: f64,
    pub urgency_bonus: f64,
    pub continuity: f64,
    pub time_preference: f64,
    pub total: f64,
}

/// A feasible triple with everything needed to report it.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub patient_id: String,
    pub doctor_id: String,
    pub doctor_label: String,
    pub timeslot_id: String,
    pub timeslot_label: String,
    pub distance_km: f64,
    pub breakdown: ScoreBreakdown,
}

impl Candidate {
    pub fn score(&self) -> f64 {
        self.breakdown.total
    }

    pub fn triple(&self) -> Triple {
        Triple::new(&self.patient_id, &self.doctor_id, &self.timeslot_id)
    }

    /// Lexical ordering key used for every tie-break.
    pub fn sort_key(&self) -> (&str, &str, &str) {
        (
            self.patient_id.as_str(),
            self.doctor_id.as_str(),
            self.timeslot_id.as_str(),
        )
    }

    pub fn into_assignment(self) -> Assignment {
        Assignment {
            score: round_score(self.breakdown.total),
            patient_id: self.patient_id,
            doctor_id: self.doctor_id,
            doctor_label: self.doctor_label,
            timeslot_id: self.timeslot_id,
            timeslot_label: self.timeslot_label,
            distance_km: self.distance_km,
        }
    }
}

pub fn round_score(score: f64) -> f64 {
    let factor = 10f64.powi(SCORE_DECIMALS);
    (score * factor).round() / factor
}

// ==============================================================================
// SOLVE OUTCOME
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolveStatus {
    Optimal,
    Greedy,
    Infeasible,
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveStatus::Optimal => write!(f, "optimal"),
            SolveStatus::Greedy => write!(f, "greedy"),
            SolveStatus::Infeasible => write!(f, "infeasible"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveOutcome {
    /// patient id -> assignment
    pub assignments: BTreeMap<String, Assignment>,
    pub objective: f64,
    pub status: SolveStatus,
}

impl SolveOutcome {
    pub fn infeasible() -> Self {
        Self {
            assignments: BTreeMap::new(),
            objective: 0.0,
            status: SolveStatus::Infeasible,
        }
    }

    /// Builds an outcome from chosen candidates. No candidates means infeasible.
    pub fn from_chosen(chosen: Vec<Candidate>, status: SolveStatus) -> Self {
        if chosen.is_empty() {
            return Self::infeasible();
        }

        let objective = chosen.iter().map(Candidate::score).sum();
        let assignments = chosen
            .into_iter()
            .map(|c| (c.patient_id.clone(), c.into_assignment()))
            .collect();

        Self {
            assignments,
            objective,
            status,
        }
    }

    pub fn is_infeasible(&self) -> bool {
        self.status == SolveStatus::Infeasible
    }

    /// True when no patient repeats and no (doctor, timeslot) pair is used twice.
    pub fn respects_capacity(&self) -> bool {
        let mut used = BTreeSet::new();
        self.assignments
            .values()
            .all(|a| used.insert((a.doctor_id.as_str(), a.timeslot_id.as_str())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(patient: &str, doctor: &str, slot: &str, total: f64) -> Candidate {
        Candidate {
            patient_id: patient.to_string(),
            doctor_id: doctor.to_string(),
            doctor_label: doctor.to_uppercase(),
            timeslot_id: slot.to_string(),
            timeslot_label: slot.to_uppercase(),
            distance_km: 1.0,
            breakdown: ScoreBreakdown {
                proximity: 0.0,
                urgency_bonus: 0.0,
                continuity: 0.0,
                time_preference: 0.0,
                total,
            },
        }
    }

    #[test]
    fn scores_round_to_four_places() {
        assert_eq!(round_score(1.234_567), 1.2346);
        assert_eq!(round_score(0.5), 0.5);
    }

    #[test]
    fn empty_choice_is_infeasible() {
        let outcome = SolveOutcome::from_chosen(Vec::new(), SolveStatus::Optimal);
        assert!(outcome.is_infeasible());
        assert_eq!(outcome.objective, 0.0);
    }

    #[test]
    fn objective_uses_unrounded_scores() {
        let outcome = SolveOutcome::from_chosen(
            vec![
                candidate("p1", "d1", "t1", 0.123_44),
                candidate("p2", "d1", "t2", 0.123_44),
            ],
            SolveStatus::Greedy,
        );

        assert_eq!(outcome.status, SolveStatus::Greedy);
        assert!((outcome.objective - 0.246_88).abs() < 1e-12);
        assert_eq!(outcome.assignments["p1"].score, 0.1234);
        assert!(outcome.respects_capacity());
    }
}
