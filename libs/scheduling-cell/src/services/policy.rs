// libs/scheduling-cell/src/services/policy.rs
use tracing::debug;

use shared_models::{Notification, NotificationLevel, Patient, UrgencyLevel, Weights};

/// Quality score below which a patient is escalated to High urgency.
pub const CRITICAL_THRESHOLD: f64 = 3.0;

/// Quality score below which a patient is nudged to Medium urgency.
pub const CONCERNING_THRESHOLD: f64 = 5.0;

/// Travel radius multiplier for critical patients.
pub const CRITICAL_DISTANCE_EXPANSION: f64 = 1.5;

pub const CRITICAL_MESSAGE: &str =
    "Your recent exercise quality needs attention. We strongly recommend scheduling a follow-up ASAP.";

pub const CONCERNING_MESSAGE: &str = "Consider scheduling a check-in with your therapist.";

/// Adjusted copies of a patient and weights, plus the notification they triggered.
#[derive(Debug, Clone, PartialEq)]
pub struct Adjustment {
    pub patient: Patient,
    pub weights: Weights,
    pub notification: Option<Notification>,
}

/// Escalates urgency, radius and weights according to the patient's quality score.
///
/// Inputs are never touched; the caller receives fresh copies.
///
/// | score        | urgency | radius | weights              | notification |
/// |--------------|---------|--------|----------------------|--------------|
/// | `< 3.0`      | High    | x1.5   | [`Weights::critical`] | critical     |
/// | `[3.0, 5.0)` | Medium  | same   | same                 | concerning   |
/// | `>= 5.0`     | same    | same   | same                 | none         |
pub fn adjust_for_quality_score(patient: &Patient, weights: &Weights) -> Adjustment {
    let mut adjusted = patient.clone();
    let mut adjusted_weights = *weights;

    let notification = if patient.quality_score < CRITICAL_THRESHOLD {
        adjusted.urgency = UrgencyLevel::High;
        adjusted.max_distance_km *= CRITICAL_DISTANCE_EXPANSION;
        adjusted_weights = Weights::critical();
        Some(Notification {
            level: NotificationLevel::Critical,
            message: CRITICAL_MESSAGE.to_string(),
        })
    } else if patient.quality_score < CONCERNING_THRESHOLD {
        adjusted.urgency = UrgencyLevel::Medium;
        Some(Notification {
            level: NotificationLevel::Concerning,
            message: CONCERNING_MESSAGE.to_string(),
        })
    } else {
        None
    };

    if let Some(ref n) = notification {
        debug!(
            "Patient {} quality score {:.1} is {}: urgency {}, radius {:.1} km",
            patient.id, patient.quality_score, n.level, adjusted.urgency, adjusted.max_distance_km
        );
    }

    Adjustment {
        patient: adjusted,
        weights: adjusted_weights,
        notification,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use super::*;

    fn patient(score: f64) -> Patient {
        Patient {
            id: "p1".to_string(),
            display_name: "P".to_string(),
            quality_score: score,
            urgency: UrgencyLevel::Low,
            max_distance_km: 10.0,
            specialty_needed: String::new(),
            distances: BTreeMap::new(),
            availability: BTreeMap::new(),
            continuity_providers: BTreeSet::new(),
            time_preference: BTreeMap::new(),
        }
    }

    #[test]
    fn critical_score_escalates_everything() {
        let input = patient(2.0);
        let adjustment = adjust_for_quality_score(&input, &Weights::default());

        assert_eq!(adjustment.patient.urgency, UrgencyLevel::High);
        assert_eq!(adjustment.patient.max_distance_km, 15.0);
        assert_eq!(adjustment.weights, Weights::new(0.15, 0.60, 0.15, 0.10));
        let notification = adjustment.notification.unwrap();
        assert_eq!(notification.level, NotificationLevel::Critical);
        assert_eq!(notification.message, CRITICAL_MESSAGE);

        // input untouched
        assert_eq!(input, patient(2.0));
    }

    #[test]
    fn concerning_score_only_raises_urgency() {
        let weights = Weights::new(0.5, 0.1, 0.1, 0.3);
        let adjustment = adjust_for_quality_score(&patient(4.0), &weights);

        assert_eq!(adjustment.patient.urgency, UrgencyLevel::Medium);
        assert_eq!(adjustment.patient.max_distance_km, 10.0);
        assert_eq!(adjustment.weights, weights);
        assert_eq!(
            adjustment.notification.map(|n| n.level),
            Some(NotificationLevel::Concerning)
        );
    }

    #[test]
    fn healthy_score_changes_nothing() {
        let adjustment = adjust_for_quality_score(&patient(8.0), &Weights::default());

        assert_eq!(adjustment.patient, patient(8.0));
        assert_eq!(adjustment.weights, Weights::default());
        assert!(adjustment.notification.is_none());
    }

    #[test]
    fn thresholds_are_exclusive() {
        let at_critical = adjust_for_quality_score(&patient(3.0), &Weights::default());
        assert_eq!(at_critical.patient.urgency, UrgencyLevel::Medium);

        let at_concerning = adjust_for_quality_score(&patient(5.0), &Weights::default());
        assert!(at_concerning.notification.is_none());
    }
}
