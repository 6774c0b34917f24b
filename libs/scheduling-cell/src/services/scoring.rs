// libs/scheduling-cell/src/services/scoring.rs
use shared_models::{Patient, Timeslot, UrgencyLevel, Weights};

use crate::models::ScoreBreakdown;

/// Number of chronological positions: highest index + 1, or 0 with no slots.
pub fn total_slots(timeslots: &[Timeslot]) -> u32 {
    timeslots
        .iter()
        .map(|t| t.index)
        .max()
        .map_or(0, |max| max + 1)
}

/// 1 at the door, falling linearly to 0 at the patient's radius.
pub fn proximity(distance_km: f64, max_distance_km: f64) -> f64 {
    if max_distance_km > 0.0 {
        (1.0 - distance_km / max_distance_km).max(0.0)
    } else {
        0.0
    }
}

/// Earlier slots earn more, scaled by urgency.
pub fn urgency_bonus(urgency: UrgencyLevel, slot_index: u32, total_slots: u32) -> f64 {
    if total_slots == 0 {
        return 0.0;
    }
    f64::from(urgency.value()) * (1.0 - f64::from(slot_index) / f64::from(total_slots))
}

/// Weighted objective coefficient of assigning `patient` to `doctor_id` at `timeslot`.
pub fn score_triple(
    patient: &Patient,
    doctor_id: &str,
    distance_km: f64,
    timeslot: &Timeslot,
    total_slots: u32,
    weights: &Weights,
) -> ScoreBreakdown {
    let proximity = proximity(distance_km, patient.max_distance_km);
    let urgency_bonus = urgency_bonus(patient.urgency, timeslot.index, total_slots);
    let continuity = if patient.has_seen(doctor_id) { 1.0 } else { 0.0 };
    let time_preference = patient.time_preference_for(&timeslot.id);

    let total = weights.proximity * proximity
        + weights.urgency * urgency_bonus
        + weights.continuity * continuity
        + weights.time_preference * time_preference;

    ScoreBreakdown {
        proximity,
        urgency_bonus,
        continuity,
        time_preference,
        total,
    }
}
