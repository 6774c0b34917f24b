// libs/scheduling-cell/src/services/validation.rs
use std::collections::BTreeSet;

use shared_models::{Doctor, Patient, SchedulingError, Timeslot, Weights};

use crate::services::feasibility::specialty_matches;

/// Rejects inputs that would otherwise be silently misread by the solvers.
pub fn validate_instance(
    patients: &[Patient],
    doctors: &[Doctor],
    timeslots: &[Timeslot],
    weights: &Weights,
) -> Result<(), SchedulingError> {
    validate_roster(patients, doctors, timeslots, weights)?;
    for patient in patients {
        validate_patient(patient, doctors)?;
    }
    Ok(())
}

/// Checks shared by every patient: weights, unique ids and unique slot indices.
///
/// Per-patient records are left to [`validate_patient`].
pub fn validate_roster(
    patients: &[Patient],
    doctors: &[Doctor],
    timeslots: &[Timeslot],
    weights: &Weights,
) -> Result<(), SchedulingError> {
    validate_weights(weights)?;

    unique_ids("patient", patients.iter().map(|p| p.id.as_str()))?;
    unique_ids("doctor", doctors.iter().map(|d| d.id.as_str()))?;
    unique_ids("timeslot", timeslots.iter().map(|t| t.id.as_str()))?;

    let mut indices = BTreeSet::new();
    for slot in timeslots {
        if !indices.insert(slot.index) {
            return Err(malformed(format!(
                "timeslot {} reuses chronological index {}",
                slot.id, slot.index
            )));
        }
    }

    Ok(())
}

fn validate_weights(weights: &Weights) -> Result<(), SchedulingError> {
    let names = ["proximity", "urgency", "continuity", "timePreference"];
    for (name, value) in names.iter().zip(weights.as_array()) {
        if !value.is_finite() || value < 0.0 {
            return Err(malformed(format!(
                "weight {} must be a non-negative number, got {}",
                name, value
            )));
        }
    }
    Ok(())
}

pub fn validate_patient(patient: &Patient, doctors: &[Doctor]) -> Result<(), SchedulingError> {
    if !patient.quality_score.is_finite() || !(0.0..=10.0).contains(&patient.quality_score) {
        return Err(malformed(format!(
            "patient {} quality score {} is outside 0-10",
            patient.id, patient.quality_score
        )));
    }

    if !patient.max_distance_km.is_finite() || patient.max_distance_km < 0.0 {
        return Err(malformed(format!(
            "patient {} has invalid max distance {}",
            patient.id, patient.max_distance_km
        )));
    }

    for (doctor_id, km) in &patient.distances {
        if !km.is_finite() || *km < 0.0 {
            return Err(malformed(format!(
                "patient {} has invalid distance {} to doctor {}",
                patient.id, km, doctor_id
            )));
        }
    }

    for (slot_id, preference) in &patient.time_preference {
        if !(0.0..=1.0).contains(preference) {
            return Err(malformed(format!(
                "patient {} time preference {} for slot {} is outside 0-1",
                patient.id, preference, slot_id
            )));
        }
    }

    // Every doctor who could treat the patient needs a recorded distance.
    if let Some(doctor) = doctors
        .iter()
        .find(|d| specialty_matches(patient, d) && patient.distance_to(&d.id).is_none())
    {
        return Err(malformed(format!(
            "patient {} has no distance entry for doctor {}",
            patient.id, doctor.id
        )));
    }

    Ok(())
}

fn unique_ids<'a>(kind: &str, ids: impl Iterator<Item = &'a str>) -> Result<(), SchedulingError> {
    let mut seen = BTreeSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(malformed(format!("duplicate {} id '{}'", kind, id)));
        }
    }
    Ok(())
}

fn malformed(message: String) -> SchedulingError {
    SchedulingError::MalformedInput(message)
}
