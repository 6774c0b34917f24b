// libs/scheduling-cell/src/services/feasibility.rs
use std::fmt;

use tracing::debug;

use shared_models::{BlockSet, Doctor, Patient, Timeslot};

use crate::models::{Candidate, SolveRequest};
use crate::services::scoring::{score_triple, total_slots};

/// First hard constraint a triple violates, in check order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Infeasibility {
    PatientUnavailable,
    DoctorUnavailable,
    MissingDistance,
    TooFar,
    SpecialtyMismatch,
    Blocked,
}

impl fmt::Display for Infeasibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Infeasibility::PatientUnavailable => "patient unavailable",
            Infeasibility::DoctorUnavailable => "doctor unavailable",
            Infeasibility::MissingDistance => "no distance recorded",
            Infeasibility::TooFar => "beyond travel radius",
            Infeasibility::SpecialtyMismatch => "specialty mismatch",
            Infeasibility::Blocked => "blocked",
        };
        f.write_str(reason)
    }
}

/// "General" on either side matches anything; an empty need counts as "General".
pub fn specialty_matches(patient: &Patient, doctor: &Doctor) -> bool {
    patient.needs_any_specialty()
        || doctor.is_generalist()
        || doctor.offers(patient.specialty_needed.trim())
}

/// Checks a single triple against every per-triple hard constraint and
/// returns the patient-doctor distance when it passes.
///
/// Capacity (one appointment per patient, one patient per doctor and slot)
/// spans several triples and is enforced by the solvers.
pub fn check_triple(
    patient: &Patient,
    doctor: &Doctor,
    timeslot: &Timeslot,
    blocked: &BlockSet,
) -> Result<f64, Infeasibility> {
    if !patient.is_available(&timeslot.id) {
        return Err(Infeasibility::PatientUnavailable);
    }
    if !doctor.is_available(&timeslot.id) {
        return Err(Infeasibility::DoctorUnavailable);
    }

    let distance_km = patient
        .distance_to(&doctor.id)
        .ok_or(Infeasibility::MissingDistance)?;
    if distance_km > patient.max_distance_km {
        return Err(Infeasibility::TooFar);
    }

    if !specialty_matches(patient, doctor) {
        return Err(Infeasibility::SpecialtyMismatch);
    }
    if blocked.is_blocked(&patient.id, &doctor.id, &timeslot.id) {
        return Err(Infeasibility::Blocked);
    }

    Ok(distance_km)
}

/// Enumerates and scores every feasible triple, sorted by (patient, doctor, timeslot) id.
///
/// Both solver strategies start from this list, so a triple that fails any
/// hard constraint never reaches either of them.
pub fn feasible_candidates(request: &SolveRequest<'_>) -> Vec<Candidate> {
    let total_slots = total_slots(request.timeslots);
    let mut candidates = Vec::new();

    for patient in request.patients {
        for doctor in request.doctors {
            // Doctor-level checks first so unreachable doctors skip the slot loop.
            let Some(distance_km) = patient.distance_to(&doctor.id) else {
                continue;
            };
            if distance_km > patient.max_distance_km || !specialty_matches(patient, doctor) {
                continue;
            }

            for timeslot in request.timeslots {
                if let Ok(distance_km) = check_triple(patient, doctor, timeslot, request.blocked) {
                    let breakdown = score_triple(
                        patient,
                        &doctor.id,
                        distance_km,
                        timeslot,
                        total_slots,
                        &request.weights,
                    );
                    candidates.push(Candidate {
                        patient_id: patient.id.clone(),
                        doctor_id: doctor.id.clone(),
                        doctor_label: doctor.display_name.clone(),
                        timeslot_id: timeslot.id.clone(),
                        timeslot_label: timeslot.label.clone(),
                        distance_km,
                        breakdown,
                    });
                }
            }
        }
    }

    candidates.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

    debug!(
        "Enumerated {} feasible triples out of {}",
        candidates.len(),
        request.patients.len() * request.doctors.len() * request.timeslots.len()
    );

    candidates
}
