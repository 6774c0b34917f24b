#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use scheduling_cell::{AssignmentSolver, ExactSolver, FallbackSolver, GreedySolver, RecommendationService};
use shared_models::{Doctor, Patient, Timeslot, UrgencyLevel};

pub fn patient(id: &str, need: &str, max_distance_km: f64) -> Patient {
    Patient {
        id: id.to_string(),
        display_name: format!("Patient {}", id),
        quality_score: 8.0,
        urgency: UrgencyLevel::Low,
        max_distance_km,
        specialty_needed: need.to_string(),
        distances: BTreeMap::new(),
        availability: BTreeMap::new(),
        continuity_providers: BTreeSet::new(),
        time_preference: BTreeMap::new(),
    }
}

pub fn doctor(id: &str, specialties: &[&str], open: &[&str]) -> Doctor {
    Doctor {
        id: id.to_string(),
        display_name: format!("Dr. {}", id),
        specialties: specialties.iter().map(|s| s.to_string()).collect(),
        clinic_name: None,
        availability: open.iter().map(|t| (t.to_string(), true)).collect(),
    }
}

pub fn timeslots(ids: &[&str]) -> Vec<Timeslot> {
    ids.iter()
        .enumerate()
        .map(|(index, id)| Timeslot {
            id: id.to_string(),
            label: id.to_string(),
            index: index as u32,
            date: None,
        })
        .collect()
}

pub fn with_distance(mut patient: Patient, doctor_id: &str, km: f64) -> Patient {
    patient.distances.insert(doctor_id.to_string(), km);
    patient
}

pub fn with_open(mut patient: Patient, slots: &[&str]) -> Patient {
    for slot in slots {
        patient.availability.insert(slot.to_string(), true);
    }
    patient
}

pub fn exact_solver() -> Arc<dyn AssignmentSolver> {
    Arc::new(FallbackSolver::new(ExactSolver::new(None)))
}

pub fn greedy_solver() -> Arc<dyn AssignmentSolver> {
    Arc::new(GreedySolver)
}

pub fn recommender(solver: Arc<dyn AssignmentSolver>) -> RecommendationService {
    RecommendationService::with_solver(solver, 3)
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {}, got {}",
        expected,
        actual
    );
}
