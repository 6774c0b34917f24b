use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use shared_models::{Roster, UrgencyLevel};

/// Descriptive statistics printed before a run with `--summary`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetSummary {
    pub patients: usize,
    pub doctors: usize,
    pub timeslots: usize,
    pub urgency: BTreeMap<UrgencyLevel, usize>,
    /// specialty -> patients needing it
    pub specialty_demand: BTreeMap<String, usize>,
    /// specialty -> doctors offering it
    pub specialty_supply: BTreeMap<String, usize>,
    pub avg_patient_open_slots: f64,
    pub avg_doctor_open_slots: f64,
    pub continuity_links: usize,
    pub min_distance_km: Option<f64>,
    pub max_distance_km: Option<f64>,
    pub avg_distance_km: Option<f64>,
}

impl DatasetSummary {
    pub fn from_roster(roster: &Roster) -> Self {
        let mut urgency = BTreeMap::new();
        let mut specialty_demand = BTreeMap::new();
        let mut specialty_supply = BTreeMap::new();

        for patient in &roster.patients {
            *urgency.entry(patient.urgency).or_insert(0) += 1;
            let need = if patient.needs_any_specialty() {
                shared_models::GENERAL_SPECIALTY.to_string()
            } else {
                patient.specialty_needed.trim().to_string()
            };
            *specialty_demand.entry(need).or_insert(0) += 1;
        }

        for doctor in &roster.doctors {
            for specialty in &doctor.specialties {
                *specialty_supply.entry(specialty.clone()).or_insert(0) += 1;
            }
        }

        let patient_open: usize = roster
            .patients
            .iter()
            .map(|p| p.availability.values().filter(|open| **open).count())
            .sum();
        let doctor_open: usize = roster
            .doctors
            .iter()
            .map(|d| d.availability.values().filter(|open| **open).count())
            .sum();

        let distances: Vec<f64> = roster
            .patients
            .iter()
            .flat_map(|p| p.distances.values().copied())
            .collect();

        Self {
            patients: roster.patients.len(),
            doctors: roster.doctors.len(),
            timeslots: roster.timeslots.len(),
            urgency,
            specialty_demand,
            specialty_supply,
            avg_patient_open_slots: mean(patient_open as f64, roster.patients.len()),
            avg_doctor_open_slots: mean(doctor_open as f64, roster.doctors.len()),
            continuity_links: roster
                .patients
                .iter()
                .map(|p| p.continuity_providers.len())
                .sum(),
            min_distance_km: distances.iter().copied().reduce(f64::min),
            max_distance_km: distances.iter().copied().reduce(f64::max),
            avg_distance_km: if distances.is_empty() {
                None
            } else {
                Some(mean(distances.iter().sum(), distances.len()))
            },
        }
    }
}

fn mean(total: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}

impl fmt::Display for DatasetSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Dataset: {} patients, {} doctors, {} timeslots",
            self.patients, self.doctors, self.timeslots
        )?;

        let urgency: Vec<String> = self
            .urgency
            .iter()
            .map(|(level, n)| format!("{}={}", level, n))
            .collect();
        writeln!(f, "  Urgency: {}", urgency.join(", "))?;

        for (specialty, demand) in &self.specialty_demand {
            let supply = self.specialty_supply.get(specialty).copied().unwrap_or(0);
            writeln!(f, "  {}: {} patients / {} doctors", specialty, demand, supply)?;
        }

        writeln!(
            f,
            "  Open slots: {:.1} per patient, {:.1} per doctor",
            self.avg_patient_open_slots, self.avg_doctor_open_slots
        )?;
        writeln!(f, "  Continuity links: {}", self.continuity_links)?;

        match (self.min_distance_km, self.max_distance_km, self.avg_distance_km) {
            (Some(min), Some(max), Some(avg)) => write!(
                f,
                "  Distances: {:.1}-{:.1} km (avg {:.1})",
                min, max, avg
            ),
            _ => write!(f, "  Distances: none recorded"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo_roster;

    #[test]
    fn summarises_demo_roster() {
        let summary = DatasetSummary::from_roster(&demo_roster());

        assert_eq!(summary.patients, 3);
        assert_eq!(summary.urgency.get(&UrgencyLevel::Low), Some(&3));
        assert_eq!(summary.specialty_demand.get("Neuro"), Some(&1));
        assert_eq!(summary.specialty_supply.get("Post-op"), Some(&3));
        assert_eq!(summary.continuity_links, 2);
        assert_eq!(summary.min_distance_km, Some(3.0));
        assert_eq!(summary.max_distance_km, Some(18.0));

        let rendered = summary.to_string();
        assert!(rendered.starts_with("Dataset: 3 patients, 3 doctors, 13 timeslots"));
        assert!(rendered.contains("Neuro: 1 patients / 1 doctors"));
    }

    #[test]
    fn empty_roster_has_no_distance_stats() {
        let summary = DatasetSummary::from_roster(&Roster::default());
        assert_eq!(summary.avg_patient_open_slots, 0.0);
        assert_eq!(summary.avg_distance_km, None);
        assert!(summary.to_string().ends_with("none recorded"));
    }
}
