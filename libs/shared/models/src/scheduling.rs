use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Specialty label that matches any requirement or offering.
pub const GENERAL_SPECIALTY: &str = "General";

/// Time preference used when a patient has not rated a slot.
pub const DEFAULT_TIME_PREFERENCE: f64 = 0.5;

// ==============================================================================
// PATIENTS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum UrgencyLevel {
    #[default]
    Low,
    Medium,
    High,
}

impl UrgencyLevel {
    /// Ordinal weight used by the urgency bonus (Low=1, Medium=2, High=3).
    pub fn value(self) -> u8 {
        match self {
            UrgencyLevel::Low => 1,
            UrgencyLevel::Medium => 2,
            UrgencyLevel::High => 3,
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "low" => Some(UrgencyLevel::Low),
            "medium" => Some(UrgencyLevel::Medium),
            "high" => Some(UrgencyLevel::High),
            _ => None,
        }
    }
}

impl fmt::Display for UrgencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UrgencyLevel::Low => write!(f, "Low"),
            UrgencyLevel::Medium => write!(f, "Medium"),
            UrgencyLevel::High => write!(f, "High"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: String,
    pub display_name: String,
    /// Clinical movement-quality metric on a 0-10 scale.
    pub quality_score: f64,
    pub urgency: UrgencyLevel,
    pub max_distance_km: f64,
    pub specialty_needed: String,
    /// doctor id -> km
    #[serde(default)]
    pub distances: BTreeMap<String, f64>,
    /// timeslot id -> available
    #[serde(default)]
    pub availability: BTreeMap<String, bool>,
    #[serde(default)]
    pub continuity_providers: BTreeSet<String>,
    /// timeslot id -> preference in [0, 1]
    #[serde(default)]
    pub time_preference: BTreeMap<String, f64>,
}

impl Patient {
    /// A slot without an explicit entry counts as unavailable.
    pub fn is_available(&self, timeslot_id: &str) -> bool {
        self.availability.get(timeslot_id).copied().unwrap_or(false)
    }

    pub fn distance_to(&self, doctor_id: &str) -> Option<f64> {
        self.distances.get(doctor_id).copied()
    }

    pub fn has_seen(&self, doctor_id: &str) -> bool {
        self.continuity_providers.contains(doctor_id)
    }

    pub fn time_preference_for(&self, timeslot_id: &str) -> f64 {
        self.time_preference
            .get(timeslot_id)
            .copied()
            .unwrap_or(DEFAULT_TIME_PREFERENCE)
    }

    /// An empty need is treated like the "General" wildcard.
    pub fn needs_any_specialty(&self) -> bool {
        let need = self.specialty_needed.trim();
        need.is_empty() || need == GENERAL_SPECIALTY
    }
}

// ==============================================================================
// DOCTORS & TIMESLOTS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Doctor {
    pub id: String,
    pub display_name: String,
    pub specialties: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clinic_name: Option<String>,
    #[serde(default)]
    pub availability: BTreeMap<String, bool>,
}

impl Doctor {
    pub fn is_available(&self, timeslot_id: &str) -> bool {
        self.availability.get(timeslot_id).copied().unwrap_or(false)
    }

    pub fn is_generalist(&self) -> bool {
        self.specialties.contains(GENERAL_SPECIALTY)
    }

    pub fn offers(&self, specialty: &str) -> bool {
        self.specialties.contains(specialty)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeslot {
    pub id: String,
    pub label: String,
    /// Chronological position, 0 = earliest.
    pub index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

/// Reference data for one scheduling run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Roster {
    pub patients: Vec<Patient>,
    pub doctors: Vec<Doctor>,
    pub timeslots: Vec<Timeslot>,
}

impl Roster {
    pub fn patient(&self, patient_id: &str) -> Option<&Patient> {
        self.patients.iter().find(|p| p.id == patient_id)
    }

    pub fn doctor(&self, doctor_id: &str) -> Option<&Doctor> {
        self.doctors.iter().find(|d| d.id == doctor_id)
    }

    pub fn timeslot(&self, timeslot_id: &str) -> Option<&Timeslot> {
        self.timeslots.iter().find(|t| t.id == timeslot_id)
    }
}

// ==============================================================================
// OBJECTIVE WEIGHTS
// ==============================================================================

/// Linear weights of the four objective factors. They need not sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Weights {
    pub proximity: f64,
    pub urgency: f64,
    pub continuity: f64,
    pub time_preference: f64,
}

impl Weights {
    pub const fn new(proximity: f64, urgency: f64, continuity: f64, time_preference: f64) -> Self {
        Self {
            proximity,
            urgency,
            continuity,
            time_preference,
        }
    }

    /// Weights applied to a patient whose quality score is critical.
    pub const fn critical() -> Self {
        Self::new(0.15, 0.60, 0.15, 0.10)
    }

    pub fn as_array(&self) -> [f64; 4] {
        [self.proximity, self.urgency, self.continuity, self.time_preference]
    }
}

impl Default for Weights {
    fn default() -> Self {
        Self::new(0.20, 0.40, 0.20, 0.20)
    }
}

// ==============================================================================
// ASSIGNMENTS & BLOCK SETS
// ==============================================================================

/// A (patient, doctor, timeslot) combination.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Triple {
    pub patient_id: String,
    pub doctor_id: String,
    pub timeslot_id: String,
}

impl Triple {
    pub fn new(
        patient_id: impl Into<String>,
        doctor_id: impl Into<String>,
        timeslot_id: impl Into<String>,
    ) -> Self {
        Self {
            patient_id: patient_id.into(),
            doctor_id: doctor_id.into(),
            timeslot_id: timeslot_id.into(),
        }
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.patient_id, self.doctor_id, self.timeslot_id)
    }
}

/// Triples excluded from a solve. Lives for a single recommendation request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSet {
    triples: BTreeSet<Triple>,
}

impl BlockSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, triple: Triple) -> bool {
        self.triples.insert(triple)
    }

    pub fn is_blocked(&self, patient_id: &str, doctor_id: &str, timeslot_id: &str) -> bool {
        if self.triples.is_empty() {
            return false;
        }
        self.triples
            .contains(&Triple::new(patient_id, doctor_id, timeslot_id))
    }

    pub fn contains(&self, triple: &Triple) -> bool {
        self.triples.contains(triple)
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Triple> {
        self.triples.iter()
    }
}

impl FromIterator<Triple> for BlockSet {
    fn from_iter<I: IntoIterator<Item = Triple>>(iter: I) -> Self {
        Self {
            triples: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub patient_id: String,
    pub doctor_id: String,
    pub doctor_label: String,
    pub timeslot_id: String,
    pub timeslot_label: String,
    pub score: f64,
    pub distance_km: f64,
}

impl Assignment {
    pub fn triple(&self) -> Triple {
        Triple::new(&self.patient_id, &self.doctor_id, &self.timeslot_id)
    }
}

// ==============================================================================
// RECOMMENDATIONS & NOTIFICATIONS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Critical,
    Concerning,
}

impl fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationLevel::Critical => write!(f, "critical"),
            NotificationLevel::Concerning => write!(f, "concerning"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub rank: usize,
    #[serde(flatten)]
    pub assignment: Assignment,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientRecommendations {
    pub recommendations: Vec<Recommendation>,
    pub notification: Option<Notification>,
}

impl PatientRecommendations {
    pub fn is_empty(&self) -> bool {
        self.recommendations.is_empty()
    }
}
