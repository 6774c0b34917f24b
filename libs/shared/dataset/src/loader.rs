use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use shared_models::{Doctor, Patient, Roster, Timeslot, UrgencyLevel};

/// Search radius assumed when a patient record carries none.
pub const DEFAULT_MAX_DISTANCE_KM: f64 = 50.0;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Failed to read dataset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Dataset is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Malformed dataset: {0}")]
    Malformed(String),
}

// ==============================================================================
// RAW FILE SHAPES
// ==============================================================================

/// Availability flags appear both as booleans and as 0/1 integers.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Int(i64),
}

impl Flag {
    fn is_set(self) -> bool {
        match self {
            Flag::Bool(b) => b,
            Flag::Int(i) => i != 0,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawDataset {
    patients: Vec<RawPatient>,
    doctors: Vec<RawDoctor>,
    timeslots: Vec<RawTimeslot>,
    #[serde(default)]
    continuity_relationships: HashMap<String, Vec<String>>,
    #[serde(default)]
    distance_matrix: HashMap<String, BTreeMap<String, f64>>,
}

#[derive(Debug, Deserialize)]
struct RawTimeslot {
    timeslot_id: String,
    day: String,
    time: String,
    #[serde(default)]
    date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
struct RawDoctor {
    doctor_id: String,
    name: String,
    #[serde(default)]
    specialties: Vec<String>,
    #[serde(default)]
    clinic_name: Option<String>,
    #[serde(default)]
    availability: BTreeMap<String, Flag>,
    #[serde(default)]
    available_days: Option<Vec<String>>,
    #[serde(default)]
    available_times: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct RawPatient {
    patient_id: String,
    #[serde(default)]
    name: Option<String>,
    score: f64,
    #[serde(default)]
    urgency: Option<String>,
    #[serde(default)]
    max_distance: Option<f64>,
    #[serde(default)]
    max_distance_km: Option<f64>,
    #[serde(default)]
    specialty_needed: Option<String>,
    #[serde(default)]
    availability: BTreeMap<String, Flag>,
    #[serde(default)]
    time_preferences: BTreeMap<String, f64>,
    #[serde(default)]
    continuity_doctors: Option<Vec<String>>,
    #[serde(default)]
    distances: Option<BTreeMap<String, f64>>,
    #[serde(default)]
    available_days: Option<Vec<String>>,
    #[serde(default)]
    available_times: Option<Vec<String>>,
    #[serde(default)]
    preferred_times: Option<Vec<String>>,
}

// ==============================================================================
// SLOT KEY RESOLUTION
// ==============================================================================

/// Resolves "Monday_9:00 AM" style keys, or plain timeslot ids, to timeslot ids.
struct SlotIndex {
    by_key: HashMap<String, String>,
    /// (id, day, time) in file order
    slots: Vec<(String, String, String)>,
}

impl SlotIndex {
    fn build(raw: &[RawTimeslot]) -> Result<Self, DatasetError> {
        let mut by_key = HashMap::new();
        let mut ids = BTreeSet::new();
        let mut slots = Vec::with_capacity(raw.len());

        for ts in raw {
            if !ids.insert(ts.timeslot_id.clone()) {
                return Err(DatasetError::Malformed(format!(
                    "duplicate timeslot_id '{}'",
                    ts.timeslot_id
                )));
            }
            let key = slot_key(&ts.day, &ts.time);
            if by_key.contains_key(&key) {
                warn!(
                    "Timeslot {} repeats day/time key '{}'; keyed entries resolve to the first",
                    ts.timeslot_id, key
                );
            } else {
                by_key.insert(key, ts.timeslot_id.clone());
            }
            slots.push((ts.timeslot_id.clone(), ts.day.clone(), ts.time.clone()));
        }

        for id in &ids {
            by_key.entry(id.clone()).or_insert_with(|| id.clone());
        }

        Ok(Self { by_key, slots })
    }

    fn resolve(&self, key: &str) -> Option<&str> {
        self.by_key.get(key.trim()).map(String::as_str)
    }

    /// Maps a keyed table onto timeslot ids, reporting how many keys matched nothing.
    fn remap<V: Copy>(&self, table: &BTreeMap<String, V>) -> (BTreeMap<String, V>, usize) {
        let mut mapped = BTreeMap::new();
        let mut skipped = 0;
        for (key, value) in table {
            match self.resolve(key) {
                Some(id) => {
                    mapped.insert(id.to_string(), *value);
                }
                None => {
                    debug!("Skipping unknown timeslot key '{}'", key);
                    skipped += 1;
                }
            }
        }
        (mapped, skipped)
    }

    /// Expands day/time lists into an explicit availability table over every slot.
    fn expand(&self, days: &[String], times: &[String]) -> BTreeMap<String, bool> {
        self.slots
            .iter()
            .map(|(id, day, time)| (id.clone(), days.contains(day) && times.contains(time)))
            .collect()
    }
}

fn slot_key(day: &str, time: &str) -> String {
    format!("{}_{}", day.trim(), time.trim())
}

fn slot_label(day: &str, time: &str) -> String {
    let short_day: String = day.trim().chars().take(3).collect();
    format!("{} {}", short_day, time.trim())
}

// ==============================================================================
// PUBLIC API
// ==============================================================================

/// Reads and converts a dataset file.
pub fn load_dataset<P: AsRef<Path>>(path: P) -> Result<Roster, DatasetError> {
    let path = path.as_ref();
    debug!("Loading dataset from {}", path.display());

    let contents = fs::read_to_string(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let roster = parse_dataset(&contents)?;
    info!(
        patients = roster.patients.len(),
        doctors = roster.doctors.len(),
        timeslots = roster.timeslots.len(),
        "Loaded dataset {}",
        path.display()
    );
    Ok(roster)
}

/// Converts dataset JSON (optimizer or synthetic-generator shape) into a roster.
pub fn parse_dataset(json: &str) -> Result<Roster, DatasetError> {
    let raw: RawDataset = serde_json::from_str(json)?;
    convert(raw)
}

fn convert(raw: RawDataset) -> Result<Roster, DatasetError> {
    if raw.timeslots.is_empty() {
        return Err(DatasetError::Malformed("dataset defines no timeslots".to_string()));
    }

    let index = SlotIndex::build(&raw.timeslots)?;

    let timeslots: Vec<Timeslot> = raw
        .timeslots
        .iter()
        .enumerate()
        .map(|(position, ts)| Timeslot {
            id: ts.timeslot_id.clone(),
            label: slot_label(&ts.day, &ts.time),
            index: position as u32,
            date: ts.date,
        })
        .collect();

    let doctors: Vec<Doctor> = raw
        .doctors
        .into_iter()
        .map(|d| convert_doctor(d, &index))
        .collect();
    let doctor_ids: BTreeSet<&str> = doctors.iter().map(|d| d.id.as_str()).collect();

    let mut continuity_relationships = raw.continuity_relationships;
    let mut distance_matrix = raw.distance_matrix;

    let patients = raw
        .patients
        .into_iter()
        .map(|p| {
            let continuity = continuity_relationships.remove(&p.patient_id);
            let distances = distance_matrix.remove(&p.patient_id);
            convert_patient(p, &index, &doctor_ids, continuity, distances)
        })
        .collect();

    Ok(Roster {
        patients,
        doctors,
        timeslots,
    })
}

fn convert_doctor(raw: RawDoctor, index: &SlotIndex) -> Doctor {
    let availability = if !raw.availability.is_empty() {
        let (mapped, skipped) = index.remap(&raw.availability);
        if skipped > 0 {
            warn!("Doctor {}: ignored {} unknown availability keys", raw.doctor_id, skipped);
        }
        mapped.into_iter().map(|(id, flag)| (id, flag.is_set())).collect()
    } else {
        match (&raw.available_days, &raw.available_times) {
            (Some(days), Some(times)) => index.expand(days, times),
            _ => BTreeMap::new(),
        }
    };

    Doctor {
        id: raw.doctor_id,
        display_name: raw.name,
        specialties: raw.specialties.into_iter().collect(),
        clinic_name: raw.clinic_name.filter(|c| !c.is_empty()),
        availability,
    }
}

fn convert_patient(
    raw: RawPatient,
    index: &SlotIndex,
    doctor_ids: &BTreeSet<&str>,
    continuity_fallback: Option<Vec<String>>,
    distance_fallback: Option<BTreeMap<String, f64>>,
) -> Patient {
    let synthetic_days = raw.available_days.as_deref();
    let synthetic_times = raw.available_times.as_deref();

    let availability = if !raw.availability.is_empty() {
        let (mapped, skipped) = index.remap(&raw.availability);
        if skipped > 0 {
            warn!("Patient {}: ignored {} unknown availability keys", raw.patient_id, skipped);
        }
        mapped.into_iter().map(|(id, flag)| (id, flag.is_set())).collect()
    } else {
        match (synthetic_days, synthetic_times) {
            (Some(days), Some(times)) => index.expand(days, times),
            _ => BTreeMap::new(),
        }
    };

    let time_preference = if !raw.time_preferences.is_empty() {
        let (mapped, skipped) = index.remap(&raw.time_preferences);
        if skipped > 0 {
            warn!("Patient {}: ignored {} unknown time preference keys", raw.patient_id, skipped);
        }
        mapped
    } else {
        match (synthetic_days, synthetic_times, raw.preferred_times.as_deref()) {
            (Some(days), Some(times), Some(preferred)) => index
                .slots
                .iter()
                .map(|(id, day, time)| {
                    let preference = if preferred.contains(time) {
                        1.0
                    } else if days.contains(day) && times.contains(time) {
                        0.5
                    } else {
                        0.0
                    };
                    (id.clone(), preference)
                })
                .collect(),
            _ => BTreeMap::new(),
        }
    };

    let urgency = match raw.urgency.as_deref() {
        None => UrgencyLevel::Low,
        Some(label) => UrgencyLevel::from_label(label).unwrap_or_else(|| {
            warn!("Patient {}: unknown urgency '{}', using Low", raw.patient_id, label);
            UrgencyLevel::Low
        }),
    };

    let mut distances = BTreeMap::new();
    for (doctor_id, km) in raw.distances.or(distance_fallback).unwrap_or_default() {
        if doctor_ids.contains(doctor_id.as_str()) {
            distances.insert(doctor_id, km);
        } else {
            warn!("Patient {}: distance to unknown doctor '{}' ignored", raw.patient_id, doctor_id);
        }
    }

    let continuity_providers = raw
        .continuity_doctors
        .or(continuity_fallback)
        .unwrap_or_default()
        .into_iter()
        .collect();

    Patient {
        display_name: raw.name.unwrap_or_else(|| raw.patient_id.clone()),
        id: raw.patient_id,
        quality_score: raw.score,
        urgency,
        max_distance_km: raw
            .max_distance
            .or(raw.max_distance_km)
            .unwrap_or(DEFAULT_MAX_DISTANCE_KM),
        specialty_needed: raw.specialty_needed.unwrap_or_default(),
        distances,
        availability,
        continuity_providers,
        time_preference,
    }
}
