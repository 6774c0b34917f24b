use std::io::Write;

use assert_matches::assert_matches;
use tempfile::NamedTempFile;

use shared_dataset::{load_dataset, parse_dataset, DatasetError, DEFAULT_MAX_DISTANCE_KM};
use shared_models::UrgencyLevel;

// ==============================================================================
// OPTIMIZER SHAPE
// ==============================================================================

const OPTIMIZER_DATASET: &str = r#"{
  "timeslots": [
    {"timeslot_id": "slot_1", "day": "Monday", "time": "9:00 AM", "date": "2025-06-16"},
    {"timeslot_id": "slot_2", "day": "Monday", "time": "2:00 PM"},
    {"timeslot_id": "slot_3", "day": "Tuesday", "time": "9:00 AM"}
  ],
  "doctors": [
    {
      "doctor_id": "doctor_1",
      "name": "Dr. Alvarez",
      "specialties": ["MSK"],
      "clinic_name": "West Side PT Clinic",
      "availability": {"Monday_9:00 AM": true, "Monday_2:00 PM": false, "slot_3": 1}
    }
  ],
  "patients": [
    {
      "patient_id": "patient_1",
      "name": "Ana",
      "score": 2.1,
      "urgency": "High",
      "max_distance": 12.5,
      "specialty_needed": "MSK",
      "availability": {"Monday_9:00 AM": true, "Friday_9:00 AM": true},
      "time_preferences": {"Monday_9:00 AM": 0.9},
      "continuity_doctors": ["doctor_1"],
      "distances": {"doctor_1": 4.2, "doctor_99": 1.0}
    },
    {
      "patient_id": "patient_2",
      "score": 8.0,
      "urgency": "Critical",
      "availability": {}
    }
  ]
}"#;

#[test]
fn parses_optimizer_shape() {
    let roster = parse_dataset(OPTIMIZER_DATASET).unwrap();

    assert_eq!(roster.timeslots.len(), 3);
    let slot = roster.timeslot("slot_2").unwrap();
    assert_eq!(slot.index, 1);
    assert_eq!(slot.label, "Mon 2:00 PM");
    assert!(roster.timeslot("slot_1").unwrap().date.is_some());

    let doctor = roster.doctor("doctor_1").unwrap();
    assert!(doctor.is_available("slot_1"));
    assert!(!doctor.is_available("slot_2"));
    assert!(doctor.is_available("slot_3"));
    assert_eq!(doctor.clinic_name.as_deref(), Some("West Side PT Clinic"));

    let ana = roster.patient("patient_1").unwrap();
    assert_eq!(ana.urgency, UrgencyLevel::High);
    assert_eq!(ana.max_distance_km, 12.5);
    assert!(ana.is_available("slot_1"));
    // unknown "Friday_9:00 AM" key is dropped
    assert_eq!(ana.availability.len(), 1);
    assert_eq!(ana.time_preference_for("slot_1"), 0.9);
    assert!(ana.has_seen("doctor_1"));
    assert_eq!(ana.distance_to("doctor_1"), Some(4.2));
    assert_eq!(ana.distance_to("doctor_99"), None);
}

#[test]
fn optional_patient_fields_take_defaults() {
    let roster = parse_dataset(OPTIMIZER_DATASET).unwrap();
    let patient = roster.patient("patient_2").unwrap();

    assert_eq!(patient.display_name, "patient_2");
    assert_eq!(patient.urgency, UrgencyLevel::Low);
    assert_eq!(patient.max_distance_km, DEFAULT_MAX_DISTANCE_KM);
    assert!(patient.needs_any_specialty());
    assert!(patient.distances.is_empty());
}

// ==============================================================================
// SYNTHETIC GENERATOR SHAPE
// ==============================================================================

const SYNTHETIC_DATASET: &str = r#"{
  "timeslots": [
    {"timeslot_id": "slot_1", "day": "Monday", "time": "9:00 AM"},
    {"timeslot_id": "slot_2", "day": "Monday", "time": "10:00 AM"},
    {"timeslot_id": "slot_3", "day": "Tuesday", "time": "9:00 AM"},
    {"timeslot_id": "slot_4", "day": "Tuesday", "time": "10:00 AM"}
  ],
  "doctors": [
    {
      "doctor_id": "doctor_1",
      "name": "Dr. Patel",
      "specialties": ["Neuro", "General"],
      "available_days": ["Tuesday"],
      "available_times": ["9:00 AM", "10:00 AM"]
    }
  ],
  "patients": [
    {
      "patient_id": "patient_1",
      "name": "Ben",
      "score": 4.0,
      "urgency": "Medium",
      "specialty_needed": "Neuro",
      "max_distance_km": 18,
      "available_days": ["Monday", "Tuesday"],
      "available_times": ["9:00 AM"],
      "preferred_times": ["9:00 AM"]
    }
  ],
  "continuity_relationships": {"patient_1": ["doctor_1"]},
  "distance_matrix": {"patient_1": {"doctor_1": 6.5}}
}"#;

#[test]
fn expands_synthetic_day_and_time_lists() {
    let roster = parse_dataset(SYNTHETIC_DATASET).unwrap();

    let doctor = roster.doctor("doctor_1").unwrap();
    assert!(!doctor.is_available("slot_1"));
    assert!(doctor.is_available("slot_3"));
    assert!(doctor.is_available("slot_4"));

    let ben = roster.patient("patient_1").unwrap();
    assert!(ben.is_available("slot_1"));
    assert!(!ben.is_available("slot_2"));
    assert!(ben.is_available("slot_3"));
    assert_eq!(ben.max_distance_km, 18.0);
    assert_eq!(ben.time_preference_for("slot_3"), 1.0);
    assert_eq!(ben.time_preference_for("slot_2"), 0.0);
    assert!(ben.has_seen("doctor_1"));
    assert_eq!(ben.distance_to("doctor_1"), Some(6.5));
}

// ==============================================================================
// FAILURES & FILE LOADING
// ==============================================================================

#[test]
fn rejects_invalid_json() {
    assert_matches!(parse_dataset("{ not json"), Err(DatasetError::Parse(_)));
}

#[test]
fn rejects_duplicate_timeslot_ids() {
    let json = r#"{
      "timeslots": [
        {"timeslot_id": "slot_1", "day": "Monday", "time": "9:00 AM"},
        {"timeslot_id": "slot_1", "day": "Monday", "time": "10:00 AM"}
      ],
      "doctors": [],
      "patients": []
    }"#;
    assert_matches!(parse_dataset(json), Err(DatasetError::Malformed(msg)) if msg.contains("slot_1"));
}

#[test]
fn rejects_dataset_without_timeslots() {
    let json = r#"{"timeslots": [], "doctors": [], "patients": []}"#;
    assert_matches!(parse_dataset(json), Err(DatasetError::Malformed(_)));
}

#[test]
fn loads_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(OPTIMIZER_DATASET.as_bytes()).unwrap();

    let roster = load_dataset(file.path()).unwrap();
    assert_eq!(roster.patients.len(), 2);
}

#[test]
fn missing_file_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.json");

    let err = load_dataset(&path).unwrap_err();
    assert_matches!(&err, DatasetError::Io { path: p, .. } if p == &path);
    assert!(err.to_string().contains("absent.json"));
}
