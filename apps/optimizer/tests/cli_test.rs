use std::io::Write;
use std::process::{Command, Output};

use tempfile::NamedTempFile;

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_rehab-optimizer"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("failed to launch rehab-optimizer")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_demo_week_report() {
    let output = run(&[]);
    assert!(output.status.success());

    let report = stdout(&output);
    assert!(report.contains("REHAB APPOINTMENT OPTIMIZATION RESULTS"));
    assert!(report.contains("  Patient: patient_1 (Jane Doe)"));
    assert!(report.contains("  [CRITICAL]"));
    assert!(report.contains("    #1: Dr. Chen, Mon 9:00 AM, 5.0 km away (Score: 2.17)"));
    assert!(report.contains("  [CONCERNING]"));
}

#[test]
fn test_json_output_for_single_patient() {
    let output = run(&["--json", "--patient", "patient_2", "--solver", "greedy"]);
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let recs = json["patient_2"]["recommendations"].as_array().unwrap();
    assert_eq!(recs.len(), 3);
    assert_eq!(recs[0]["rank"], 1);
    assert_eq!(recs[0]["doctorId"], "dr_smith");
    assert_eq!(recs[0]["timeslotId"], "mon_1pm");
    assert!(json["patient_2"]["notification"].is_null());
}

#[test]
fn test_dataset_without_matches_still_succeeds() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
          "timeslots": [{{"timeslot_id": "slot_1", "day": "Monday", "time": "9:00 AM"}}],
          "doctors": [{{"doctor_id": "doctor_1", "name": "Dr. Ode", "specialties": ["Neuro"],
                        "availability": {{"Monday_9:00 AM": true}}}}],
          "patients": [{{"patient_id": "patient_1", "name": "Kim", "score": 6.5,
                         "specialty_needed": "MSK", "availability": {{"Monday_9:00 AM": true}},
                         "distances": {{"doctor_1": 2.0}}}}]
        }}"#
    )
    .unwrap();

    let path = file.path().to_string_lossy().into_owned();
    let output = run(&[&path, "--summary"]);
    assert!(output.status.success());

    let report = stdout(&output);
    assert!(report.starts_with("Dataset: 1 patients, 1 doctors, 1 timeslots"));
    assert!(report.contains("No suitable appointments found."));
}

#[test]
fn test_missing_dataset_exits_with_error() {
    let output = run(&["/definitely/not/here.json"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("could not load dataset"));
}
