use std::collections::{BTreeMap, BTreeSet};

use shared_models::{Doctor, Patient, Roster, Timeslot, UrgencyLevel};

const DEMO_SLOTS: [(&str, &str); 13] = [
    ("mon_9am", "Mon 9:00 AM"),
    ("mon_10am", "Mon 10:00 AM"),
    ("mon_1pm", "Mon 1:00 PM"),
    ("mon_2pm", "Mon 2:00 PM"),
    ("tue_9am", "Tue 9:00 AM"),
    ("tue_10am", "Tue 10:00 AM"),
    ("wed_9am", "Wed 9:00 AM"),
    ("wed_2pm", "Wed 2:00 PM"),
    ("thu_9am", "Thu 9:00 AM"),
    ("thu_1pm", "Thu 1:00 PM"),
    ("fri_9am", "Fri 9:00 AM"),
    ("fri_2pm", "Fri 2:00 PM"),
    ("fri_4pm", "Fri 4:00 PM"),
];

/// Built-in week used when the CLI runs without a dataset file.
pub fn demo_roster() -> Roster {
    let timeslots = DEMO_SLOTS
        .iter()
        .enumerate()
        .map(|(index, (id, label))| Timeslot {
            id: id.to_string(),
            label: label.to_string(),
            index: index as u32,
            date: None,
        })
        .collect();

    let doctors = vec![
        doctor("dr_smith", "Dr. Smith", &["MSK", "Post-op"], all_slots()),
        doctor(
            "dr_jones",
            "Dr. Jones",
            &["Post-op", "Neuro"],
            only(&["mon_1pm", "mon_2pm", "wed_2pm", "thu_1pm", "fri_2pm", "fri_4pm"]),
        ),
        doctor(
            "dr_chen",
            "Dr. Chen",
            &["Post-op", "MSK"],
            only(&[
                "mon_9am", "mon_10am", "tue_9am", "tue_10am", "wed_9am", "thu_9am", "thu_1pm",
                "fri_9am",
            ]),
        ),
    ];

    let patients = vec![
        Patient {
            id: "patient_1".to_string(),
            display_name: "Jane Doe".to_string(),
            quality_score: 2.5,
            urgency: UrgencyLevel::Low,
            max_distance_km: 15.0,
            specialty_needed: "Post-op".to_string(),
            distances: km(&[("dr_smith", 8.0), ("dr_jones", 10.0), ("dr_chen", 5.0)]),
            availability: all_slots(),
            continuity_providers: BTreeSet::from(["dr_chen".to_string()]),
            time_preference: prefs(&[
                ("mon_9am", 1.0),
                ("tue_9am", 1.0),
                ("wed_9am", 1.0),
                ("thu_9am", 1.0),
                ("fri_9am", 1.0),
                ("mon_10am", 0.8),
                ("tue_10am", 0.8),
                ("mon_1pm", 0.3),
                ("mon_2pm", 0.3),
                ("wed_2pm", 0.3),
                ("thu_1pm", 0.3),
                ("fri_2pm", 0.3),
                ("fri_4pm", 0.2),
            ]),
        },
        Patient {
            id: "patient_2".to_string(),
            display_name: "John Smith".to_string(),
            quality_score: 7.0,
            urgency: UrgencyLevel::Low,
            max_distance_km: 10.0,
            specialty_needed: "MSK".to_string(),
            distances: km(&[("dr_smith", 3.0), ("dr_jones", 7.0), ("dr_chen", 4.0)]),
            availability: only(&[
                "mon_9am", "mon_10am", "mon_1pm", "mon_2pm", "wed_9am", "wed_2pm", "fri_9am",
                "fri_2pm", "fri_4pm",
            ]),
            continuity_providers: BTreeSet::from(["dr_smith".to_string()]),
            time_preference: prefs(&[
                ("mon_1pm", 1.0),
                ("mon_2pm", 1.0),
                ("wed_2pm", 1.0),
                ("fri_2pm", 1.0),
                ("fri_4pm", 0.9),
                ("mon_9am", 0.4),
                ("mon_10am", 0.4),
                ("wed_9am", 0.4),
                ("fri_9am", 0.4),
            ]),
        },
        Patient {
            id: "patient_3".to_string(),
            display_name: "Maria Garcia".to_string(),
            quality_score: 4.5,
            urgency: UrgencyLevel::Low,
            max_distance_km: 20.0,
            specialty_needed: "Neuro".to_string(),
            distances: km(&[("dr_smith", 12.0), ("dr_jones", 15.0), ("dr_chen", 18.0)]),
            availability: all_slots(),
            continuity_providers: BTreeSet::new(),
            time_preference: DEMO_SLOTS.iter().map(|(id, _)| (id.to_string(), 0.5)).collect(),
        },
    ];

    Roster {
        patients,
        doctors,
        timeslots,
    }
}

fn doctor(id: &str, name: &str, specialties: &[&str], availability: BTreeMap<String, bool>) -> Doctor {
    Doctor {
        id: id.to_string(),
        display_name: name.to_string(),
        specialties: specialties.iter().map(|s| s.to_string()).collect(),
        clinic_name: None,
        availability,
    }
}

fn all_slots() -> BTreeMap<String, bool> {
    DEMO_SLOTS.iter().map(|(id, _)| (id.to_string(), true)).collect()
}

/// Explicit table: listed slots open, every other demo slot closed.
fn only(open: &[&str]) -> BTreeMap<String, bool> {
    DEMO_SLOTS
        .iter()
        .map(|(id, _)| (id.to_string(), open.contains(id)))
        .collect()
}

fn km(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
    entries.iter().map(|(id, d)| (id.to_string(), *d)).collect()
}

fn prefs(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
    km(entries)
}
