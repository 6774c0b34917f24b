use std::fmt::{self, Write};

use scheduling_cell::BatchResults;
use shared_models::{PatientRecommendations, Roster};

const RULE_WIDTH: usize = 65;

/// Plain-text report, one block per patient in roster order.
pub fn render_report(roster: &Roster, results: &BatchResults) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_report(&mut out, roster, results);
    out
}

fn write_report(out: &mut String, roster: &Roster, results: &BatchResults) -> fmt::Result {
    let heavy = "=".repeat(RULE_WIDTH);
    let light = "-".repeat(RULE_WIDTH);

    writeln!(out, "{}", heavy)?;
    writeln!(out, "  REHAB APPOINTMENT OPTIMIZATION RESULTS")?;
    writeln!(out, "{}", heavy)?;

    for patient in &roster.patients {
        let Some(result) = results.get(&patient.id) else {
            continue;
        };

        if patient.display_name == patient.id {
            writeln!(out, "\n  Patient: {}", patient.id)?;
        } else {
            writeln!(out, "\n  Patient: {} ({})", patient.id, patient.display_name)?;
        }
        write_patient(out, result)?;
        writeln!(out, "{}", light)?;
    }

    Ok(())
}

fn write_patient(out: &mut String, result: &PatientRecommendations) -> fmt::Result {
    if let Some(notification) = &result.notification {
        writeln!(
            out,
            "  [{}] {}",
            notification.level.to_string().to_uppercase(),
            notification.message
        )?;
    }

    writeln!(out, "  Recommendations:")?;
    if result.is_empty() {
        return writeln!(out, "    No suitable appointments found.");
    }

    for rec in &result.recommendations {
        let a = &rec.assignment;
        writeln!(
            out,
            "    #{}: {}, {}, {:.1} km away (Score: {:.2})",
            rec.rank, a.doctor_label, a.timeslot_label, a.distance_km, a.score
        )?;
    }
    Ok(())
}
