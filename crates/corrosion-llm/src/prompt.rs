//! Prompt templates for mitigation advice and material selection.

use std::fmt::Write;

use corrosion_core::{MaterialQuery, PredictionResult, SeverityClass};

/// Advice prompt for one prediction row.
///
/// Includes every raw input, the predicted class, and the A–D legend, and
/// asks for exactly five bullet points.
pub fn main_prompt(prediction: &PredictionResult) -> String {
    let obs = &prediction.raw_input;
    let mut out = String::from(
        "You are a corrosion control expert assisting engineers in preventing material \
         degradation in industrial environments.\n\n\
         Given the following prediction:\n",
    );
    let _ = writeln!(out, "- Environment: {}", obs.environment());
    let _ = writeln!(out, "- Temperature (°C): {}", obs.temperature());
    let _ = writeln!(out, "- Concentration (%): {}", obs.concentration());
    let _ = writeln!(out, "- Alloy UNS: {}", obs.alloy_code());
    let _ = writeln!(out, "- Condition Description: {}", obs.condition_text());
    let _ = writeln!(out, "- Predicted Corrosion Rate: {}", prediction.label);

    out.push_str("\nInterpret the corrosion severity using the following scale:\n");
    for class in SeverityClass::RATED {
        if let (Some(grade), Some(band)) = (class.grade(), class.rate_band()) {
            let _ = writeln!(out, "- {grade} ({class}): {band}");
        }
    }

    out.push_str(
        "\nGenerate a concise technical recommendation with a clear bullet-point structure, \
         suitable for field engineers.\n\n\
         Respond in exactly 5 bullet points.\n",
    );
    out
}

/// Material-selection prompt asking for the top two or three candidates.
pub fn material_selection_prompt(query: &MaterialQuery) -> String {
    let mut out = String::from(
        "You are a corrosion engineering assistant helping select optimal materials for \
         corrosion resistance in industrial settings.\n\n\
         Based on the following operating and environmental conditions, recommend the \
         top 2–3 materials:\n\n",
    );
    for (label, value) in material_fields(query) {
        let _ = writeln!(out, "- {label}: {value}");
    }

    out.push_str(
        "\nPlease provide your output in the following format:\n\n\
         1. Material Name (UNS Code)\n   \
         - Why it is suitable (corrosion resistance, mechanical properties, compatibility)\n   \
         - Limitations or special handling considerations\n   \
         - Suggestions: surface treatments or enhancements, if needed\n\n\
         Conclude with:\n\
         - A final recommendation if one material clearly stands out for the given case.\n\
         - Reminders or caveats (for example site-specific testing and monitoring methods).\n\n\
         Use a professional and concise tone. Structure the response with bullet points or \
         short paragraphs so it reads well for engineers in the field.\n",
    );
    out
}

/// Plain-text export of a material-selection run.
pub fn material_report(query: &MaterialQuery, recommendation: &str) -> String {
    let mut out = String::from("Material Selection Report\n");
    out.push_str(&"=".repeat(40));
    out.push_str("\n\nInput Parameters:\n");
    for (label, value) in material_fields(query) {
        if label == "Additional Notes" && value.is_empty() {
            continue;
        }
        let _ = writeln!(out, "  • {label}: {value}");
    }
    out.push_str("\nAI Recommendations:\n");
    out.push_str(&"-".repeat(40));
    out.push('\n');
    out.push_str(recommendation);
    out.push('\n');
    out
}

fn material_fields(q: &MaterialQuery) -> [(&'static str, String); 11] {
    [
        ("Environment", q.environment.clone()),
        ("pH Level", q.ph.to_string()),
        ("Chloride Presence", q.chloride.clone()),
        ("Temperature", format!("{}°C", q.temperature)),
        ("Pressure", format!("{} bar", q.pressure)),
        ("Flow Condition", q.flow.clone()),
        ("Galvanic Contact", q.galvanic_contact.clone()),
        ("Required Design Life", format!("{} years", q.design_life_years)),
        ("Maintenance Requirements", q.maintenance.clone()),
        ("Budget Constraints", q.budget.clone()),
        ("Additional Notes", q.notes.clone()),
    ]
}
