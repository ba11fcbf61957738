//! Vertical card display for prediction and feature rows.
//!
//! Renders the first row of a RecordBatch as grouped `label  value` lines
//! with type-aware formatting for the scalar types our schemas use.

use std::fmt::Write;

use arrow::array::{Array, Float32Array, Float64Array, StringArray};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use arrow::util::display::{ArrayFormatter, FormatOptions};
use corrosion_core::schema::BASE_FEATURES;

// ── Section groupings ──

const INPUTS: &[&str] = &[
    "Environment",
    "Temperature (°C)",
    "Concentration (%)",
    "Alloy UNS",
    "Condition Description",
];

const PREDICTION: &[&str] = &["Predicted Corrosion Rate"];

// ── Public API ──

pub fn print_prediction_card(batch: &RecordBatch) {
    print!("{}", render_prediction_card(batch));
}

pub fn print_feature_card(batch: &RecordBatch) {
    print!("{}", render_feature_card(batch));
}

pub fn render_prediction_card(batch: &RecordBatch) -> String {
    let mut out = String::new();
    let alloy = cell(batch, "Alloy UNS").unwrap_or_default();
    let env = cell(batch, "Environment").unwrap_or_default();
    let _ = writeln!(out, "=== {alloy} in {env} ===\n");
    render_section(&mut out, batch, "Inputs", INPUTS);
    render_section(&mut out, batch, "Prediction", PREDICTION);
    out
}

pub fn render_feature_card(batch: &RecordBatch) -> String {
    let mut out = String::from("=== Classifier input ===\n\n");
    render_section(&mut out, batch, "Base features", &BASE_FEATURES);

    let components: Vec<String> = batch
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .filter(|name| name.starts_with("PCA_"))
        .collect();
    let components: Vec<&str> = components.iter().map(String::as_str).collect();
    render_section(&mut out, batch, "Text components", &components);
    out
}

// ── Section rendering ──

fn render_section(out: &mut String, batch: &RecordBatch, header: &str, cols: &[&str]) {
    let values: Vec<(&str, String)> = cols
        .iter()
        .filter_map(|&col| cell(batch, col).map(|v| (col, v)))
        .collect();
    if values.is_empty() {
        return;
    }

    let _ = writeln!(out, "{header}");
    for (name, value) in values {
        let _ = writeln!(out, "  {name:<26} {value}");
    }
    out.push('\n');
}

/// Formatted value of row 0 in `col_name`, or `None` when absent or null.
fn cell(batch: &RecordBatch, col_name: &str) -> Option<String> {
    let idx = batch.schema().index_of(col_name).ok()?;
    let col = batch.column(idx);
    if col.is_empty() || col.is_null(0) {
        return None;
    }

    match col.data_type() {
        DataType::Utf8 => col
            .as_any()
            .downcast_ref::<StringArray>()
            .map(|a| a.value(0).to_string()),
        DataType::Float64 => col
            .as_any()
            .downcast_ref::<Float64Array>()
            .map(|a| format!("{}", a.value(0))),
        DataType::Float32 => col
            .as_any()
            .downcast_ref::<Float32Array>()
            .map(|a| format!("{:.4}", a.value(0))),
        _ => ArrayFormatter::try_new(col.as_ref(), &FormatOptions::default())
            .ok()
            .map(|fmt| fmt.value(0).to_string()),
    }
}
