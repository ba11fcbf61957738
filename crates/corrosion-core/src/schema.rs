//! Classifier feature layout and Arrow schemas for feature and prediction rows.

use std::sync::Arc;

use arrow::array::{ArrayRef, Float32Array, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;

use crate::observation::PredictionResult;

/// Leading scalar columns, in training order.
pub const BASE_FEATURES: [&str; 4] = [
    "Environment",
    "UNS",
    "Temperature (deg C)",
    "Concentration_clean",
];

/// Number of principal components kept from the text embedding.
pub const REDUCED_DIMS: usize = 15;

/// Total classifier input width.
pub const FEATURE_WIDTH: usize = BASE_FEATURES.len() + REDUCED_DIMS;

/// Column names in the exact order the classifier was trained on.
pub fn feature_names() -> Vec<String> {
    BASE_FEATURES
        .iter()
        .map(|s| s.to_string())
        .chain((1..=REDUCED_DIMS).map(|i| format!("PCA_{i}")))
        .collect()
}

/// One classifier input row.
///
/// The width is fixed by the type; the column order is not checkable by the
/// classifier, so [`FeatureVector::from_parts`] is the only constructor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    values: [f32; FEATURE_WIDTH],
}

impl FeatureVector {
    pub fn from_parts(
        environment: f32,
        alloy: f32,
        temperature: f32,
        concentration: f32,
        reduced: [f32; REDUCED_DIMS],
    ) -> Self {
        let mut values = [0.0f32; FEATURE_WIDTH];
        values[0] = environment;
        values[1] = alloy;
        values[2] = temperature;
        values[3] = concentration;
        values[BASE_FEATURES.len()..].copy_from_slice(&reduced);
        Self { values }
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    pub fn len(&self) -> usize {
        FEATURE_WIDTH
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// `(name, value)` pairs in column order.
    pub fn named(&self) -> impl Iterator<Item = (String, f32)> + '_ {
        feature_names().into_iter().zip(self.values.iter().copied())
    }

    /// Single-row batch with one Float32 column per feature.
    pub fn to_record_batch(&self) -> Result<RecordBatch, ArrowError> {
        let columns: Vec<ArrayRef> = self
            .values
            .iter()
            .map(|&v| Arc::new(Float32Array::from(vec![v])) as ArrayRef)
            .collect();
        RecordBatch::try_new(Arc::new(feature_schema()), columns)
    }
}

/// Schema for an assembled feature row.
pub fn feature_schema() -> Schema {
    Schema::new(
        feature_names()
            .into_iter()
            .map(|name| Field::new(name, DataType::Float32, false))
            .collect::<Vec<_>>(),
    )
}

/// Schema for a prediction row as shown to engineers and templated into prompts.
pub fn prediction_schema() -> Schema {
    Schema::new(vec![
        Field::new("Environment", DataType::Utf8, false),
        Field::new("Temperature (°C)", DataType::Float64, false),
        Field::new("Concentration (%)", DataType::Float64, false),
        Field::new("Alloy UNS", DataType::Utf8, false),
        Field::new("Condition Description", DataType::Utf8, false),
        Field::new("Predicted Corrosion Rate", DataType::Utf8, false),
    ])
}

impl PredictionResult {
    pub fn to_record_batch(&self) -> Result<RecordBatch, ArrowError> {
        let obs = &self.raw_input;
        RecordBatch::try_new(
            Arc::new(prediction_schema()),
            vec![
                Arc::new(StringArray::from(vec![obs.environment()])),
                Arc::new(Float64Array::from(vec![obs.temperature()])),
                Arc::new(Float64Array::from(vec![obs.concentration()])),
                Arc::new(StringArray::from(vec![obs.alloy_code()])),
                Arc::new(StringArray::from(vec![obs.condition_text()])),
                Arc::new(StringArray::from(vec![self.label.as_str()])),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observation::RawObservation;
    use crate::severity::SeverityClass;

    #[test]
    fn feature_names_in_training_order() {
        let names = feature_names();
        assert_eq!(names.len(), 19);
        assert_eq!(names[0], "Environment");
        assert_eq!(names[1], "UNS");
        assert_eq!(names[2], "Temperature (deg C)");
        assert_eq!(names[3], "Concentration_clean");
        assert_eq!(names[4], "PCA_1");
        assert_eq!(names[18], "PCA_15");
    }

    #[test]
    fn from_parts_places_columns() {
        let mut reduced = [0.0f32; REDUCED_DIMS];
        for (i, r) in reduced.iter_mut().enumerate() {
            *r = 10.0 + i as f32;
        }
        let fv = FeatureVector::from_parts(1.0, 2.0, 3.0, 4.0, reduced);
        let v = fv.as_slice();
        assert_eq!(v.len(), FEATURE_WIDTH);
        assert_eq!(&v[..4], &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(v[4], 10.0);
        assert_eq!(v[18], 24.0);
    }

    #[test]
    fn feature_batch_has_one_row_per_vector() {
        let fv = FeatureVector::from_parts(0.5, 7.0, -0.2, 50.0, [0.0; REDUCED_DIMS]);
        let batch = fv.to_record_batch().unwrap();
        assert_eq!(batch.num_rows(), 1);
        assert_eq!(batch.num_columns(), 19);
        assert!(batch.schema().field_with_name("PCA_15").is_ok());
    }

    #[test]
    fn prediction_batch_has_expected_fields() {
        let result = PredictionResult {
            label: SeverityClass::Poor,
            raw_input: RawObservation::new("sulfuric acid", 80.0, 40.0, "G10200", "stagnant")
                .unwrap(),
        };
        let batch = result.to_record_batch().unwrap();
        assert_eq!(batch.num_columns(), 6);
        assert!(
            batch
                .schema()
                .field_with_name("Predicted Corrosion Rate")
                .is_ok()
        );
    }
}
