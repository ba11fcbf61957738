//! Request-scoped input and output records.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::severity::SeverityClass;

#[derive(Debug, Error, PartialEq)]
pub enum ObservationError {
    #[error("temperature must be a finite number, got {0}")]
    Temperature(f64),
    #[error("concentration must be within [0, 100], got {0}")]
    Concentration(f64),
}

/// One material/environment combination submitted for prediction.
///
/// Immutable once built; [`RawObservation::new`] validates the numeric fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawObservation {
    environment: String,
    temperature: f64,
    concentration: f64,
    alloy_code: String,
    condition_text: String,
}

impl RawObservation {
    /// Build an observation. Temperature is in °C, concentration in percent.
    pub fn new(
        environment: impl Into<String>,
        temperature: f64,
        concentration: f64,
        alloy_code: impl Into<String>,
        condition_text: impl Into<String>,
    ) -> Result<Self, ObservationError> {
        if !temperature.is_finite() {
            return Err(ObservationError::Temperature(temperature));
        }
        if !(0.0..=100.0).contains(&concentration) {
            return Err(ObservationError::Concentration(concentration));
        }
        Ok(Self {
            environment: environment.into(),
            temperature,
            concentration,
            alloy_code: alloy_code.into(),
            condition_text: condition_text.into(),
        })
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn concentration(&self) -> f64 {
        self.concentration
    }

    /// UNS alloy designation, e.g. `S31600`.
    pub fn alloy_code(&self) -> &str {
        &self.alloy_code
    }

    pub fn condition_text(&self) -> &str {
        &self.condition_text
    }
}

/// A predicted severity class alongside the observation that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub label: SeverityClass,
    pub raw_input: RawObservation,
}

/// Operating conditions for the material-selection flow.
///
/// Free-form strings mirror what an engineer types into the form; the
/// fields are only ever templated into a prompt.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MaterialQuery {
    pub environment: String,
    pub ph: f64,
    pub chloride: String,
    /// °C
    pub temperature: f64,
    /// bar
    pub pressure: f64,
    pub flow: String,
    pub galvanic_contact: String,
    pub design_life_years: u32,
    pub maintenance: String,
    pub budget: String,
    pub notes: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_observation_keeps_fields() {
        let obs = RawObservation::new(
            "seawater",
            25.0,
            50.0,
            "S31600",
            "High chloride, intermittent wetting",
        )
        .unwrap();
        assert_eq!(obs.environment(), "seawater");
        assert_eq!(obs.temperature(), 25.0);
        assert_eq!(obs.concentration(), 50.0);
        assert_eq!(obs.alloy_code(), "S31600");
        assert_eq!(obs.condition_text(), "High chloride, intermittent wetting");
    }

    #[test]
    fn concentration_bounds_are_inclusive() {
        assert!(RawObservation::new("air", 20.0, 0.0, "G10200", "").is_ok());
        assert!(RawObservation::new("air", 20.0, 100.0, "G10200", "").is_ok());
    }

    #[test]
    fn concentration_out_of_range_rejected() {
        let err = RawObservation::new("air", 20.0, 100.5, "G10200", "").unwrap_err();
        assert_eq!(err, ObservationError::Concentration(100.5));
        assert!(RawObservation::new("air", 20.0, -1.0, "G10200", "").is_err());
        assert!(RawObservation::new("air", 20.0, f64::NAN, "G10200", "").is_err());
    }

    #[test]
    fn non_finite_temperature_rejected() {
        let err = RawObservation::new("air", f64::INFINITY, 1.0, "G10200", "").unwrap_err();
        assert!(matches!(err, ObservationError::Temperature(_)));
    }

    #[test]
    fn prediction_result_json_roundtrip() {
        let result = PredictionResult {
            label: SeverityClass::Good,
            raw_input: RawObservation::new("seawater", 25.0, 3.5, "S31600", "splash zone")
                .unwrap(),
        };
        let json = serde_json::to_string(&result).unwrap();
        let parsed: PredictionResult = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, result);
    }
}
