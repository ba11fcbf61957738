//! JSON adapters for the fitted preprocessing artifacts.
//!
//! The encoders, scaler, and PCA are exported from the training environment
//! as plain parameter files; each adapter applies the same arithmetic the
//! fitted transform performs at inference time.

use std::collections::HashMap;

use corrosion_core::REDUCED_DIMS;
use serde::Deserialize;

use crate::artifacts::{CategoryEncoder, NumericScaler, Reducer};
use crate::error::PredictError;

/// Category encoder parameters, tagged by `kind`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CategoryEncoderArtifact {
    /// Code is the category's index in `classes`.
    Label { classes: Vec<String> },
    /// Code is the fitted per-category target statistic.
    Target { mapping: HashMap<String, f64> },
}

impl CategoryEncoderArtifact {
    /// Number of known categories.
    pub fn len(&self) -> usize {
        match self {
            Self::Label { classes } => classes.len(),
            Self::Target { mapping } => mapping.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CategoryEncoder for CategoryEncoderArtifact {
    fn encode(&self, value: &str) -> Option<f32> {
        match self {
            Self::Label { classes } => classes
                .iter()
                .position(|c| c == value)
                .map(|i| i as f32),
            Self::Target { mapping } => mapping.get(value).map(|&v| v as f32),
        }
    }
}

/// Single-feature scaler parameters, tagged by `kind`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScalerArtifact {
    /// `(x - mean) / scale`
    Standard { mean: Vec<f64>, scale: Vec<f64> },
    /// `x * scale + min`
    MinMax { min: Vec<f64>, scale: Vec<f64> },
}

impl ScalerArtifact {
    pub fn validate(&self) -> Result<(), String> {
        let (offset, scale) = match self {
            Self::Standard { mean, scale } => (mean, scale),
            Self::MinMax { min, scale } => (min, scale),
        };
        if offset.len() != 1 || scale.len() != 1 {
            return Err(format!(
                "expected a single-feature scaler, got {} offsets and {} scales",
                offset.len(),
                scale.len()
            ));
        }
        if matches!(self, Self::Standard { .. }) && scale[0] == 0.0 {
            return Err("standard scaler has zero scale".into());
        }
        Ok(())
    }
}

impl NumericScaler for ScalerArtifact {
    fn scale(&self, value: f64) -> f32 {
        let scaled = match self {
            Self::Standard { mean, scale } => (value - mean[0]) / scale[0],
            Self::MinMax { min, scale } => value * scale[0] + min[0],
        };
        scaled as f32
    }
}

/// Principal-component projection parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct PcaArtifact {
    mean: Vec<f64>,
    /// One row per component, each `mean.len()` wide.
    components: Vec<Vec<f64>>,
    #[serde(default)]
    whiten: bool,
    #[serde(default)]
    explained_variance: Vec<f64>,
}

impl PcaArtifact {
    pub fn validate(&self) -> Result<(), String> {
        if self.components.len() != REDUCED_DIMS {
            return Err(format!(
                "expected {REDUCED_DIMS} components, got {}",
                self.components.len()
            ));
        }
        let dim = self.mean.len();
        if dim == 0 {
            return Err("empty mean vector".into());
        }
        if let Some((i, row)) = self
            .components
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != dim)
        {
            return Err(format!("component {i} has width {}, expected {dim}", row.len()));
        }
        if self.whiten {
            if self.explained_variance.len() != REDUCED_DIMS {
                return Err(format!(
                    "whitening needs {REDUCED_DIMS} explained variances, got {}",
                    self.explained_variance.len()
                ));
            }
            if self.explained_variance.iter().any(|&v| v <= 0.0) {
                return Err("explained variance must be positive".into());
            }
        }
        Ok(())
    }
}

impl Reducer for PcaArtifact {
    fn input_dim(&self) -> usize {
        self.mean.len()
    }

    fn reduce(&self, embedding: &[f32]) -> Result<[f32; REDUCED_DIMS], PredictError> {
        if embedding.len() != self.mean.len() {
            return Err(PredictError::ShapeMismatch {
                artifact: "pca",
                expected: self.mean.len(),
                actual: embedding.len(),
            });
        }

        let mut out = [0.0f32; REDUCED_DIMS];
        for (k, (slot, component)) in out.iter_mut().zip(&self.components).enumerate() {
            let mut acc = 0.0f64;
            for ((&x, &m), &c) in embedding.iter().zip(&self.mean).zip(component) {
                acc += (f64::from(x) - m) * c;
            }
            if self.whiten {
                acc /= self.explained_variance[k].sqrt();
            }
            *slot = acc as f32;
        }
        Ok(out)
    }
}
