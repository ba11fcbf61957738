use std::path::PathBuf;

use corrosion_core::ObservationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("artifact '{artifact}' not found at {path}")]
    ModelNotFound {
        artifact: &'static str,
        path: PathBuf,
    },

    #[error("failed to load artifact '{artifact}': {reason}")]
    ModelLoad {
        artifact: &'static str,
        reason: String,
    },

    #[error("unknown {field} '{value}': not seen during training")]
    UnknownCategory { field: &'static str, value: String },

    #[error("embedding backend error: {0}")]
    EmbeddingBackend(String),

    #[error("{artifact} expects {expected} inputs, got {actual}")]
    ShapeMismatch {
        artifact: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("invalid observation: {0}")]
    InvalidObservation(#[from] ObservationError),
}

impl PredictError {
    /// True for errors the caller can fix by changing the request.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownCategory { .. } | Self::InvalidObservation(_)
        )
    }
}
