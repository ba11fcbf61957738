//! ONNX Runtime classifier for converted scikit-learn models.
//!
//! Expects the converter's usual signature: one `[batch, 19]` float input and
//! an int64 label tensor as the first output (probabilities, if present, are
//! ignored).

use std::path::Path;
use std::sync::Mutex;

use corrosion_core::{FEATURE_WIDTH, FeatureVector};
use ort::session::Session;
use ort::value::Tensor;
use tracing::info;

use crate::artifacts::Classifier;
use crate::error::PredictError;

pub struct OnnxClassifier {
    session: Mutex<Session>,
    input_name: String,
}

impl OnnxClassifier {
    pub fn load(path: &Path) -> Result<Self, PredictError> {
        let session = Session::builder()
            .map_err(load_err)?
            .commit_from_file(path)
            .map_err(load_err)?;

        let input_name = session
            .inputs()
            .first()
            .map(|input| input.name().to_string())
            .ok_or_else(|| PredictError::ModelLoad {
                artifact: "model",
                reason: "classifier graph has no inputs".into(),
            })?;

        info!(model = %path.display(), input = %input_name, "loaded ONNX classifier");
        Ok(Self {
            session: Mutex::new(session),
            input_name,
        })
    }
}

impl Classifier for OnnxClassifier {
    fn classify(&self, features: &FeatureVector) -> Result<i64, PredictError> {
        let shape = [1i64, FEATURE_WIDTH as i64];
        let input = Tensor::from_array((shape, features.as_slice().to_vec().into_boxed_slice()))
            .map_err(|e| PredictError::Inference(e.to_string()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| PredictError::Inference("classifier session lock poisoned".into()))?;
        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input])
            .map_err(|e| PredictError::Inference(e.to_string()))?;

        let (_, labels) = outputs[0]
            .try_extract_tensor::<i64>()
            .map_err(|e| PredictError::Inference(format!("label output: {e}")))?;
        labels
            .first()
            .copied()
            .ok_or_else(|| PredictError::Inference("classifier returned no label".into()))
    }
}

fn load_err(e: impl std::fmt::Display) -> PredictError {
    PredictError::ModelLoad {
        artifact: "model",
        reason: e.to_string(),
    }
}
