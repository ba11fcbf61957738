//! Pre-trained artifact store.
//!
//! Five artifacts feed the classifier: two category encoders, a temperature
//! scaler, a PCA reducer for the text embedding, and the classifier itself.
//! Each is addressed by a stable role name (`env_encoder`, `uns_encoder`,
//! `temp_scaler`, `pca`, `model`) and sits behind a small trait so the
//! feature assembler never depends on a concrete file format.
//!
//! [`ArtifactStore`] loads the whole bundle once, on first use, and hands out
//! the same instances for the rest of the process. Any single failure aborts
//! the load; there is no partially-ready state.

use std::path::Path;

use corrosion_core::{ArtifactPaths, FeatureVector, REDUCED_DIMS};
use once_cell::sync::OnceCell;
use serde::de::DeserializeOwned;
use tracing::info;

use crate::error::PredictError;
use crate::forest::ForestClassifier;
use crate::transforms::{CategoryEncoderArtifact, PcaArtifact, ScalerArtifact};

/// Fitted mapping from training-time categories to numeric codes.
pub trait CategoryEncoder: Send + Sync {
    /// `None` when `value` was not seen during training.
    fn encode(&self, value: &str) -> Option<f32>;
}

/// Fitted single-feature numeric transform.
pub trait NumericScaler: Send + Sync {
    fn scale(&self, value: f64) -> f32;
}

/// Fitted linear projection of an embedding onto [`REDUCED_DIMS`] components.
pub trait Reducer: Send + Sync {
    /// Expected embedding width.
    fn input_dim(&self) -> usize;
    fn reduce(&self, embedding: &[f32]) -> Result<[f32; REDUCED_DIMS], PredictError>;
}

/// Pre-trained classifier returning the raw class index.
pub trait Classifier: Send + Sync {
    fn classify(&self, features: &FeatureVector) -> Result<i64, PredictError>;
}

/// The five loaded artifacts, keyed by role.
pub struct ArtifactBundle {
    env_encoder: Box<dyn CategoryEncoder>,
    uns_encoder: Box<dyn CategoryEncoder>,
    temp_scaler: Box<dyn NumericScaler>,
    pca: Box<dyn Reducer>,
    model: Box<dyn Classifier>,
}

impl ArtifactBundle {
    pub fn new(
        env_encoder: Box<dyn CategoryEncoder>,
        uns_encoder: Box<dyn CategoryEncoder>,
        temp_scaler: Box<dyn NumericScaler>,
        pca: Box<dyn Reducer>,
        model: Box<dyn Classifier>,
    ) -> Self {
        Self {
            env_encoder,
            uns_encoder,
            temp_scaler,
            pca,
            model,
        }
    }

    /// Load every artifact from disk. Fails on the first missing or invalid one.
    pub fn load(paths: &ArtifactPaths) -> Result<Self, PredictError> {
        let env_encoder: CategoryEncoderArtifact = load_json("env_encoder", &paths.env_encoder)?;
        let uns_encoder: CategoryEncoderArtifact = load_json("uns_encoder", &paths.uns_encoder)?;

        let temp_scaler: ScalerArtifact = load_json("temp_scaler", &paths.temp_scaler)?;
        temp_scaler.validate().map_err(|reason| PredictError::ModelLoad {
            artifact: "temp_scaler",
            reason,
        })?;

        let pca: PcaArtifact = load_json("pca", &paths.pca)?;
        pca.validate().map_err(|reason| PredictError::ModelLoad {
            artifact: "pca",
            reason,
        })?;

        let model = load_classifier(&paths.model)?;

        info!(
            env_categories = env_encoder.len(),
            uns_categories = uns_encoder.len(),
            embedding_dim = pca.input_dim(),
            "loaded model artifacts"
        );

        Ok(Self::new(
            Box::new(env_encoder),
            Box::new(uns_encoder),
            Box::new(temp_scaler),
            Box::new(pca),
            model,
        ))
    }

    pub fn env_encoder(&self) -> &dyn CategoryEncoder {
        self.env_encoder.as_ref()
    }

    pub fn uns_encoder(&self) -> &dyn CategoryEncoder {
        self.uns_encoder.as_ref()
    }

    pub fn temp_scaler(&self) -> &dyn NumericScaler {
        self.temp_scaler.as_ref()
    }

    pub fn pca(&self) -> &dyn Reducer {
        self.pca.as_ref()
    }

    pub fn model(&self) -> &dyn Classifier {
        self.model.as_ref()
    }
}

/// Lazily-loaded, process-lifetime holder of the [`ArtifactBundle`].
///
/// Construct once at startup and share behind an `Arc`. Concurrent first
/// callers block on a single initializer. A failed load is not cached, so a
/// later call retries from disk.
pub struct ArtifactStore {
    paths: ArtifactPaths,
    bundle: OnceCell<ArtifactBundle>,
}

impl ArtifactStore {
    pub fn new(paths: ArtifactPaths) -> Self {
        Self {
            paths,
            bundle: OnceCell::new(),
        }
    }

    /// A store that is already ready, for hosts that build artifacts in memory.
    pub fn preloaded(bundle: ArtifactBundle) -> Self {
        Self {
            paths: ArtifactPaths::default(),
            bundle: OnceCell::with_value(bundle),
        }
    }

    pub fn paths(&self) -> &ArtifactPaths {
        &self.paths
    }

    pub fn is_ready(&self) -> bool {
        self.bundle.get().is_some()
    }

    /// The loaded bundle, loading it on first call.
    pub fn bundle(&self) -> Result<&ArtifactBundle, PredictError> {
        self.bundle
            .get_or_try_init(|| ArtifactBundle::load(&self.paths))
    }
}

fn require_file(artifact: &'static str, path: &Path) -> Result<(), PredictError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(PredictError::ModelNotFound {
            artifact,
            path: path.to_path_buf(),
        })
    }
}

fn load_json<T: DeserializeOwned>(artifact: &'static str, path: &Path) -> Result<T, PredictError> {
    require_file(artifact, path)?;
    let raw = std::fs::read_to_string(path).map_err(|e| PredictError::ModelLoad {
        artifact,
        reason: format!("read {}: {e}", path.display()),
    })?;
    let value = serde_json::from_str(&raw).map_err(|e| PredictError::ModelLoad {
        artifact,
        reason: format!("parse {}: {e}", path.display()),
    })?;
    info!(artifact, path = %path.display(), "loaded artifact");
    Ok(value)
}

/// Pick the classifier adapter from the file extension.
fn load_classifier(path: &Path) -> Result<Box<dyn Classifier>, PredictError> {
    require_file("model", path)?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => {
            let forest: ForestClassifier = load_json("model", path)?;
            forest.validate().map_err(|reason| PredictError::ModelLoad {
                artifact: "model",
                reason,
            })?;
            Ok(Box::new(forest))
        }
        #[cfg(feature = "onnx")]
        Some("onnx") => Ok(Box::new(crate::onnx::OnnxClassifier::load(path)?)),
        #[cfg(not(feature = "onnx"))]
        Some("onnx") => Err(PredictError::ModelLoad {
            artifact: "model",
            reason: "ONNX classifiers require the `onnx` feature".into(),
        }),
        other => Err(PredictError::ModelLoad {
            artifact: "model",
            reason: format!("unsupported classifier format: {other:?}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::write_artifacts;
    use std::sync::Arc;

    #[test]
    fn loads_all_five_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(write_artifacts(dir.path()));
        assert!(!store.is_ready());

        let bundle = store.bundle().unwrap();
        assert!(store.is_ready());
        assert_eq!(bundle.env_encoder().encode("seawater"), Some(1.0));
        assert_eq!(bundle.uns_encoder().encode("S31600"), Some(2.0));
        assert_eq!(bundle.pca().input_dim(), crate::testing::EMBED_DIM);
    }

    #[test]
    fn bundle_is_identity_stable() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(write_artifacts(dir.path()));
        let first = store.bundle().unwrap() as *const ArtifactBundle;
        let second = store.bundle().unwrap() as *const ArtifactBundle;
        assert!(std::ptr::eq(first, second));
    }

    #[test]
    fn concurrent_first_access_loads_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(ArtifactStore::new(write_artifacts(dir.path())));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || store.bundle().unwrap() as *const ArtifactBundle as usize)
            })
            .collect();
        let addrs: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(addrs.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn missing_file_names_artifact_and_path() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_artifacts(dir.path());
        std::fs::remove_file(&paths.temp_scaler).unwrap();

        let store = ArtifactStore::new(paths.clone());
        match store.bundle() {
            Err(PredictError::ModelNotFound { artifact, path }) => {
                assert_eq!(artifact, "temp_scaler");
                assert_eq!(path, paths.temp_scaler);
            }
            Err(other) => panic!("expected ModelNotFound, got {other}"),
            Ok(_) => panic!("expected ModelNotFound, got a bundle"),
        }
        assert!(!store.is_ready(), "no partial bundle after a failure");
    }

    #[test]
    fn corrupt_file_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_artifacts(dir.path());
        std::fs::write(&paths.uns_encoder, "{ not json").unwrap();

        let err = ArtifactBundle::load(&paths).err().unwrap();
        assert!(
            matches!(err, PredictError::ModelLoad { artifact: "uns_encoder", .. }),
            "got {err}"
        );
    }

    #[test]
    fn wrong_component_count_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_artifacts(dir.path());
        let pca = serde_json::json!({
            "mean": [0.0, 0.0],
            "components": [[1.0, 0.0], [0.0, 1.0]],
        });
        std::fs::write(&paths.pca, pca.to_string()).unwrap();

        let err = ArtifactBundle::load(&paths).err().unwrap();
        assert!(matches!(err, PredictError::ModelLoad { artifact: "pca", .. }), "got {err}");
    }

    #[test]
    fn unsupported_classifier_format() {
        let dir = tempfile::tempdir().unwrap();
        let mut paths = write_artifacts(dir.path());
        let pickle = dir.path().join("rf_all_data.pkl");
        std::fs::write(&pickle, b"\x80\x04").unwrap();
        paths.model = pickle;

        let err = ArtifactBundle::load(&paths).err().unwrap();
        assert!(matches!(err, PredictError::ModelLoad { artifact: "model", .. }));
    }

    #[cfg(not(feature = "onnx"))]
    #[test]
    fn onnx_classifier_needs_feature() {
        let dir = tempfile::tempdir().unwrap();
        let mut paths = write_artifacts(dir.path());
        let onnx = dir.path().join("rf_all_data.onnx");
        std::fs::write(&onnx, b"onnx").unwrap();
        paths.model = onnx;

        let err = ArtifactBundle::load(&paths).err().unwrap();
        assert!(err.to_string().contains("`onnx` feature"), "got {err}");
    }

    #[test]
    fn failed_load_is_retried() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_artifacts(dir.path());
        let saved = std::fs::read(&paths.model).unwrap();
        std::fs::remove_file(&paths.model).unwrap();

        let store = ArtifactStore::new(paths.clone());
        assert!(store.bundle().is_err());

        std::fs::write(&paths.model, saved).unwrap();
        assert!(store.bundle().is_ok());
    }
}
