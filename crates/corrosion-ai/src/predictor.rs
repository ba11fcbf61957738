//! End-to-end corrosion-rate prediction.

use std::sync::Arc;

use corrosion_core::{
    FeatureVector, PredictionResult, RawObservation, SeverityClass, normalize_condition,
};
use tracing::{debug, info};

use crate::artifacts::ArtifactStore;
use crate::embedding::EmbeddingProvider;
use crate::error::PredictError;
use crate::features::assemble;

/// Orchestrates normalisation, embedding, feature assembly, and inference.
///
/// Cheap to clone; clones share the same artifact store and embedding cache.
#[derive(Clone)]
pub struct CorrosionPredictor {
    artifacts: Arc<ArtifactStore>,
    embeddings: Arc<EmbeddingProvider>,
}

impl CorrosionPredictor {
    pub fn new(artifacts: Arc<ArtifactStore>, embeddings: Arc<EmbeddingProvider>) -> Self {
        Self {
            artifacts,
            embeddings,
        }
    }

    /// Predictor over on-disk artifacts and the ONNX embedding model.
    #[cfg(feature = "onnx")]
    pub fn from_config(config: &corrosion_core::AppConfig) -> Self {
        Self::new(
            Arc::new(ArtifactStore::new(config.artifacts.clone())),
            Arc::new(EmbeddingProvider::onnx(&config.embedding)),
        )
    }

    pub fn artifacts(&self) -> &ArtifactStore {
        &self.artifacts
    }

    pub fn embeddings(&self) -> &EmbeddingProvider {
        &self.embeddings
    }

    /// Load artifacts and the embedding model up front.
    pub fn warm_up(&self) -> Result<(), PredictError> {
        self.artifacts.bundle()?;
        self.embeddings.ensure_loaded()
    }

    /// Assemble the classifier row without running the classifier.
    pub fn features(&self, observation: &RawObservation) -> Result<FeatureVector, PredictError> {
        let bundle = self.artifacts.bundle()?;
        let text = normalize_condition(observation.condition_text());
        let embedding = self.embeddings.embed(&text)?;
        assemble(bundle, observation, &embedding)
    }

    pub fn predict_observation(
        &self,
        observation: RawObservation,
    ) -> Result<PredictionResult, PredictError> {
        let features = self.features(&observation)?;
        let raw = self.artifacts.bundle()?.model().classify(&features)?;
        let label = SeverityClass::from_class_index(raw);
        debug!(features = ?features.as_slice(), "classified feature row");
        info!(
            label = %label,
            raw,
            environment = observation.environment(),
            alloy = observation.alloy_code(),
            "prediction result"
        );
        Ok(PredictionResult {
            label,
            raw_input: observation,
        })
    }

    /// Predict the severity class for raw form fields.
    pub fn predict(
        &self,
        environment: &str,
        temperature: f64,
        concentration: f64,
        alloy_code: &str,
        condition_text: &str,
    ) -> Result<SeverityClass, PredictError> {
        let observation = RawObservation::new(
            environment,
            temperature,
            concentration,
            alloy_code,
            condition_text,
        )?;
        Ok(self.predict_observation(observation)?.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::{
        ArtifactBundle, CategoryEncoder, Classifier, NumericScaler, Reducer,
    };
    use crate::testing::{stub_provider, write_artifacts};
    use corrosion_core::REDUCED_DIMS;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn predictor(dir: &std::path::Path) -> (CorrosionPredictor, Arc<AtomicUsize>) {
        let (provider, calls, _) = stub_provider(64);
        let store = ArtifactStore::new(write_artifacts(dir));
        (
            CorrosionPredictor::new(Arc::new(store), Arc::new(provider)),
            calls,
        )
    }

    #[test]
    fn end_to_end_seawater_316() {
        let dir = tempfile::tempdir().unwrap();
        let (predictor, _) = predictor(dir.path());

        let label = predictor
            .predict(
                "seawater",
                25.0,
                50.0,
                "S31600",
                "High chloride, intermittent wetting",
            )
            .unwrap();
        assert_eq!(label, SeverityClass::Good);

        let again = predictor
            .predict(
                "seawater",
                25.0,
                50.0,
                "S31600",
                "High chloride, intermittent wetting",
            )
            .unwrap();
        assert_eq!(again, label, "prediction must be deterministic");
    }

    #[test]
    fn hot_acid_is_poor() {
        let dir = tempfile::tempdir().unwrap();
        let (predictor, _) = predictor(dir.path());
        let label = predictor
            .predict("sulfuric acid", 80.0, 40.0, "G10200", "stagnant, aerated")
            .unwrap();
        assert_eq!(label, SeverityClass::Poor);
    }

    #[test]
    fn equivalent_descriptions_share_one_embedding() {
        let dir = tempfile::tempdir().unwrap();
        let (predictor, calls) = predictor(dir.path());

        predictor
            .predict("seawater", 25.0, 50.0, "S31600", "High chloride, intermittent wetting")
            .unwrap();
        predictor
            .predict("seawater", 30.0, 10.0, "N06625", "HIGH chloride\nintermittent wetting!")
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn artifacts_are_loaded_once_across_predictions() {
        let dir = tempfile::tempdir().unwrap();
        let (predictor, _) = predictor(dir.path());

        predictor
            .predict("seawater", 25.0, 50.0, "S31600", "a")
            .unwrap();
        let first = predictor.artifacts().bundle().unwrap() as *const ArtifactBundle;
        predictor
            .predict("seawater", 25.0, 50.0, "S31600", "b")
            .unwrap();
        let second = predictor.artifacts().bundle().unwrap() as *const ArtifactBundle;
        assert!(std::ptr::eq(first, second));
    }

    #[test]
    fn unseen_alloy_is_an_error_not_a_default() {
        let dir = tempfile::tempdir().unwrap();
        let (predictor, _) = predictor(dir.path());
        let err = predictor
            .predict("seawater", 25.0, 50.0, "Z00000", "immersed")
            .unwrap_err();
        assert!(matches!(
            err,
            PredictError::UnknownCategory { field: "alloy", .. }
        ));
    }

    #[test]
    fn invalid_concentration_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (predictor, calls) = predictor(dir.path());
        let err = predictor
            .predict("seawater", 25.0, 150.0, "S31600", "immersed")
            .unwrap_err();
        assert!(matches!(err, PredictError::InvalidObservation(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn missing_artifact_surfaces_before_embedding() {
        let dir = tempfile::tempdir().unwrap();
        let (predictor, calls) = predictor(dir.path());
        std::fs::remove_file(&predictor.artifacts().paths().pca).unwrap();

        let err = predictor
            .predict("seawater", 25.0, 50.0, "S31600", "immersed")
            .unwrap_err();
        assert!(matches!(err, PredictError::ModelNotFound { artifact: "pca", .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    struct Fixed(f32);
    impl CategoryEncoder for Fixed {
        fn encode(&self, _value: &str) -> Option<f32> {
            Some(self.0)
        }
    }
    impl NumericScaler for Fixed {
        fn scale(&self, value: f64) -> f32 {
            value as f32
        }
    }
    struct Zeros;
    impl Reducer for Zeros {
        fn input_dim(&self) -> usize {
            crate::testing::EMBED_DIM
        }
        fn reduce(&self, _embedding: &[f32]) -> Result<[f32; REDUCED_DIMS], PredictError> {
            Ok([0.0; REDUCED_DIMS])
        }
    }
    struct Emits(i64);
    impl Classifier for Emits {
        fn classify(&self, _features: &FeatureVector) -> Result<i64, PredictError> {
            Ok(self.0)
        }
    }

    #[test]
    fn out_of_vocabulary_class_maps_to_unknown() {
        let bundle = ArtifactBundle::new(
            Box::new(Fixed(0.0)),
            Box::new(Fixed(0.0)),
            Box::new(Fixed(0.0)),
            Box::new(Zeros),
            Box::new(Emits(7)),
        );
        let (provider, _, _) = stub_provider(4);
        let predictor = CorrosionPredictor::new(
            Arc::new(ArtifactStore::preloaded(bundle)),
            Arc::new(provider),
        );
        let label = predictor
            .predict("anything", 20.0, 1.0, "anything", "text")
            .unwrap();
        assert_eq!(label, SeverityClass::Unknown);
    }

    #[test]
    fn concurrent_predictions_agree() {
        let dir = tempfile::tempdir().unwrap();
        let (predictor, _) = predictor(dir.path());

        let handles: Vec<_> = (0..6)
            .map(|_| {
                let predictor = predictor.clone();
                std::thread::spawn(move || {
                    predictor
                        .predict("seawater", 25.0, 50.0, "S31600", "tidal zone")
                        .unwrap()
                })
            })
            .collect();
        let labels: Vec<SeverityClass> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(labels.iter().all(|&l| l == labels[0]));
    }
}
