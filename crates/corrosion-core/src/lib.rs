pub mod config;
pub mod observation;
pub mod schema;
pub mod severity;
pub mod text;

pub use config::{
    AppConfig, ArtifactPaths, ConfigError, EmbeddingConfig, LlmConfig, ProviderKind,
    ProviderSettings,
};
pub use observation::{MaterialQuery, ObservationError, PredictionResult, RawObservation};
pub use schema::{FEATURE_WIDTH, FeatureVector, REDUCED_DIMS};
pub use severity::SeverityClass;
pub use text::normalize_condition;
