//! Inference layer: pre-trained artifacts, cached text embeddings, and
//! corrosion-rate classification.

pub mod artifacts;
pub mod embedding;
mod error;
pub mod features;
pub mod forest;
mod predictor;
pub mod transforms;

#[cfg(feature = "onnx")]
mod embedder;
#[cfg(feature = "onnx")]
pub mod onnx;

#[cfg(test)]
mod testing;

pub use artifacts::{ArtifactBundle, ArtifactStore};
pub use embedding::{CacheStats, EmbeddingBackend, EmbeddingProvider};
pub use error::PredictError;
pub use predictor::CorrosionPredictor;

#[cfg(feature = "onnx")]
pub use embedder::Embedder;
