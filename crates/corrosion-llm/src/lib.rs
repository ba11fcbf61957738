//! Text generation: OpenAI-compatible providers with key/model rotation,
//! primary/fallback dispatch, and the corrosion prompt templates.

pub mod error;
pub mod gateway;
pub mod prompt;
pub mod provider;
pub mod rotation;

pub use error::LlmError;
pub use gateway::{ALL_PROVIDERS_FAILED, AttemptFailure, LlmGateway, LlmOutcome, strip_think_tags};
pub use prompt::{main_prompt, material_report, material_selection_prompt};
pub use provider::{OpenAiCompatProvider, Provider};
pub use rotation::Rotation;
