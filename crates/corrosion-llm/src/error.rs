use std::time::Duration;

use thiserror::Error;

/// Failure of a single provider attempt.
///
/// These never reach the caller of [`LlmGateway::invoke`](crate::LlmGateway::invoke);
/// they are logged and recorded in the outcome's failure list.
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("provider {0} is not configured (no API keys or no models)")]
    NotConfigured(&'static str),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

pub type Result<T> = std::result::Result<T, LlmError>;
