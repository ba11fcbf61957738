//! Primary/fallback dispatch across the two providers.
//!
//! [`LlmGateway::invoke`] makes at most two attempts: the requested (or
//! default) provider, then its complement. There are no retries and no
//! backoff. Each attempt is bounded by the configured timeout. Provider
//! failures are logged and collected, never returned as errors; callers that
//! only want text use [`LlmGateway::invoke_llm`], which maps exhaustion to
//! [`ALL_PROVIDERS_FAILED`].

use std::sync::LazyLock;
use std::time::Duration;

use corrosion_core::{LlmConfig, ProviderKind};
use regex::Regex;
use tracing::{info, warn};

use crate::error::LlmError;
use crate::provider::{OpenAiCompatProvider, Provider};

/// Text returned by [`LlmGateway::invoke_llm`] when both providers fail.
pub const ALL_PROVIDERS_FAILED: &str = "⚠️ All LLM providers failed. Check API keys or quota.";

static THINK_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<think>.*?</think>").expect("valid think-tag regex"));

/// Remove `<think>…</think>` reasoning spans and trim the result.
pub fn strip_think_tags(text: &str) -> String {
    THINK_SPAN.replace_all(text, "").trim().to_string()
}

/// One failed attempt.
#[derive(Debug)]
pub struct AttemptFailure {
    pub provider: ProviderKind,
    pub error: LlmError,
}

/// Result of [`LlmGateway::invoke`].
#[derive(Debug)]
pub enum LlmOutcome {
    Completed {
        provider: ProviderKind,
        text: String,
        /// Attempts that failed before the successful one (at most one).
        failures: Vec<AttemptFailure>,
    },
    Exhausted {
        failures: Vec<AttemptFailure>,
    },
}

impl LlmOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    pub fn failures(&self) -> &[AttemptFailure] {
        match self {
            Self::Completed { failures, .. } | Self::Exhausted { failures } => failures,
        }
    }

    /// The completion text, or the fixed failure notice.
    pub fn text(&self) -> &str {
        match self {
            Self::Completed { text, .. } => text,
            Self::Exhausted { .. } => ALL_PROVIDERS_FAILED,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Self::Completed { text, .. } => text,
            Self::Exhausted { .. } => ALL_PROVIDERS_FAILED.to_string(),
        }
    }
}

pub struct LlmGateway {
    providers: Vec<Box<dyn Provider>>,
    default_provider: ProviderKind,
    timeout: Duration,
}

impl LlmGateway {
    pub fn new(
        providers: Vec<Box<dyn Provider>>,
        default_provider: ProviderKind,
        timeout: Duration,
    ) -> Self {
        Self {
            providers,
            default_provider,
            timeout,
        }
    }

    /// Gateway over the Groq and OpenRouter HTTP providers.
    pub fn from_config(config: &LlmConfig) -> Self {
        let providers: Vec<Box<dyn Provider>> = [ProviderKind::Groq, ProviderKind::OpenRouter]
            .into_iter()
            .map(|kind| {
                Box::new(OpenAiCompatProvider::new(
                    kind,
                    config.provider(kind),
                    config.temperature,
                    config.max_tokens,
                )) as Box<dyn Provider>
            })
            .collect();
        Self::new(
            providers,
            config.default_provider,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn default_provider(&self) -> ProviderKind {
        self.default_provider
    }

    /// `[primary, fallback]` for an optional override.
    pub fn attempt_order(&self, provider_override: Option<ProviderKind>) -> [ProviderKind; 2] {
        let primary = provider_override.unwrap_or(self.default_provider);
        [primary, primary.complement()]
    }

    /// Run the prompt against the primary provider, falling back once.
    pub async fn invoke(&self, prompt: &str, provider_override: Option<ProviderKind>) -> LlmOutcome {
        let mut failures = Vec::new();

        for kind in self.attempt_order(provider_override) {
            match self.attempt(kind, prompt).await {
                Ok(raw) => {
                    info!(provider = %kind, failed_attempts = failures.len(), "LLM completion succeeded");
                    return LlmOutcome::Completed {
                        provider: kind,
                        text: strip_think_tags(&raw),
                        failures,
                    };
                }
                Err(error) => {
                    warn!(provider = %kind, error = %error, "LLM provider failed");
                    failures.push(AttemptFailure {
                        provider: kind,
                        error,
                    });
                }
            }
        }

        LlmOutcome::Exhausted { failures }
    }

    /// Completion text, or [`ALL_PROVIDERS_FAILED`] when both providers fail.
    pub async fn invoke_llm(&self, prompt: &str, provider_override: Option<ProviderKind>) -> String {
        self.invoke(prompt, provider_override).await.into_text()
    }

    async fn attempt(&self, kind: ProviderKind, prompt: &str) -> Result<String, LlmError> {
        let provider = self
            .providers
            .iter()
            .find(|p| p.kind() == kind)
            .ok_or(LlmError::NotConfigured(kind.as_str()))?;

        tokio::time::timeout(self.timeout, provider.complete(prompt))
            .await
            .map_err(|_| LlmError::Timeout(self.timeout))?
    }
}
