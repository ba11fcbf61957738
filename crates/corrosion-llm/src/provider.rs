//! OpenAI-compatible chat-completion providers.

use async_trait::async_trait;
use corrosion_core::{ProviderKind, ProviderSettings};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{LlmError, Result};
use crate::rotation::Rotation;

/// A backend that turns one prompt into one completion.
#[async_trait]
pub trait Provider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Send `prompt` as a single user message and return the raw reply text.
    async fn complete(&self, prompt: &str) -> Result<String>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Provider speaking `POST {base_url}/chat/completions` with bearer auth.
///
/// Keys and models rotate independently; each call takes the next of both.
pub struct OpenAiCompatProvider {
    kind: ProviderKind,
    client: reqwest::Client,
    base_url: String,
    keys: Rotation<String>,
    models: Rotation<String>,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiCompatProvider {
    pub fn new(
        kind: ProviderKind,
        settings: &ProviderSettings,
        temperature: f32,
        max_tokens: u32,
    ) -> Self {
        Self {
            kind,
            client: reqwest::Client::new(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            keys: Rotation::new(settings.api_keys.clone()),
            models: Rotation::new(settings.models.clone()),
            temperature,
            max_tokens,
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.keys.is_empty() && !self.models.is_empty()
    }

    pub fn keys(&self) -> &Rotation<String> {
        &self.keys
    }

    pub fn models(&self) -> &Rotation<String> {
        &self.models
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

impl std::fmt::Debug for OpenAiCompatProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCompatProvider")
            .field("kind", &self.kind)
            .field("base_url", &self.base_url)
            .field("keys", &self.keys.len())
            .field("models", &self.models)
            .finish()
    }
}

#[async_trait]
impl Provider for OpenAiCompatProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        if !self.is_configured() {
            return Err(LlmError::NotConfigured(self.kind.as_str()));
        }
        // Both cursors move before the first await.
        let (Some(key), Some(model)) = (self.keys.next(), self.models.next()) else {
            return Err(LlmError::NotConfigured(self.kind.as_str()));
        };

        let url = self.completions_url();
        debug!(provider = %self.kind, model = %model, url = %url, "sending chat completion");

        let body = ChatRequest {
            model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };
        let resp = self
            .client
            .post(&url)
            .bearer_auth(key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("failed to parse response: {e}")))?;
        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LlmError::InvalidResponse("no message content in choices".into()))?;

        debug!(provider = %self.kind, model = %model, chars = text.len(), "chat completion received");
        Ok(text)
    }
}
