use crate::core::content::ContentPrompt;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_OPENAI_ENDPOINT: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// Errors that can occur when generating text
#[derive(Debug, Error)]
pub enum TextGenerationError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("invalid response format: {0}")]
    InvalidResponse(String),

    #[error("missing API key for {0}")]
    MissingApiKey(&'static str),

    #[error("text generation is disabled")]
    Disabled,
}

/// Language-generation collaborator
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Produce a pitch for `prompt`, in its locale and within its word budget
    async fn complete(&self, prompt: &ContentPrompt) -> Result<String, TextGenerationError>;

    /// Provider name recorded on generated content
    fn provider_name(&self) -> &'static str;
}

pub type DynTextGenerator = Arc<dyn TextGenerator>;

/// Chat Completions client
pub struct OpenAiTextGenerator {
    http: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl OpenAiTextGenerator {
    pub fn new(
        endpoint: String,
        api_key: String,
        model: String,
        timeout: Duration,
    ) -> Result<Self, TextGenerationError> {
        if api_key.trim().is_empty() {
            return Err(TextGenerationError::MissingApiKey("openai"));
        }

        let http = Client::builder()
            .user_agent(concat!("ila-match/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            endpoint,
            api_key,
            model,
        })
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[async_trait]
impl TextGenerator for OpenAiTextGenerator {
    async fn complete(&self, prompt: &ContentPrompt) -> Result<String, TextGenerationError> {
        let system = prompt.system_instruction();
        let user = prompt.render();

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &system,
                },
                ChatMessage {
                    role: "user",
                    content: &user,
                },
            ],
            temperature: 0.7,
            // Roughly two tokens per word leaves room for accents and punctuation
            max_tokens: (prompt.word_budget as u32).saturating_mul(2).max(32),
        };

        let url = format!("{}/chat/completions", self.endpoint.trim_end_matches('/'));

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Chat completion failed: {} - {}", status, body);
            return Err(TextGenerationError::ApiError(format!(
                "chat completion returned {}",
                status
            )));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| TextGenerationError::InvalidResponse(e.to_string()))?;

        body.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.trim().to_string())
            .ok_or_else(|| TextGenerationError::InvalidResponse("no choices".into()))
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}

/// Fills the locale's pitch template. Content it produces is recorded with
/// the `template` provider name.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateTextGenerator;

#[async_trait]
impl TextGenerator for TemplateTextGenerator {
    async fn complete(&self, prompt: &ContentPrompt) -> Result<String, TextGenerationError> {
        Ok(prompt.fill(prompt.templates().pitch))
    }

    fn provider_name(&self) -> &'static str {
        "template"
    }
}

/// Always fails; used when no text provider is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledTextGenerator;

#[async_trait]
impl TextGenerator for DisabledTextGenerator {
    async fn complete(&self, _prompt: &ContentPrompt) -> Result<String, TextGenerationError> {
        Err(TextGenerationError::Disabled)
    }

    fn provider_name(&self) -> &'static str {
        "disabled"
    }
}
