use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;

use super::models::{GenerateContentRequest, GenerateContentResponse};

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// A hosted text-completion model. One call, one attempt.
#[async_trait]
pub trait AiGateway: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

pub struct GeminiGateway {
    client: Client,
    api_base: String,
    model: String,
    api_key: String,
}

impl GeminiGateway {
    pub fn new(client: Client, api_base: impl Into<String>, model: impl Into<String>, api_key: String) -> Self {
        Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.api_base, self.model)
    }
}

#[async_trait]
impl AiGateway for GeminiGateway {
    #[tracing::instrument(skip_all, fields(model = %self.model, prompt_len = prompt.len()))]
    async fn generate(&self, prompt: &str) -> Result<String> {
        let resp = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&GenerateContentRequest::from_prompt(prompt))
            .send()
            .await
            .context("failed to reach Gemini API")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Gemini API error {status}: {body}");
        }

        let parsed: GenerateContentResponse = resp
            .json()
            .await
            .context("failed to parse Gemini response")?;

        let Some(text) = parsed.text() else {
            let reason = parsed.finish_reason().unwrap_or("none");
            tracing::warn!(finish_reason = reason, "model returned no text");
            anyhow::bail!("Gemini response contained no text (finish reason: {reason})");
        };
        tracing::debug!(response_len = text.len(), "model responded");
        Ok(text)
    }
}

/// Stands in when no API key is configured; every call fails.
pub struct UnconfiguredGateway;

#[async_trait]
impl AiGateway for UnconfiguredGateway {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        anyhow::bail!("GEMINI_API_KEY is not set")
    }
}
