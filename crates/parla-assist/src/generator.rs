//! The injected text-generation collaborator.
//!
//! The router only knows the [`TextGenerator`] trait; production wires in
//! [`HttpGenerator`], tests substitute local impls.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::GenerateError;

/// A successful generation result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Generated {
    pub text: String,
    pub tokens_used: u32,
}

/// External text-generation service.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a reply for `prompt` given the catalog/identity `context`.
    async fn generate(&self, prompt: &str, context: &str) -> Result<Generated, GenerateError>;
}

#[async_trait]
impl<T: TextGenerator + ?Sized> TextGenerator for std::sync::Arc<T> {
    async fn generate(&self, prompt: &str, context: &str) -> Result<Generated, GenerateError> {
        (**self).generate(prompt, context).await
    }
}

// =============================================================================
// HTTP implementation
// =============================================================================

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    context: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    text: String,
    #[serde(default)]
    tokens_used: u32,
}

/// reqwest-backed client for the generation service.
pub struct HttpGenerator {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

impl HttpGenerator {
    /// Build a client against `endpoint` with the given per-request timeout.
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        timeout: std::time::Duration,
    ) -> Result<Self, GenerateError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GenerateError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
        })
    }
}

#[async_trait]
impl TextGenerator for HttpGenerator {
    async fn generate(&self, prompt: &str, context: &str) -> Result<Generated, GenerateError> {
        let url = format!("{}/api/generate", self.endpoint);
        let response = self
            .client
            .post(&url)
            .json(&GenerateRequest {
                model: &self.model,
                prompt,
                context,
            })
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(GenerateError::Quota);
        }
        if !status.is_success() {
            return Err(GenerateError::Transport(format!(
                "generation service returned {}",
                status
            )));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| GenerateError::MalformedResponse(e.to_string()))?;

        if body.text.trim().is_empty() {
            return Err(GenerateError::MalformedResponse(
                "empty text field".to_string(),
            ));
        }

        Ok(Generated {
            text: body.text,
            tokens_used: body.tokens_used,
        })
    }
}
