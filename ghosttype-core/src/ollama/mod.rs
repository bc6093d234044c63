//! Client for the local embedding/LLM service.
//!
//! The core consumes a deliberately narrow interface: `embed(text)` and
//! `generate(prompt)`. The HTTP implementation speaks the Ollama API;
//! anything that answers the same two endpoints works.

pub mod mock;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::ModelServiceConfig;
use crate::error::ClientError;

/// Per-request deadline. Kept at the ensemble's global suggestion budget
/// so a hung service can never stall a prediction cycle past it.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

/// The narrow model-service interface the core depends on.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Embed a text into a fixed-dimension vector.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ClientError>;

    /// Generate a completion for a prompt.
    async fn generate(&self, prompt: &str) -> Result<String, ClientError>;
}

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

/// HTTP client for a local Ollama instance.
pub struct OllamaClient {
    config: ModelServiceConfig,
    client: reqwest::Client,
}

impl OllamaClient {
    /// Create a client for the configured endpoint. The underlying
    /// `reqwest::Client` is shared and carries the per-request deadline.
    pub fn new(config: ModelServiceConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("default TLS backend available");
        Self { config, client }
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    async fn post_json<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, ClientError> {
        let url = format!("{}{}", self.config.base_url, path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| ClientError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Api { status, body });
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::Parse(e.to_string()))
    }
}

#[async_trait]
impl ModelClient for OllamaClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ClientError> {
        let request = EmbeddingsRequest {
            model: &self.config.embedding_model,
            prompt: text,
        };
        let response: EmbeddingsResponse = self.post_json("/api/embeddings", &request).await?;
        Ok(response.embedding)
    }

    async fn generate(&self, prompt: &str) -> Result<String, ClientError> {
        let request = GenerateRequest {
            model: &self.config.llm_model,
            prompt,
            stream: false,
        };
        let response: GenerateResponse = self.post_json("/api/generate", &request).await?;
        Ok(response.response)
    }
}
