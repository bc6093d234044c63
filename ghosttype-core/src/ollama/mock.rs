//! Canned model client for tests and offline development.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::ClientError;
use crate::store::EMBEDDING_DIM;

use super::ModelClient;

/// A [`ModelClient`] that answers from canned data.
///
/// Counts calls so tests can assert on network pressure (e.g. the
/// embedding learn cap).
pub struct StaticClient {
    embedding: Vec<f32>,
    response: String,
    fail: bool,
    embed_calls: AtomicUsize,
    generate_calls: AtomicUsize,
}

impl StaticClient {
    /// A client that answers every request successfully.
    pub fn new(response: impl Into<String>) -> Self {
        let mut embedding = vec![0.0; EMBEDDING_DIM];
        embedding[0] = 1.0;
        Self {
            embedding,
            response: response.into(),
            fail: false,
            embed_calls: AtomicUsize::new(0),
            generate_calls: AtomicUsize::new(0),
        }
    }

    /// A client whose every request fails, for probe-failure paths.
    pub fn unavailable() -> Self {
        Self {
            fail: true,
            ..Self::new("")
        }
    }

    /// Override the canned embedding vector.
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = embedding;
        self
    }

    pub fn embed_calls(&self) -> usize {
        self.embed_calls.load(Ordering::SeqCst)
    }

    pub fn generate_calls(&self) -> usize {
        self.generate_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelClient for StaticClient {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, ClientError> {
        self.embed_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ClientError::Request("connection refused".into()));
        }
        Ok(self.embedding.clone())
    }

    async fn generate(&self, _prompt: &str) -> Result<String, ClientError> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ClientError::Request("connection refused".into()));
        }
        Ok(self.response.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_client_returns_canned_data() {
        let client = StaticClient::new("git status\n");
        assert_eq!(client.generate("p").await.unwrap(), "git status\n");
        assert_eq!(client.embed("t").await.unwrap().len(), EMBEDDING_DIM);
        assert_eq!(client.embed_calls(), 1);
        assert_eq!(client.generate_calls(), 1);
    }

    #[tokio::test]
    async fn unavailable_client_fails_every_call() {
        let client = StaticClient::unavailable();
        assert!(client.embed("t").await.is_err());
        assert!(client.generate("p").await.is_err());
    }
}
