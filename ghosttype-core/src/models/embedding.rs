//! Semantic completion over embedded history.
//!
//! The only predictor with a learning phase that writes durable state: it
//! embeds not-yet-seen history commands through the model service and owns
//! the embedding rows. Heavy tier; any network or store trouble costs one
//! cycle, never the session.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::ModelError;
use crate::ollama::ModelClient;
use crate::store::SqliteStore;
use crate::suggest::{SuggestModel, Suggestion};

pub const EMBEDDING_WEIGHT: f64 = 0.6;

/// Embedding rows written by this predictor carry this source tag.
const EMBEDDING_SOURCE: &str = "history";

/// Cap on inserts per learn invocation, bounding network pressure. The
/// seed corpus arrives oldest-first, so successive sessions work through
/// the backlog from the oldest unembedded entry.
const MAX_LEARN_INSERTS: usize = 100;

const SEARCH_TOP_K: usize = 10;
const SCORE_THRESHOLD: f64 = 0.5;

pub struct EmbeddingModel {
    store: Arc<SqliteStore>,
    client: Arc<dyn ModelClient>,
}

impl EmbeddingModel {
    pub fn new(store: Arc<SqliteStore>, client: Arc<dyn ModelClient>) -> Self {
        Self { store, client }
    }
}

#[async_trait]
impl SuggestModel for EmbeddingModel {
    fn name(&self) -> &'static str {
        "embedding"
    }

    async fn learn(&self, entries: &[String]) -> Result<(), ModelError> {
        let mut inserted = 0usize;
        let mut failures = 0usize;

        for entry in entries {
            if inserted >= MAX_LEARN_INSERTS {
                break;
            }

            match self.store.embedding_exists(EMBEDDING_SOURCE, entry) {
                Ok(true) => continue,
                Ok(false) => {}
                Err(e) => {
                    debug!(error = %e, "embedding existence check failed");
                    failures += 1;
                    continue;
                }
            }

            let vector = match self.client.embed(entry).await {
                Ok(vector) => vector,
                Err(e) => {
                    debug!(error = %e, entry = %entry, "embedding request failed");
                    failures += 1;
                    continue;
                }
            };

            if let Err(e) = self.store.embedding_save(EMBEDDING_SOURCE, entry, &vector) {
                debug!(error = %e, entry = %entry, "embedding save failed");
                failures += 1;
                continue;
            }
            inserted += 1;
        }

        if failures > 0 {
            return Err(ModelError::Other(format!(
                "{failures} embeddings could not be learned"
            )));
        }
        Ok(())
    }

    async fn predict(&self, input: &str) -> Result<Vec<Suggestion>, ModelError> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(Vec::new());
        }

        let vector = match self.client.embed(input).await {
            Ok(vector) => vector,
            Err(e) => {
                debug!(model = "embedding", error = %e, "embed failed, returning empty");
                return Ok(Vec::new());
            }
        };

        let results = match self.store.embedding_search(
            &vector,
            EMBEDDING_SOURCE,
            SEARCH_TOP_K,
            SCORE_THRESHOLD,
        ) {
            Ok(results) => results,
            Err(e) => {
                debug!(model = "embedding", error = %e, "search failed, returning empty");
                return Ok(Vec::new());
            }
        };

        Ok(results
            .into_iter()
            .map(|(text, score)| Suggestion::new(text, score, "embedding"))
            .collect())
    }

    fn weight(&self) -> f64 {
        EMBEDDING_WEIGHT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ollama::mock::StaticClient;
    use crate::store::EMBEDDING_DIM;

    fn axis(i: usize) -> Vec<f32> {
        let mut v = vec![0.0; EMBEDDING_DIM];
        v[i] = 1.0;
        v
    }

    #[tokio::test]
    async fn learn_skips_already_embedded_entries() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let client = Arc::new(StaticClient::new(""));
        let model = EmbeddingModel::new(store.clone(), client.clone());

        let entries = vec!["git push".to_string(), "git pull".to_string()];
        model.learn(&entries).await.unwrap();
        assert_eq!(client.embed_calls(), 2);

        // Second pass finds both rows present and never hits the network.
        model.learn(&entries).await.unwrap();
        assert_eq!(client.embed_calls(), 2);
        assert!(store.embedding_exists("history", "git push").unwrap());
    }

    #[tokio::test]
    async fn learn_caps_inserts_per_invocation() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let client = Arc::new(StaticClient::new(""));
        let model = EmbeddingModel::new(store.clone(), client.clone());

        let entries: Vec<String> = (0..150).map(|i| format!("command {i}")).collect();
        model.learn(&entries).await.unwrap();
        assert_eq!(client.embed_calls(), 100);

        // Oldest entries went first; the next invocation continues.
        assert!(store.embedding_exists("history", "command 0").unwrap());
        assert!(!store.embedding_exists("history", "command 120").unwrap());
        model.learn(&entries).await.unwrap();
        assert!(store.embedding_exists("history", "command 120").unwrap());
    }

    #[tokio::test]
    async fn learn_continues_past_failures() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let client = Arc::new(StaticClient::unavailable());
        let model = EmbeddingModel::new(store.clone(), client.clone());

        let entries = vec!["one cmd".to_string(), "two cmd".to_string()];
        let err = model.learn(&entries).await.unwrap_err();
        assert!(err.to_string().contains("2 embeddings"));
        assert_eq!(client.embed_calls(), 2);
    }

    #[tokio::test]
    async fn predict_returns_similar_commands() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        store
            .embedding_save("history", "git push origin", &axis(0))
            .unwrap();
        store
            .embedding_save("history", "rm -rf target", &axis(3))
            .unwrap();
        let client = Arc::new(StaticClient::new("").with_embedding(axis(0)));
        let model = EmbeddingModel::new(store, client);

        let results = model.predict("push my branch").await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].text, "git push origin");
        assert_eq!(results[0].source, "embedding");
        assert!(results[0].score > 0.99);
    }

    #[tokio::test]
    async fn predict_swallows_network_errors() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let model = EmbeddingModel::new(store, Arc::new(StaticClient::unavailable()));
        assert!(model.predict("git").await.unwrap().is_empty());
    }
}
