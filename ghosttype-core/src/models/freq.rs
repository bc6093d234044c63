//! Token-prefix matching through the full-text projection.
//!
//! Unlike the prefix predictor this matches a whole-token prefix anywhere
//! in the command, so `docker` surfaces `sudo docker run` too.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::ModelError;
use crate::store::SqliteStore;
use crate::suggest::{SuggestModel, Suggestion};

pub const FREQ_WEIGHT: f64 = 0.5;

pub struct FreqModel {
    store: Arc<SqliteStore>,
}

impl FreqModel {
    pub fn new(store: Arc<SqliteStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl SuggestModel for FreqModel {
    fn name(&self) -> &'static str {
        "freq"
    }

    async fn learn(&self, _entries: &[String]) -> Result<(), ModelError> {
        Ok(())
    }

    async fn predict(&self, input: &str) -> Result<Vec<Suggestion>, ModelError> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(Vec::new());
        }
        let rows = match self.store.query_fts(input) {
            Ok(rows) => rows,
            Err(e) => {
                debug!(model = "freq", error = %e, "fts query failed, returning empty");
                return Ok(Vec::new());
            }
        };
        Ok(rows
            .into_iter()
            .map(|(command, count)| Suggestion::new(command, count as f64, "freq"))
            .collect())
    }

    fn weight(&self) -> f64 {
        FREQ_WEIGHT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn matches_token_prefix_anywhere() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        store
            .save_history(&[
                "docker run nginx".into(),
                "sudo docker run nginx".into(),
                "git push".into(),
            ])
            .unwrap();
        let model = FreqModel::new(store);

        let results = model.predict("docker").await.unwrap();
        let texts: Vec<_> = results.iter().map(|s| s.text.as_str()).collect();
        assert!(texts.contains(&"docker run nginx"));
        assert!(texts.contains(&"sudo docker run nginx"));
        assert!(!texts.contains(&"git push"));
        assert!(results.iter().all(|s| s.source == "freq"));
    }

    #[tokio::test]
    async fn empty_input_yields_nothing() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let model = FreqModel::new(store);
        assert!(model.predict("").await.unwrap().is_empty());
    }
}
