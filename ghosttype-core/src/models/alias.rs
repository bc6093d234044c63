//! Alias-name completion backed by the store's alias table.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::ModelError;
use crate::store::SqliteStore;
use crate::suggest::{SuggestModel, Suggestion};

pub const ALIAS_WEIGHT: f64 = 0.8;

/// Suggests alias names that start with the prefix. The expansion stays
/// informational; the suggested text is the alias itself.
pub struct AliasModel {
    store: Arc<SqliteStore>,
}

impl AliasModel {
    pub fn new(store: Arc<SqliteStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl SuggestModel for AliasModel {
    fn name(&self) -> &'static str {
        "alias"
    }

    async fn learn(&self, _entries: &[String]) -> Result<(), ModelError> {
        // The alias-sync worker owns the writes.
        Ok(())
    }

    async fn predict(&self, input: &str) -> Result<Vec<Suggestion>, ModelError> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(Vec::new());
        }
        let entries = match self.store.query_aliases(input) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(model = "alias", error = %e, "alias query failed, returning empty");
                return Ok(Vec::new());
            }
        };
        Ok(entries
            .into_iter()
            .map(|entry| Suggestion::new(entry.name, 1.0, "alias"))
            .collect())
    }

    fn weight(&self) -> f64 {
        ALIAS_WEIGHT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn suggests_alias_names_most_recent_first() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        store.upsert_alias("gcm", "git commit", 300).unwrap();
        store.upsert_alias("gst", "git status", 200).unwrap();
        store.upsert_alias("gaa", "git add .", 100).unwrap();
        let model = AliasModel::new(store);

        let results = model.predict("g").await.unwrap();
        let texts: Vec<_> = results.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["gcm", "gst", "gaa"]);
        assert!(results.iter().all(|s| s.score == 1.0));
        assert!(results.iter().all(|s| s.source == "alias"));
    }

    #[tokio::test]
    async fn empty_input_yields_nothing() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        store.upsert_alias("gcm", "git commit", 100).unwrap();
        let model = AliasModel::new(store);
        assert!(model.predict("").await.unwrap().is_empty());
    }
}
