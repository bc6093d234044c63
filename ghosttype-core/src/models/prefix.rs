//! Literal prefix matching over the history table.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::ModelError;
use crate::store::SqliteStore;
use crate::suggest::{SuggestModel, Suggestion};

pub const PREFIX_WEIGHT: f64 = 0.8;

/// Suggests history commands that start with the typed prefix, scored by
/// usage count.
pub struct PrefixModel {
    store: Arc<SqliteStore>,
}

impl PrefixModel {
    pub fn new(store: Arc<SqliteStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl SuggestModel for PrefixModel {
    fn name(&self) -> &'static str {
        "prefix"
    }

    async fn learn(&self, _entries: &[String]) -> Result<(), ModelError> {
        // Store-backed; ingestion owns the writes.
        Ok(())
    }

    async fn predict(&self, input: &str) -> Result<Vec<Suggestion>, ModelError> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(Vec::new());
        }
        let rows = match self.store.query_prefix(input) {
            Ok(rows) => rows,
            Err(e) => {
                debug!(model = "prefix", error = %e, "store query failed, returning empty");
                return Ok(Vec::new());
            }
        };
        Ok(rows
            .into_iter()
            .map(|(command, count)| Suggestion::new(command, count as f64, "prefix"))
            .collect())
    }

    fn weight(&self) -> f64 {
        PREFIX_WEIGHT
    }
}
