//! In-memory first-order Markov predictor.
//!
//! Learns a transition table over whitespace-separated tokens and
//! completes the last token of the prefix with its most frequent
//! successors. The only predictor that works with no store and no
//! network, which makes it the floor of the degraded path.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::ModelError;
use crate::suggest::{SuggestModel, Suggestion};

pub const MARKOV_WEIGHT: f64 = 0.4;

/// Cap shared with the other predictors' query limits.
const MAX_SUGGESTIONS: usize = 20;

#[derive(Default)]
pub struct MarkovModel {
    transitions: RwLock<HashMap<String, HashMap<String, u64>>>,
}

impl MarkovModel {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SuggestModel for MarkovModel {
    fn name(&self) -> &'static str {
        "markov"
    }

    async fn learn(&self, entries: &[String]) -> Result<(), ModelError> {
        let mut transitions = self.transitions.write().unwrap();
        for entry in entries {
            let tokens: Vec<&str> = entry.split_whitespace().collect();
            for pair in tokens.windows(2) {
                *transitions
                    .entry(pair[0].to_string())
                    .or_default()
                    .entry(pair[1].to_string())
                    .or_insert(0) += 1;
            }
        }
        Ok(())
    }

    async fn predict(&self, input: &str) -> Result<Vec<Suggestion>, ModelError> {
        let input = input.trim();
        let Some(last) = input.split_whitespace().last() else {
            return Ok(Vec::new());
        };

        let transitions = self.transitions.read().unwrap();
        let Some(successors) = transitions.get(last) else {
            return Ok(Vec::new());
        };

        let mut pairs: Vec<(&String, &u64)> = successors.iter().collect();
        pairs.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        pairs.truncate(MAX_SUGGESTIONS);

        Ok(pairs
            .into_iter()
            .map(|(token, count)| {
                Suggestion::new(format!("{input} {token}"), *count as f64, "markov")
            })
            .collect())
    }

    fn weight(&self) -> f64 {
        MARKOV_WEIGHT
    }
}
