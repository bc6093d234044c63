//! The predictor contract and the suggestion value passed between
//! predictors and the ensemble.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::ModelError;

/// A single completion candidate produced by a predictor.
///
/// Scores are predictor-local; cross-predictor comparison only happens
/// after the ensemble applies each predictor's weight. Lives only in
/// memory during one prediction cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    /// The candidate full command.
    pub text: String,
    /// Non-negative, predictor-local score.
    pub score: f64,
    /// Tag of the predictor that produced this suggestion. Empty on
    /// merged rankings.
    pub source: &'static str,
}

impl Suggestion {
    pub fn new(text: impl Into<String>, score: f64, source: &'static str) -> Self {
        Self {
            text: text.into(),
            score,
            source,
        }
    }
}

/// Contract shared by all predictors.
///
/// Implementations must tolerate an empty prefix (return an empty list)
/// and must not fail the cycle on transient store or network trouble;
/// those are logged and converted to empty results.
#[async_trait]
pub trait SuggestModel: Send + Sync {
    /// Stable tag identifying the predictor (`prefix`, `freq`, ...).
    fn name(&self) -> &'static str;

    /// Absorb a batch of commands. A no-op for store-backed predictors.
    async fn learn(&self, entries: &[String]) -> Result<(), ModelError>;

    /// Return up to ~20 suggestions for the given prefix.
    async fn predict(&self, input: &str) -> Result<Vec<Suggestion>, ModelError>;

    /// Fixed nonnegative multiplier applied by the ensemble.
    fn weight(&self) -> f64;
}

/// Accumulates weighted scores per suggestion text, preserving first-seen
/// order so ranking ties break deterministically.
#[derive(Debug, Default)]
pub(crate) struct ScoreMap {
    order: Vec<String>,
    scores: HashMap<String, f64>,
}

impl ScoreMap {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(&mut self, text: &str, delta: f64) {
        if !self.scores.contains_key(text) {
            self.order.push(text.to_string());
        }
        *self.scores.entry(text.to_string()).or_insert(0.0) += delta;
    }

    /// Rank by descending score. The sort is stable, so equal scores keep
    /// first-seen order.
    pub(crate) fn ranked(self) -> Vec<Suggestion> {
        let ScoreMap { order, scores } = self;
        let mut entries: Vec<(String, f64)> = order
            .into_iter()
            .map(|text| {
                let score = scores[&text];
                (text, score)
            })
            .collect();
        entries.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        entries
            .into_iter()
            .map(|(text, score)| Suggestion {
                text,
                score,
                source: "",
            })
            .collect()
    }
}
