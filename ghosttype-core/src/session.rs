//! Session driver state.
//!
//! The interactive consumer of the ensemble: tracks the live prefix under
//! a monotonically increasing generation, discards emissions that belong
//! to a stale prefix, and merges the light and heavy tiers into the list
//! shown to the user.

use crate::ensemble::{Tier, TierUpdate};
use crate::suggest::{ScoreMap, Suggestion};

/// Merge multiplier for the light tier.
pub const LIGHT_MERGE_WEIGHT: f64 = 1.0;

/// Merge multiplier for the heavy tier. Above 1.0 so semantic results
/// outrank textual ones once they do arrive, without re-ranking the light
/// tier in place.
pub const HEAVY_MERGE_WEIGHT: f64 = 1.5;

/// A prefix change accepted by the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixChange {
    pub prefix: String,
    pub generation: u64,
}

/// State machine behind the interactive session.
#[derive(Debug, Default)]
pub struct SessionDriver {
    prefix: String,
    generation: u64,
    light: Vec<Suggestion>,
    heavy: Vec<Suggestion>,
}

impl SessionDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current trimmed prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Identity of the current prefix; emissions carrying an older
    /// generation are discarded.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Register new input. Returns the change to predict for, or `None`
    /// when the trimmed prefix is unchanged. Both caches are cleared on
    /// change.
    pub fn set_input(&mut self, raw: &str) -> Option<PrefixChange> {
        let prefix = raw.trim();
        if prefix == self.prefix {
            return None;
        }
        self.prefix = prefix.to_string();
        self.generation += 1;
        self.light.clear();
        self.heavy.clear();
        Some(PrefixChange {
            prefix: self.prefix.clone(),
            generation: self.generation,
        })
    }

    /// Store a tier emission. Returns false (and drops the emission) when
    /// it belongs to a stale generation.
    pub fn accept(&mut self, generation: u64, update: TierUpdate) -> bool {
        if generation != self.generation {
            return false;
        }
        match update.tier {
            Tier::Light => self.light = update.suggestions,
            Tier::Heavy => self.heavy = update.suggestions,
        }
        true
    }

    /// The merged view: light and heavy scores combined under the display
    /// weighting, ranked descending with first-seen tie-break.
    pub fn merged(&self) -> Vec<Suggestion> {
        let mut scores = ScoreMap::new();
        for s in &self.light {
            scores.add(&s.text, s.score * LIGHT_MERGE_WEIGHT);
        }
        for s in &self.heavy {
            scores.add(&s.text, s.score * HEAVY_MERGE_WEIGHT);
        }
        scores.ranked()
    }

    /// Whether there is nothing to display.
    pub fn is_empty(&self) -> bool {
        self.light.is_empty() && self.heavy.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(tier: Tier, suggestions: &[(&str, f64)]) -> TierUpdate {
        TierUpdate {
            tier,
            suggestions: suggestions
                .iter()
                .map(|(text, score)| Suggestion::new(*text, *score, ""))
                .collect(),
        }
    }

    #[test]
    fn set_input_bumps_generation_and_clears_caches() {
        let mut driver = SessionDriver::new();
        let change = driver.set_input("git").unwrap();
        assert_eq!(change.generation, 1);

        driver.accept(1, update(Tier::Light, &[("git push", 1.0)]));
        assert!(!driver.is_empty());

        let change = driver.set_input("git p").unwrap();
        assert_eq!(change.generation, 2);
        assert!(driver.is_empty());
    }

    #[test]
    fn set_input_ignores_whitespace_only_changes() {
        let mut driver = SessionDriver::new();
        driver.set_input("git").unwrap();
        assert!(driver.set_input("  git  ").is_none());
        assert_eq!(driver.generation(), 1);
    }

    #[test]
    fn stale_emissions_are_discarded() {
        let mut driver = SessionDriver::new();
        driver.set_input("git").unwrap();
        driver.set_input("git p").unwrap();

        assert!(!driver.accept(1, update(Tier::Light, &[("git push", 1.0)])));
        assert!(driver.is_empty());

        assert!(driver.accept(2, update(Tier::Light, &[("git pull", 1.0)])));
        assert_eq!(driver.merged()[0].text, "git pull");
    }

    #[test]
    fn merged_weights_heavy_results_higher() {
        let mut driver = SessionDriver::new();
        driver.set_input("g").unwrap();
        driver.accept(1, update(Tier::Light, &[("git status", 1.0)]));
        driver.accept(1, update(Tier::Heavy, &[("git stash", 1.0)]));

        let merged = driver.merged();
        assert_eq!(merged[0].text, "git stash");
        assert!((merged[0].score - 1.5).abs() < 1e-9);
        assert_eq!(merged[1].text, "git status");
        assert!((merged[1].score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn merged_sums_scores_for_shared_texts() {
        let mut driver = SessionDriver::new();
        driver.set_input("g").unwrap();
        driver.accept(1, update(Tier::Light, &[("git push", 2.0)]));
        driver.accept(1, update(Tier::Heavy, &[("git push", 1.0)]));

        let merged = driver.merged();
        assert_eq!(merged.len(), 1);
        assert!((merged[0].score - 3.5).abs() < 1e-9);
    }

    #[test]
    fn late_heavy_update_keeps_light_results() {
        let mut driver = SessionDriver::new();
        driver.set_input("g").unwrap();
        driver.accept(1, update(Tier::Light, &[("git status", 3.0)]));

        assert_eq!(driver.merged().len(), 1);

        driver.accept(1, update(Tier::Heavy, &[("git stash", 1.0)]));
        assert_eq!(driver.merged().len(), 2);
        // Light results still outrank a weaker heavy score.
        assert_eq!(driver.merged()[0].text, "git status");
    }
}
