//! Two-tier ensemble scheduler.
//!
//! Fans out to every enabled predictor concurrently, merges their weighted
//! scores into a single ranking, and exposes both a one-shot [`predict`]
//! and a streaming [`progressive_predict`] that emits fast local results
//! before the slower network-backed tier.
//!
//! [`predict`]: Ensemble::predict
//! [`progressive_predict`]: Ensemble::progressive_predict

use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::debug;

use crate::error::ModelError;
use crate::suggest::{ScoreMap, SuggestModel, Suggestion};

/// Global budget for one prediction cycle.
pub const SUGGESTION_TIMEOUT: Duration = Duration::from_secs(2);

/// Sub-deadline for the light tier of a progressive prediction.
pub const LIGHT_TIMEOUT: Duration = Duration::from_millis(100);

/// Which tier produced a progressive emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Light,
    Heavy,
}

/// One ranked list emitted by [`Ensemble::progressive_predict`].
#[derive(Debug, Clone)]
pub struct TierUpdate {
    pub tier: Tier,
    pub suggestions: Vec<Suggestion>,
}

type ModelSet = Arc<Vec<Arc<dyn SuggestModel>>>;

/// The predictor ensemble.
///
/// Model lists are published as atomically swapped snapshots: a predict
/// call clones the current `Arc` and works against that set for its whole
/// duration, so heavy models can be registered mid-session without
/// blocking in-flight predictions.
pub struct Ensemble {
    light: RwLock<ModelSet>,
    heavy: RwLock<ModelSet>,
}

impl Ensemble {
    pub fn new(light: Vec<Arc<dyn SuggestModel>>) -> Self {
        Self {
            light: RwLock::new(Arc::new(light)),
            heavy: RwLock::new(Arc::new(Vec::new())),
        }
    }

    /// Register a heavy model after its readiness probe succeeded.
    pub fn add_heavy_model(&self, model: Arc<dyn SuggestModel>) {
        let mut heavy = self.heavy.write().unwrap();
        let mut next = heavy.as_ref().clone();
        next.push(model);
        *heavy = Arc::new(next);
    }

    fn light_snapshot(&self) -> ModelSet {
        self.light.read().unwrap().clone()
    }

    fn heavy_snapshot(&self) -> ModelSet {
        self.heavy.read().unwrap().clone()
    }

    /// Names of the currently registered heavy models.
    pub fn heavy_model_names(&self) -> Vec<&'static str> {
        self.heavy_snapshot().iter().map(|m| m.name()).collect()
    }

    /// Feed a corpus to every model. Errors are collected, not fatal.
    pub async fn learn(&self, entries: &[String]) -> Result<(), ModelError> {
        let mut errors = Vec::new();
        for model in self
            .light_snapshot()
            .iter()
            .chain(self.heavy_snapshot().iter())
        {
            if let Err(e) = model.learn(entries).await {
                errors.push(format!("{}: {e}", model.name()));
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ModelError::Other(errors.join("; ")))
        }
    }

    /// One-shot prediction over every registered model.
    ///
    /// Wall time is bounded by [`SUGGESTION_TIMEOUT`]; predictors that
    /// miss the deadline contribute nothing to the ranking.
    pub async fn predict(&self, input: &str) -> Vec<Suggestion> {
        let input = input.trim();
        if input.is_empty() {
            return Vec::new();
        }
        let mut models: Vec<Arc<dyn SuggestModel>> = self.light_snapshot().as_ref().clone();
        models.extend(self.heavy_snapshot().iter().cloned());

        run_models(models, input, Instant::now() + SUGGESTION_TIMEOUT).await
    }

    /// Progressive prediction: at most two ranked lists on the returned
    /// channel, light tier strictly before heavy tier, then the stream
    /// closes.
    ///
    /// Each tier is merged into its own fresh score map; the session
    /// driver applies its own cross-tier weighting. Dropping the receiver
    /// cancels in-flight predictor tasks.
    pub fn progressive_predict(&self, input: &str) -> mpsc::Receiver<TierUpdate> {
        let (tx, rx) = mpsc::channel(2);
        let input = input.trim().to_string();
        let light = self.light_snapshot();
        let heavy = self.heavy_snapshot();

        tokio::spawn(async move {
            let deadline = Instant::now() + SUGGESTION_TIMEOUT;

            if !light.is_empty() {
                let light_deadline = Instant::now() + LIGHT_TIMEOUT;
                let suggestions = tokio::select! {
                    // Receiver dropped: stop and let the tasks abort.
                    _ = tx.closed() => return,
                    s = run_models(light.as_ref().clone(), &input, light_deadline.min(deadline)) => s,
                };
                if tx
                    .send(TierUpdate {
                        tier: Tier::Light,
                        suggestions,
                    })
                    .await
                    .is_err()
                {
                    return;
                }
            }

            if !heavy.is_empty() {
                let suggestions = tokio::select! {
                    _ = tx.closed() => return,
                    s = run_models(heavy.as_ref().clone(), &input, deadline) => s,
                };
                let _ = tx
                    .send(TierUpdate {
                        tier: Tier::Heavy,
                        suggestions,
                    })
                    .await;
            }
        });

        rx
    }
}

/// Run a set of models concurrently under one deadline and rank the
/// merged, weighted scores.
///
/// Individual model failures and timeouts are logged and contribute empty
/// results; they never cancel their peers.
async fn run_models(
    models: Vec<Arc<dyn SuggestModel>>,
    input: &str,
    deadline: Instant,
) -> Vec<Suggestion> {
    let mut tasks: JoinSet<(&'static str, f64, Vec<Suggestion>)> = JoinSet::new();
    for model in models {
        let input = input.to_string();
        tasks.spawn(async move {
            let name = model.name();
            let weight = model.weight();
            match model.predict(&input).await {
                Ok(suggestions) => (name, weight, suggestions),
                Err(e) => {
                    debug!(model = name, error = %e, "predictor failed");
                    (name, weight, Vec::new())
                }
            }
        });
    }

    let mut scores = ScoreMap::new();
    loop {
        match tokio::time::timeout_at(deadline, tasks.join_next()).await {
            Ok(Some(Ok((_, weight, suggestions)))) => {
                for s in &suggestions {
                    scores.add(&s.text, s.score * weight);
                }
            }
            Ok(Some(Err(e))) => {
                debug!(error = %e, "predictor task aborted");
            }
            Ok(None) => break,
            Err(_) => {
                debug!("prediction deadline elapsed, dropping unfinished predictors");
                tasks.abort_all();
                break;
            }
        }
    }

    scores.ranked()
}
