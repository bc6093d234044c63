//! Engine assembly: build the ensemble, seed the in-memory predictors and
//! probe the heavy predictors in the background.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::debug;

use crate::ensemble::Ensemble;
use crate::history::HistorySource;
use crate::models::{
    AliasModel, ContextModel, EmbeddingModel, FreqModel, LlmModel, MarkovModel, PrefixModel,
};
use crate::ollama::ModelClient;
use crate::store::SqliteStore;
use crate::suggest::SuggestModel;

/// Commands pulled from the history tail to seed markov and the
/// embedding backlog.
const SEED_TAIL_LINES: usize = 100;

/// All known predictor names, as accepted by `--filter-models`.
pub const MODEL_NAMES: &[&str] = &[
    "markov",
    "freq",
    "prefix",
    "alias",
    "context",
    "llm",
    "embedding",
];

/// Outcome of a heavy model's readiness probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelStatus {
    Ready,
    Failed,
}

/// Readiness event published while heavy models come online.
#[derive(Debug, Clone)]
pub struct ModelInitEvent {
    pub name: &'static str,
    pub status: ModelStatus,
    pub error: Option<String>,
}

/// Knobs for [`build_engine`].
pub struct EngineOptions {
    /// Comma-separated predictor subset; empty enables everything.
    pub filter_models: String,
    /// Directory scanned for project build metadata.
    pub project_root: PathBuf,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            filter_models: String::new(),
            project_root: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }
}

fn enabled_set(filter: &str) -> HashSet<String> {
    if filter.trim().is_empty() {
        MODEL_NAMES.iter().map(|n| n.to_string()).collect()
    } else {
        filter
            .split(',')
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect()
    }
}

/// Split raw history entries into individual commands: compound lines
/// (`a; b | c`) become one entry per stage.
fn clean_entries(entries: &[String]) -> Vec<String> {
    entries
        .iter()
        .flat_map(|entry| entry.split(|c: char| c == ';' || c == '|'))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Build the ensemble for one session.
///
/// Light models come up synchronously; markov learns the recent history
/// tail inline. Heavy models are probed asynchronously (`embed("echo")` /
/// `generate("echo")`) and join the ensemble only on success, reported
/// through the returned event channel. A failed probe disables the model
/// for this session; the next session retries from scratch.
pub async fn build_engine(
    store: Arc<SqliteStore>,
    client: Arc<dyn ModelClient>,
    source: Option<Arc<dyn HistorySource>>,
    options: EngineOptions,
) -> (Arc<Ensemble>, mpsc::Receiver<ModelInitEvent>) {
    let seed = match &source {
        Some(source) => match source.load_tail(SEED_TAIL_LINES) {
            Ok(tail) => clean_entries(&tail),
            Err(e) => {
                debug!(error = %e, "history tail unavailable, seeding empty corpus");
                Vec::new()
            }
        },
        None => Vec::new(),
    };

    let enabled = enabled_set(&options.filter_models);
    let mut light: Vec<Arc<dyn SuggestModel>> = Vec::new();

    if enabled.contains("markov") {
        let markov = MarkovModel::new();
        // Seed corpus is tiny; learning is effectively instant.
        let _ = markov.learn(&seed).await;
        light.push(Arc::new(markov));
    }
    if enabled.contains("freq") {
        light.push(Arc::new(FreqModel::new(store.clone())));
    }
    if enabled.contains("prefix") {
        light.push(Arc::new(PrefixModel::new(store.clone())));
    }
    if enabled.contains("alias") {
        light.push(Arc::new(AliasModel::new(store.clone())));
    }
    if enabled.contains("context") {
        light.push(Arc::new(ContextModel::from_dir(&options.project_root)));
    }

    let ensemble = Arc::new(Ensemble::new(light));
    let (tx, rx) = mpsc::channel(MODEL_NAMES.len());

    if enabled.contains("embedding") {
        let model = EmbeddingModel::new(store.clone(), client.clone());
        let ensemble = ensemble.clone();
        let client = client.clone();
        let tx = tx.clone();
        let seed = seed.clone();
        tokio::spawn(async move {
            match client.embed("echo").await {
                Ok(_) => {
                    let model = Arc::new(model);
                    let learner = model.clone();
                    tokio::spawn(async move {
                        if let Err(e) = learner.learn(&seed).await {
                            debug!(error = %e, "background embedding learn incomplete");
                        }
                    });
                    ensemble.add_heavy_model(model);
                    let _ = tx
                        .send(ModelInitEvent {
                            name: "embedding",
                            status: ModelStatus::Ready,
                            error: None,
                        })
                        .await;
                }
                Err(e) => {
                    let _ = tx
                        .send(ModelInitEvent {
                            name: "embedding",
                            status: ModelStatus::Failed,
                            error: Some(e.to_string()),
                        })
                        .await;
                }
            }
        });
    }

    if enabled.contains("llm") {
        let ensemble = ensemble.clone();
        let client = client.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            match client.generate("echo").await {
                Ok(_) => {
                    ensemble.add_heavy_model(Arc::new(LlmModel::new(client)));
                    let _ = tx
                        .send(ModelInitEvent {
                            name: "llm",
                            status: ModelStatus::Ready,
                            error: None,
                        })
                        .await;
                }
                Err(e) => {
                    let _ = tx
                        .send(ModelInitEvent {
                            name: "llm",
                            status: ModelStatus::Failed,
                            error: Some(e.to_string()),
                        })
                        .await;
                }
            }
        });
    }

    (ensemble, rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ollama::mock::StaticClient;

    #[test]
    fn enabled_set_empty_filter_enables_all() {
        let enabled = enabled_set("");
        assert_eq!(enabled.len(), MODEL_NAMES.len());
        assert!(enabled.contains("markov"));
        assert!(enabled.contains("embedding"));
    }

    #[test]
    fn enabled_set_parses_csv_with_spaces() {
        let enabled = enabled_set("markov, prefix ,freq");
        assert_eq!(enabled.len(), 3);
        assert!(enabled.contains("prefix"));
        assert!(!enabled.contains("llm"));
    }

    #[test]
    fn clean_entries_splits_compound_commands() {
        let entries = vec![
            "cd repo; git status".to_string(),
            "cat log | grep error".to_string(),
            "   ".to_string(),
        ];
        assert_eq!(
            clean_entries(&entries),
            vec!["cd repo", "git status", "cat log", "grep error"]
        );
    }

    #[tokio::test]
    async fn build_engine_reports_failed_probes() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let client = Arc::new(StaticClient::unavailable());

        let (ensemble, mut events) = build_engine(
            store,
            client,
            None,
            EngineOptions {
                filter_models: "prefix,llm,embedding".into(),
                project_root: PathBuf::from("."),
            },
        )
        .await;

        let mut failed = Vec::new();
        for _ in 0..2 {
            let event = events.recv().await.unwrap();
            assert_eq!(event.status, ModelStatus::Failed);
            assert!(event.error.is_some());
            failed.push(event.name);
        }
        failed.sort_unstable();
        assert_eq!(failed, vec!["embedding", "llm"]);
        assert!(ensemble.heavy_model_names().is_empty());
    }

    #[tokio::test]
    async fn build_engine_registers_ready_heavy_models() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let client = Arc::new(StaticClient::new("git status\n"));

        let (ensemble, mut events) = build_engine(
            store,
            client,
            None,
            EngineOptions {
                filter_models: "prefix,llm".into(),
                project_root: PathBuf::from("."),
            },
        )
        .await;

        let event = events.recv().await.unwrap();
        assert_eq!(event.name, "llm");
        assert_eq!(event.status, ModelStatus::Ready);
        assert_eq!(ensemble.heavy_model_names(), vec!["llm"]);
    }

    #[tokio::test]
    async fn filtered_out_heavy_models_emit_no_events() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let client = Arc::new(StaticClient::new(""));

        let (_, mut events) = build_engine(
            store,
            client,
            None,
            EngineOptions {
                filter_models: "prefix".into(),
                project_root: PathBuf::from("."),
            },
        )
        .await;

        // All senders drop once no probes are spawned.
        assert!(events.recv().await.is_none());
    }
}
