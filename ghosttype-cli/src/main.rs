use std::sync::Arc;

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};

use ghosttype_core::engine::{build_engine, EngineOptions, ModelInitEvent, ModelStatus};
use ghosttype_core::history::{self, HistorySource};
use ghosttype_core::ollama::OllamaClient;
use ghosttype_core::worker::{launch_sync_workers, AliasSyncWorker, HistorySyncWorker, SyncWorker};
use ghosttype_core::{ModelServiceConfig, SqliteStore};

mod commands;
mod logging;
mod tui;

#[derive(Parser)]
#[command(name = "ghosttype", about = "Suggest command completions based on shell history")]
#[command(version)]
struct Cli {
    /// Partial command to complete; prints the top suggestion
    prefix: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,

    /// Comma-separated predictor subset
    /// (markov,freq,prefix,alias,context,llm,embedding); empty = all
    #[arg(long, global = true, default_value = "")]
    filter_models: String,

    /// Initialize the engine and exit (startup-latency measurement)
    #[arg(long, global = true)]
    quick_exit: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch the interactive suggestion TUI
    Tui {
        /// Pre-seeded input text
        initial: Option<String>,
    },
}

/// Print the one-time degraded-service notice.
fn warn_service_unavailable() {
    use std::sync::Once;
    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        eprintln!(
            "ghosttype: local model service unavailable; \
             llm/embedding suggestions are disabled for this session"
        );
    });
}

/// Consume readiness events for the session. `quiet` suppresses the
/// stderr notice (the TUI draws over the terminal).
fn drain_model_events(
    mut events: tokio::sync::mpsc::Receiver<ModelInitEvent>,
    quiet: bool,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event.status {
                ModelStatus::Ready => {
                    tracing::debug!(model = event.name, "heavy model registered");
                }
                ModelStatus::Failed => {
                    tracing::warn!(
                        model = event.name,
                        error = event.error.as_deref().unwrap_or("unknown"),
                        "heavy model probe failed"
                    );
                    if !quiet {
                        warn_service_unavailable();
                    }
                }
            }
        }
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cache_dir = ghosttype_paths::cache_dir();
    std::fs::create_dir_all(&cache_dir)
        .with_context(|| format!("creating cache directory {}", cache_dir.display()))?;
    logging::init(&ghosttype_paths::log_path())?;

    // A store that cannot open or migrate is the one fatal startup error.
    let store = Arc::new(
        SqliteStore::open(ghosttype_paths::db_path())
            .with_context(|| format!("opening store at {}", ghosttype_paths::db_path().display()))?,
    );

    let source: Option<Arc<dyn HistorySource>> = history::source_for_env().map(Arc::from);

    let mut workers: Vec<Box<dyn SyncWorker>> = Vec::new();
    if let Some(source) = &source {
        workers.push(Box::new(HistorySyncWorker::new(
            store.clone(),
            source.clone(),
        )));
    }
    if let Some(alias_worker) = AliasSyncWorker::for_env(store.clone()) {
        workers.push(Box::new(alias_worker));
    }
    let _worker_handles = launch_sync_workers(workers);

    let client = Arc::new(OllamaClient::new(ModelServiceConfig::from_env()));
    let (engine, events) = build_engine(
        store,
        client,
        source,
        EngineOptions {
            filter_models: cli.filter_models.clone(),
            project_root: std::env::current_dir().unwrap_or_else(|_| ".".into()),
        },
    )
    .await;

    if cli.quick_exit {
        return Ok(());
    }

    match (cli.command, cli.prefix) {
        (Some(Commands::Tui { initial }), _) => {
            let _events_task = drain_model_events(events, true);
            commands::tui::run(engine, initial.unwrap_or_default()).await
        }
        (None, Some(prefix)) => {
            let _events_task = drain_model_events(events, false);
            commands::suggest::run(engine, &prefix).await
        }
        (None, None) => {
            Cli::command().print_help()?;
            Ok(())
        }
    }
}
