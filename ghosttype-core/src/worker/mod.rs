//! Background sync workers.
//!
//! One worker per ingested source (shell history, rc-file aliases). Each
//! cycle is guarded by a file-mtime watermark so an unchanged source costs
//! one stat, and by [`lock::IngestGuard`] so at most one cycle per source
//! runs at a time across processes.

pub mod alias;
pub mod history;
pub mod lock;

use std::path::Path;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::error::WorkerError;

pub use alias::AliasSyncWorker;
pub use history::HistorySyncWorker;
pub use lock::IngestGuard;

/// Soft deadline for one sync cycle. Work committed before the deadline
/// is kept.
pub const SYNC_TIMEOUT: Duration = Duration::from_secs(180);

/// One ingestion source that can be synced into the store.
pub trait SyncWorker: Send + Sync + 'static {
    /// Watermark key of the source.
    fn key(&self) -> &'static str;

    /// Path of the source file.
    fn path(&self) -> &Path;

    /// Whether the source changed since the last successful sync.
    fn needs_reload(&self) -> bool;

    /// Load, filter and persist the source.
    fn sync(&self) -> Result<(), WorkerError>;
}

/// Launch one background cycle per worker.
///
/// Returns the join handles so callers that need to wait (tests, one-shot
/// mode) can; the interactive session just lets them run.
pub fn launch_sync_workers(workers: Vec<Box<dyn SyncWorker>>) -> Vec<tokio::task::JoinHandle<()>> {
    workers
        .into_iter()
        .map(|worker| {
            tokio::spawn(async move {
                let key = worker.key();

                let Some(guard) = IngestGuard::acquire(key) else {
                    debug!(key, "sync skipped (already running)");
                    return;
                };
                if !worker.needs_reload() {
                    debug!(key, "sync skipped (up-to-date)");
                    return;
                }

                // The guard travels into the blocking task so the lock is
                // held until the cycle actually finishes, even past the
                // soft deadline.
                let work = tokio::task::spawn_blocking(move || {
                    let _guard = guard;
                    worker.sync()
                });

                match tokio::time::timeout(SYNC_TIMEOUT, work).await {
                    Ok(Ok(Ok(()))) => info!(key, "sync done"),
                    Ok(Ok(Err(e))) => error!(key, error = %e, "sync failed"),
                    Ok(Err(e)) => error!(key, error = %e, "sync task panicked"),
                    Err(_) => {
                        warn!(key, "sync deadline elapsed, keeping partial progress")
                    }
                }
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingWorker {
        key: &'static str,
        path: PathBuf,
        needs_reload: bool,
        runs: Arc<AtomicUsize>,
    }

    impl SyncWorker for CountingWorker {
        fn key(&self) -> &'static str {
            self.key
        }

        fn path(&self) -> &Path {
            &self.path
        }

        fn needs_reload(&self) -> bool {
            self.needs_reload
        }

        fn sync(&self) -> Result<(), WorkerError> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn runs_workers_that_need_reload() {
        let runs = Arc::new(AtomicUsize::new(0));
        let worker = CountingWorker {
            key: "test_worker_runs",
            path: PathBuf::from("/tmp/x"),
            needs_reload: true,
            runs: runs.clone(),
        };

        for handle in launch_sync_workers(vec![Box::new(worker)]) {
            handle.await.unwrap();
        }
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn skips_up_to_date_workers() {
        let runs = Arc::new(AtomicUsize::new(0));
        let worker = CountingWorker {
            key: "test_worker_skips",
            path: PathBuf::from("/tmp/x"),
            needs_reload: false,
            runs: runs.clone(),
        };

        for handle in launch_sync_workers(vec![Box::new(worker)]) {
            handle.await.unwrap();
        }
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }
}
