//! History ingestion worker.

use std::path::Path;
use std::sync::Arc;

use crate::error::WorkerError;
use crate::history::zsh::filter_commands;
use crate::history::HistorySource;
use crate::store::SqliteStore;

use super::SyncWorker;

/// Parses the shell history file and persists command counts, watermarked
/// by the file's mtime.
pub struct HistorySyncWorker {
    store: Arc<SqliteStore>,
    source: Arc<dyn HistorySource>,
}

impl HistorySyncWorker {
    pub fn new(store: Arc<SqliteStore>, source: Arc<dyn HistorySource>) -> Self {
        Self { store, source }
    }
}

impl SyncWorker for HistorySyncWorker {
    fn key(&self) -> &'static str {
        self.source.key()
    }

    fn path(&self) -> &Path {
        self.source.path()
    }

    fn needs_reload(&self) -> bool {
        let path = self.path().to_string_lossy().into_owned();
        let last = match self.store.last_processed_mtime(self.key(), &path) {
            Ok(last) => last,
            // Conservative: a failing watermark read should not starve
            // ingestion forever.
            Err(_) => return true,
        };
        let Ok(current) = self.source.current_mtime() else {
            // Can't stat the file, nothing to ingest.
            return false;
        };
        current > last
    }

    fn sync(&self) -> Result<(), WorkerError> {
        // Observed before loading so the stored watermark never exceeds
        // what was actually ingested.
        let mtime = self.source.current_mtime()?;

        let commands = self.source.load_commands()?;
        let cleaned = filter_commands(commands);
        self.store.save_history(&cleaned)?;

        let path = self.path().to_string_lossy().into_owned();
        self.store.update_metadata(self.key(), &path, mtime)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::ZshHistory;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn worker_for(file: &NamedTempFile) -> (HistorySyncWorker, Arc<SqliteStore>) {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let source = Arc::new(ZshHistory::new(file.path()));
        (HistorySyncWorker::new(store.clone(), source), store)
    }

    #[test]
    fn sync_persists_filtered_commands_and_watermark() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, ": 1683776572:0;git status").unwrap();
        writeln!(file, ": 1683776580:0;ls").unwrap(); // too short, filtered
        writeln!(file, ": 1683776590:0;git status").unwrap();
        file.flush().unwrap();

        let (worker, store) = worker_for(&file);
        assert!(worker.needs_reload());
        worker.sync().unwrap();

        let rows = store.query_prefix("git").unwrap();
        assert_eq!(rows, vec![("git status".to_string(), 2)]);
        assert!(store.query_prefix("ls").unwrap().is_empty());

        let path = file.path().to_string_lossy().into_owned();
        assert!(store.last_processed_mtime("zsh_history", &path).unwrap() > 0);
    }

    #[test]
    fn unchanged_file_does_not_need_reload() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, ": 1683776572:0;git status").unwrap();
        file.flush().unwrap();

        let (worker, _store) = worker_for(&file);
        worker.sync().unwrap();
        assert!(!worker.needs_reload());
    }

    #[test]
    fn stored_watermark_is_at_least_start_mtime() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, ": 1683776572:0;git status").unwrap();
        file.flush().unwrap();

        let (worker, store) = worker_for(&file);
        let start_mtime = ZshHistory::new(file.path()).current_mtime().unwrap();
        worker.sync().unwrap();

        let path = file.path().to_string_lossy().into_owned();
        assert!(store.last_processed_mtime("zsh_history", &path).unwrap() >= start_mtime);
    }

    #[test]
    fn missing_file_skips_without_error() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let source = Arc::new(ZshHistory::new("/nonexistent/.zsh_history"));
        let worker = HistorySyncWorker::new(store, source);

        assert!(!worker.needs_reload());
        assert!(worker.sync().is_err());
    }
}
