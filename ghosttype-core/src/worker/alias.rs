//! Alias sync worker.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, error};

use crate::error::WorkerError;
use crate::history::{detect_shell, Shell};
use crate::shellrc;
use crate::store::SqliteStore;

use super::SyncWorker;

/// Reads alias definitions from the shell rc file into the store,
/// watermarked by the rc file's mtime.
pub struct AliasSyncWorker {
    store: Arc<SqliteStore>,
    rc_path: PathBuf,
}

impl AliasSyncWorker {
    pub fn new(store: Arc<SqliteStore>, rc_path: impl Into<PathBuf>) -> Self {
        Self {
            store,
            rc_path: rc_path.into(),
        }
    }

    /// Build the worker for the current environment, or `None` when the
    /// shell has no supported rc file. The session then simply runs
    /// without alias suggestions from this source.
    pub fn for_env(store: Arc<SqliteStore>) -> Option<Self> {
        let home = dirs::home_dir()?;
        let rc_path = match detect_shell() {
            Shell::Zsh => home.join(".zshrc"),
            Shell::Bash => home.join(".bashrc"),
            _ => {
                debug!("unsupported shell for alias sync");
                return None;
            }
        };
        Some(Self::new(store, rc_path))
    }

    fn current_mtime(&self) -> std::io::Result<i64> {
        let modified = std::fs::metadata(&self.rc_path)?.modified()?;
        Ok(modified
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0))
    }
}

impl SyncWorker for AliasSyncWorker {
    fn key(&self) -> &'static str {
        "aliases"
    }

    fn path(&self) -> &Path {
        &self.rc_path
    }

    fn needs_reload(&self) -> bool {
        let path = self.rc_path.to_string_lossy().into_owned();
        let last = match self.store.last_processed_mtime(self.key(), &path) {
            Ok(last) => last,
            Err(_) => return true,
        };
        let Ok(current) = self.current_mtime() else {
            return false;
        };
        current > last
    }

    fn sync(&self) -> Result<(), WorkerError> {
        let mtime = self.current_mtime()?;
        let aliases = shellrc::extract_aliases(&self.rc_path)?;

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);
        for alias in &aliases {
            if let Err(e) = self.store.upsert_alias(&alias.name, &alias.cmd, now) {
                error!(name = %alias.name, error = %e, "failed to register alias");
            }
        }

        let path = self.rc_path.to_string_lossy().into_owned();
        self.store.update_metadata(self.key(), &path, mtime)?;
        debug!(count = aliases.len(), "synced aliases");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn sync_upserts_aliases_and_watermark() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "alias gcm='git commit'").unwrap();
        writeln!(file, "export EDITOR=vim").unwrap();
        writeln!(file, "alias gst=\"git status\"").unwrap();
        file.flush().unwrap();

        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let worker = AliasSyncWorker::new(store.clone(), file.path());

        assert!(worker.needs_reload());
        worker.sync().unwrap();

        let names: Vec<_> = store
            .query_aliases("g")
            .unwrap()
            .into_iter()
            .map(|a| a.name)
            .collect();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"gcm".to_string()));
        assert!(names.contains(&"gst".to_string()));
        assert!(!worker.needs_reload());
    }

    #[test]
    fn resync_overwrites_stale_expansion() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "alias gcm='git commit'").unwrap();
        file.flush().unwrap();

        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let worker = AliasSyncWorker::new(store.clone(), file.path());
        worker.sync().unwrap();

        std::fs::write(file.path(), "alias gcm='git commit --verbose'\n").unwrap();
        worker.sync().unwrap();

        let aliases = store.query_aliases("gcm").unwrap();
        assert_eq!(aliases[0].cmd, "git commit --verbose");
    }

    #[test]
    fn missing_rc_file_does_not_need_reload() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let worker = AliasSyncWorker::new(store, "/nonexistent/.zshrc");
        assert!(!worker.needs_reload());
    }
}
