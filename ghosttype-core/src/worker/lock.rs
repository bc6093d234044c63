//! Ingestion exclusion.
//!
//! At most one sync cycle per source may run at a time. In-process
//! exclusion uses a global active-key set; cross-process exclusion uses an
//! exclusive-create lock file in the OS temp directory carrying the owner
//! PID. A lock file older than the TTL is treated as leftover from a
//! crashed run and reclaimed, so a crash never deadlocks future syncs.

use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, Mutex};
use std::time::Duration;

use tracing::debug;

/// Age after which a lock file is considered stale.
const STALE_TTL: Duration = Duration::from_secs(600);

static ACTIVE_KEYS: LazyLock<Mutex<HashSet<String>>> =
    LazyLock::new(|| Mutex::new(HashSet::new()));

/// Held for the duration of one sync cycle. Released on drop, including
/// during unwinding.
pub struct IngestGuard {
    key: String,
    path: PathBuf,
}

impl IngestGuard {
    /// Try to take the lock for `key`. Returns `None` when another cycle
    /// (in this process or another one) already holds it.
    pub fn acquire(key: &str) -> Option<Self> {
        Self::acquire_with_ttl(key, STALE_TTL)
    }

    fn acquire_with_ttl(key: &str, ttl: Duration) -> Option<Self> {
        if !ACTIVE_KEYS.lock().unwrap().insert(key.to_string()) {
            debug!(key, "sync already running in this process");
            return None;
        }

        let path = ghosttype_paths::lock_path(key);
        if !Self::create_lock_file(&path, ttl) {
            ACTIVE_KEYS.lock().unwrap().remove(key);
            return None;
        }

        Some(Self {
            key: key.to_string(),
            path,
        })
    }

    fn create_lock_file(path: &Path, ttl: Duration) -> bool {
        match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(mut file) => {
                let _ = write!(file, "{}", std::process::id());
                true
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                let age = std::fs::metadata(path)
                    .and_then(|m| m.modified())
                    .ok()
                    .and_then(|m| m.elapsed().ok());
                // Unreadable metadata counts as stale.
                let stale = age.map(|a| a > ttl).unwrap_or(true);
                if !stale {
                    debug!(path = %path.display(), "sync lock held by another process");
                    return false;
                }
                debug!(path = %path.display(), "reclaiming stale sync lock");
                let _ = std::fs::remove_file(path);
                match OpenOptions::new().write(true).create_new(true).open(path) {
                    Ok(mut file) => {
                        let _ = write!(file, "{}", std::process::id());
                        true
                    }
                    Err(_) => false,
                }
            }
            Err(e) => {
                debug!(path = %path.display(), error = %e, "could not create sync lock");
                false
            }
        }
    }
}

impl Drop for IngestGuard {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
        ACTIVE_KEYS.lock().unwrap().remove(&self.key);
    }
}
