//! Filesystem paths for ghosttype.
//!
//! All durable state lives under the user's cache directory
//! (`~/.cache/ghosttype` on Linux, `~/Library/Caches/ghosttype` on macOS).
//! Ingestion lock files live in the OS temp directory so a wiped cache
//! never strands a lock.

use std::path::PathBuf;

/// Get the ghosttype cache directory.
///
/// Returns `<user cache dir>/ghosttype`, falling back to `.cache/ghosttype`
/// relative to the working directory when no cache dir can be resolved.
pub fn cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join("ghosttype")
}

/// Path of the SQLite store.
pub fn db_path() -> PathBuf {
    cache_dir().join("ghosttype.db")
}

/// Path of the log file.
pub fn log_path() -> PathBuf {
    cache_dir().join("ghosttype.log")
}

/// Path of the cross-process ingestion lock for a sync source.
///
/// Lives in the OS temp directory, keyed by the logical source name
/// (e.g. `zsh_history`, `aliases`).
pub fn lock_path(key: &str) -> PathBuf {
    std::env::temp_dir().join(format!("ghosttype-{key}.lock"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_dir_ends_with_ghosttype() {
        assert!(cache_dir().ends_with("ghosttype"));
    }

    #[test]
    fn test_db_path_is_under_cache_dir() {
        let db = db_path();
        assert!(db.starts_with(cache_dir()));
        assert_eq!(db.file_name().unwrap(), "ghosttype.db");
    }

    #[test]
    fn test_lock_path_embeds_key() {
        let lock = lock_path("zsh_history");
        assert!(lock.starts_with(std::env::temp_dir()));
        assert_eq!(
            lock.file_name().unwrap().to_str().unwrap(),
            "ghosttype-zsh_history.lock"
        );
    }
}
