//! Log setup.
//!
//! Logs go to a file under the cache directory, never to the terminal the
//! suggestions render on. `GHOSTTYPE_LOG_LEVEL` picks the level
//! (`debug|info|warn|error|none`), defaulting to `warn`.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

fn level_filter() -> EnvFilter {
    let level = std::env::var("GHOSTTYPE_LOG_LEVEL").unwrap_or_else(|_| "warn".to_string());
    let directive = match level.as_str() {
        "none" => "off",
        "debug" | "info" | "warn" | "error" => level.as_str(),
        other => {
            eprintln!("ghosttype: unknown log level {other:?}, using warn");
            "warn"
        }
    };
    EnvFilter::new(directive)
}

/// Install the global subscriber writing to `log_path`.
pub fn init(log_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating log directory {}", parent.display()))?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("opening log file {}", log_path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(level_filter())
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_level_falls_back_to_warn() {
        // Only exercises the mapping, not the global subscriber.
        let filter = level_filter();
        assert!(!filter.to_string().is_empty());
    }
}
