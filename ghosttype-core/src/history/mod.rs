//! Shell history sources.
//!
//! A [`HistorySource`] knows where one shell keeps its history, how to
//! parse it in full (for ingestion) and how to read just the tail (for
//! seeding the in-memory predictors cheaply).

pub mod zsh;

use std::io;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

/// Shell flavor detected from `$SHELL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shell {
    Zsh,
    Bash,
    Fish,
    PowerShell,
    Unknown,
}

/// Detect the user's shell from the `$SHELL` basename.
pub fn detect_shell() -> Shell {
    let shell_path = std::env::var("SHELL").unwrap_or_default();
    let base = Path::new(&shell_path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");
    match base {
        b if b.contains("zsh") => Shell::Zsh,
        b if b.contains("bash") => Shell::Bash,
        b if b.contains("fish") => Shell::Fish,
        b if b.contains("pwsh") || b.contains("powershell") => Shell::PowerShell,
        _ => Shell::Unknown,
    }
}

/// Default history file location for a shell, under `home`.
pub fn default_history_path(shell: Shell, home: &Path) -> Option<PathBuf> {
    match shell {
        Shell::Zsh => Some(home.join(".zsh_history")),
        Shell::Bash => Some(home.join(".bash_history")),
        Shell::Fish => Some(home.join(".local/share/fish/fish_history")),
        Shell::PowerShell | Shell::Unknown => None,
    }
}

/// A parseable shell-history file.
pub trait HistorySource: Send + Sync {
    /// Logical watermark key (`zsh_history`, `bash_history`).
    fn key(&self) -> &'static str;

    /// Path of the backing file.
    fn path(&self) -> &Path;

    /// Current mtime of the backing file, in unix seconds.
    fn current_mtime(&self) -> io::Result<i64> {
        file_mtime(self.path())
    }

    /// Parse the whole file into commands, oldest first.
    fn load_commands(&self) -> io::Result<Vec<String>>;

    /// Read the most recent `n` commands without scanning the whole file.
    fn load_tail(&self, n: usize) -> io::Result<Vec<String>>;
}

fn file_mtime(path: &Path) -> io::Result<i64> {
    let modified = std::fs::metadata(path)?.modified()?;
    let secs = modified
        .duration_since(UNIX_EPOCH)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?
        .as_secs();
    Ok(secs as i64)
}

/// Extended-format zsh history.
pub struct ZshHistory {
    path: PathBuf,
}

impl ZshHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl HistorySource for ZshHistory {
    fn key(&self) -> &'static str {
        "zsh_history"
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn load_commands(&self) -> io::Result<Vec<String>> {
        zsh::load_commands(&self.path)
    }

    fn load_tail(&self, n: usize) -> io::Result<Vec<String>> {
        zsh::load_tail(&self.path, n)
    }
}

/// Plain-line bash history.
pub struct BashHistory {
    path: PathBuf,
}

impl BashHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl HistorySource for BashHistory {
    fn key(&self) -> &'static str {
        "bash_history"
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn load_commands(&self) -> io::Result<Vec<String>> {
        let bytes = std::fs::read(&self.path)?;
        Ok(bytes
            .split(|&b| b == b'\n')
            .filter_map(|raw| std::str::from_utf8(raw).ok())
            .map(str::trim)
            // HISTTIMEFORMAT writes `#<epoch>` comment lines between commands.
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(String::from)
            .collect())
    }

    fn load_tail(&self, n: usize) -> io::Result<Vec<String>> {
        zsh::load_tail(&self.path, n)
    }
}

/// Pick the history source for the current environment.
///
/// Unknown shells fall back to zsh, matching the most common setup this
/// tool is integrated with. Returns `None` when `$HOME` cannot be
/// resolved; the affected predictors then run against an empty corpus.
pub fn source_for_env() -> Option<Box<dyn HistorySource>> {
    let home = dirs::home_dir()?;
    match detect_shell() {
        Shell::Bash => Some(Box::new(BashHistory::new(home.join(".bash_history")))),
        _ => Some(Box::new(ZshHistory::new(home.join(".zsh_history")))),
    }
}
