//! Extended-zsh history parsing.
//!
//! Handles the `": <timestamp>:<duration>;command"` EXTENDED_HISTORY
//! format, backslash line continuations and blank-line termination. A
//! pending continuation is always flushed at EOF.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

/// Block size for the backward tail reader.
const TAIL_BLOCK_SIZE: u64 = 4096;

/// If `line` carries an extended-history prefix (`": <digits>:<digits>;"`),
/// return the command body after the first `;`.
fn extended_body(line: &str) -> Option<&str> {
    let rest = line.strip_prefix(": ")?;
    let (timestamp, rest) = rest.split_once(':')?;
    let (duration, body) = rest.split_once(';')?;
    if timestamp.is_empty() || !timestamp.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if duration.is_empty() || !duration.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(body)
}

/// Parse history lines into one string per command, in original order.
pub fn parse_extended_history<'a, I>(lines: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut commands = Vec::new();
    let mut current = String::new();

    let mut flush = |current: &mut String, commands: &mut Vec<String>| {
        if !current.is_empty() {
            commands.push(current.trim().to_string());
            current.clear();
        }
    };

    for line in lines {
        // Blank line terminates any pending continuation.
        if line.trim().is_empty() {
            flush(&mut current, &mut commands);
            continue;
        }

        // An extended-history prefix introduces a new command.
        let line = match extended_body(line) {
            Some(body) => {
                flush(&mut current, &mut commands);
                body
            }
            None => line,
        };

        // A trailing backslash continues onto the next line.
        if let Some(stripped) = line.strip_suffix('\\') {
            current.push_str(stripped.trim());
            current.push(' ');
            continue;
        }

        current.push_str(line);
        flush(&mut current, &mut commands);
    }

    // EOF flushes whatever continuation is still pending.
    flush(&mut current, &mut commands);

    commands
}

/// Load and parse a full zsh history file.
///
/// Lines that are not valid UTF-8 are skipped.
pub fn load_commands(path: &Path) -> io::Result<Vec<String>> {
    let bytes = std::fs::read(path)?;
    let lines = bytes
        .split(|&b| b == b'\n')
        .filter_map(|raw| std::str::from_utf8(raw).ok());
    Ok(parse_extended_history(lines))
}

/// Noise filter applied before persistence.
pub fn is_valid_command(line: &str) -> bool {
    let trimmed = line.trim();

    if trimmed.len() < 3 || trimmed.len() > 500 {
        return false;
    }

    // A lone flag, key=value pair or deep path is not a command.
    let fields: Vec<&str> = trimmed.split_whitespace().collect();
    if fields.len() == 1 {
        let first = fields[0];
        if first.starts_with('-') {
            return false;
        }
        if first.matches('/').count() > 2 || first.contains('=') {
            return false;
        }
    }

    // JSON fragments and interrupted heredoc-style input.
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return false;
    }
    if trimmed.ends_with(':') {
        return false;
    }

    true
}

/// Trim, filter and collect the commands worth persisting.
pub fn filter_commands<I>(commands: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    commands
        .into_iter()
        .map(|cmd| cmd.trim().to_string())
        .filter(|cmd| is_valid_command(cmd))
        .collect()
}

/// Strip an extended-history prefix from a raw line, if present.
///
/// Returns `None` for malformed extended lines (prefix but no `;`).
fn clean_line(line: &str) -> Option<String> {
    let trimmed = line.trim();
    if trimmed.starts_with(": ") {
        let (_, body) = trimmed.split_once(';')?;
        return Some(body.trim().to_string());
    }
    Some(trimmed.to_string())
}

/// Read the last `max_lines` commands without scanning the whole file.
///
/// Walks the file backward in 4 KiB blocks, splits on newlines, cleans
/// each line and returns the result in chronological order. Continuation
/// joining is not applied on this fast path.
pub fn load_tail(path: &Path, max_lines: usize) -> io::Result<Vec<String>> {
    let mut file = File::open(path)?;
    let size = file.metadata()?.len();

    let mut buf: Vec<u8> = Vec::new();
    let mut offset = size;
    let mut newlines = 0usize;

    while offset > 0 && newlines <= max_lines {
        let block = TAIL_BLOCK_SIZE.min(offset);
        offset -= block;

        let mut chunk = vec![0u8; block as usize];
        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(&mut chunk)?;

        newlines += chunk.iter().filter(|&&b| b == b'\n').count();
        chunk.extend_from_slice(&buf);
        buf = chunk;
    }

    let mut lines: Vec<String> = Vec::new();
    for raw in buf.split(|&b| b == b'\n').rev() {
        if lines.len() >= max_lines {
            break;
        }
        // The first (partial) line of the oldest block is unreliable when
        // we stopped mid-file; it is cut off by the line cap anyway.
        let Ok(text) = std::str::from_utf8(raw) else {
            continue;
        };
        match clean_line(text) {
            Some(cleaned) if !cleaned.is_empty() => lines.push(cleaned),
            _ => {}
        }
    }

    lines.reverse();
    Ok(lines)
}
