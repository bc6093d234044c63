//! SQLite-backed persistent store.
//!
//! Single owner of all durable state: command history plus its FTS
//! projection, shell aliases, per-source watermarks and embedding vectors.
//! One writer at a time is serialized through the connection mutex;
//! workers and predictors share the store behind an `Arc`.

mod error;
mod migrations;

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};

pub use error::StoreError;

/// Embedding dimension expected by the store. A deployment constant: the
/// save path rejects vectors of any other length rather than truncating.
pub const EMBEDDING_DIM: usize = 768;

/// Row caps for the query surface.
const PREFIX_LIMIT: usize = 20;
const FTS_LIMIT: usize = 20;
const ALIAS_LIMIT: usize = 10;

/// A shell alias as stored, `name` unique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasEntry {
    pub name: String,
    pub cmd: String,
}

/// The ghosttype store.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create the database at `path` and run pending migrations.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init()?;
        Ok(store)
    }

    fn init(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        migrations::apply(&conn)
    }

    /// Upsert a batch of commands, bumping `count` on re-observation.
    ///
    /// Runs in a single transaction; any row failure rolls the whole batch
    /// back. Idempotent per content hash: saving `[c, c, c]` leaves the
    /// same state as saving `[c]` three times.
    pub fn save_history(&self, entries: &[String]) -> Result<(), StoreError> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO history (command, hash, count) VALUES (?1, ?2, 1)
                 ON CONFLICT(hash) DO UPDATE SET count = count + 1",
            )?;
            for entry in entries {
                let cmd = entry.trim();
                if cmd.is_empty() {
                    continue;
                }
                stmt.execute(params![cmd, hash_command(cmd)])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Last processed mtime for a watermarked source, 0 if never synced.
    pub fn last_processed_mtime(&self, key: &str, path: &str) -> Result<i64, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mtime: Option<i64> = conn
            .query_row(
                "SELECT mtime FROM meta WHERE key = ?1 AND path = ?2",
                params![key, path],
                |row| row.get(0),
            )
            .optional()?;
        Ok(mtime.unwrap_or(0))
    }

    /// Record the watermark for a source, upserting by key.
    pub fn update_metadata(&self, key: &str, path: &str, mtime: i64) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO meta (key, path, mtime) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET
                 path = excluded.path,
                 mtime = excluded.mtime",
            params![key, path, mtime],
        )?;
        Ok(())
    }

    /// Upsert one alias. Stale aliases are overwritten, never deleted.
    pub fn upsert_alias(&self, name: &str, cmd: &str, updated_at: i64) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO aliases (name, cmd, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(name) DO UPDATE SET
                 cmd = excluded.cmd,
                 updated_at = excluded.updated_at",
            params![name, cmd, updated_at],
        )?;
        Ok(())
    }

    /// Up to 10 most-recently-updated aliases whose name starts with `prefix`.
    pub fn query_aliases(&self, prefix: &str) -> Result<Vec<AliasEntry>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT name, cmd FROM aliases
             WHERE name LIKE ?1 ESCAPE '\\'
             ORDER BY updated_at DESC
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(
            params![format!("{}%", escape_like(prefix)), ALIAS_LIMIT as i64],
            |row| {
                Ok(AliasEntry {
                    name: row.get(0)?,
                    cmd: row.get(1)?,
                })
            },
        )?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Up to 20 commands starting with `prefix`, most-used first.
    pub fn query_prefix(&self, prefix: &str) -> Result<Vec<(String, i64)>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT command, count FROM history
             WHERE command LIKE ?1 ESCAPE '\\'
             ORDER BY count DESC
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(
            params![format!("{}%", escape_like(prefix)), PREFIX_LIMIT as i64],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Up to 20 commands whose FTS projection matches `prefix*`, most-used
    /// first. Unlike [`query_prefix`](Self::query_prefix) this matches a
    /// whole-token prefix anywhere in the command, so `docker` finds both
    /// `docker run` and `sudo docker run`. An empty prefix matches nothing.
    pub fn query_fts(&self, prefix: &str) -> Result<Vec<(String, i64)>, StoreError> {
        let prefix = prefix.trim();
        if prefix.is_empty() {
            return Ok(Vec::new());
        }
        // Phrase-quote the prefix so FTS query operators in user input
        // cannot break the match expression.
        let match_expr = format!("\"{}\"*", prefix.replace('"', "\"\""));

        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT h.command, h.count
             FROM history_fts f
             JOIN history h ON h.id = f.rowid
             WHERE history_fts MATCH ?1
             ORDER BY h.count DESC
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![match_expr, FTS_LIMIT as i64], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Whether an embedding for `(source, text)` is already persisted.
    pub fn embedding_exists(&self, source: &str, text: &str) -> Result<bool, StoreError> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(1) FROM embeddings WHERE source = ?1 AND text = ?2",
            params![source, text],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Persist one embedding vector. Rejects vectors whose dimension is
    /// not [`EMBEDDING_DIM`] rather than truncating.
    pub fn embedding_save(
        &self,
        source: &str,
        text: &str,
        vector: &[f32],
    ) -> Result<(), StoreError> {
        if vector.len() != EMBEDDING_DIM {
            return Err(StoreError::Dimension {
                expected: EMBEDDING_DIM,
                actual: vector.len(),
            });
        }
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO embeddings (source, text, vec) VALUES (?1, ?2, ?3)",
            params![source, text, vector_to_blob(vector)],
        )?;
        Ok(())
    }

    /// Cosine top-K over the stored vectors of `source`.
    ///
    /// Scores are cosine similarity (`1 - cosine_distance`); results below
    /// `threshold` are dropped.
    pub fn embedding_search(
        &self,
        vector: &[f32],
        source: &str,
        top_k: usize,
        threshold: f64,
    ) -> Result<Vec<(String, f64)>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT text, vec FROM embeddings WHERE source = ?1 ORDER BY id")?;
        let rows = stmt.query_map(params![source], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, Vec<u8>>(1)?))
        })?;

        let mut scored: Vec<(String, f64)> = Vec::new();
        for row in rows {
            let (text, blob) = row?;
            let Some(stored) = blob_to_vector(&blob) else {
                continue;
            };
            if stored.len() != vector.len() {
                continue;
            }
            let score = cosine_similarity(vector, &stored) as f64;
            if score >= threshold {
                scored.push((text, score));
            }
        }
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        Ok(scored)
    }
}

/// Content hash used as the history dedup key.
pub fn hash_command(cmd: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(cmd.as_bytes());
    hex::encode(hasher.finalize())
}

/// Escape `%`, `_` and `\` so user input is literal inside a LIKE pattern.
fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn vector_to_blob(vector: &[f32]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(vector.len() * 4);
    for value in vector {
        blob.extend_from_slice(&value.to_le_bytes());
    }
    blob
}

fn blob_to_vector(blob: &[u8]) -> Option<Vec<f32>> {
    if blob.len() % 4 != 0 {
        return None;
    }
    Some(
        blob.chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect(),
    )
}

/// Cosine similarity in [-1, 1]; 0 when either vector has zero norm.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}
