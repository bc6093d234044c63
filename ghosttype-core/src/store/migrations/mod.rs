//! Store schema migrations.
//!
//! The schema version lives in SQLite's `user_version` pragma. [`apply`]
//! runs every migration newer than the connection's current version, in
//! order, bumping the pragma as each one lands. A fresh database and an
//! already-migrated one therefore converge on the same shape no matter
//! how many times it runs, and a crash between migrations resumes where
//! it stopped.

use rusqlite::Connection;

use super::StoreError;

/// One versioned schema step.
struct Migration {
    version: i32,
    name: &'static str,
    sql: &'static str,
}

/// All migrations, ascending by version.
static MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "initial",
        sql: include_str!("v001_initial.sql"),
    },
    Migration {
        version: 2,
        name: "fts",
        sql: include_str!("v002_fts.sql"),
    },
];

/// The version a fully migrated store reports.
pub fn latest_version() -> i32 {
    MIGRATIONS.last().map(|m| m.version).unwrap_or(0)
}

/// Read the connection's schema version.
pub fn schema_version(conn: &Connection) -> Result<i32, StoreError> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}

/// Bring the connection up to [`latest_version`].
pub fn apply(conn: &Connection) -> Result<(), StoreError> {
    let current = schema_version(conn)?;

    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        tracing::info!(
            version = migration.version,
            name = migration.name,
            "applying store migration"
        );
        conn.execute_batch(migration.sql).map_err(|e| {
            StoreError::Migration(format!("{} (v{}): {e}", migration.name, migration.version))
        })?;
        conn.pragma_update(None, "user_version", migration.version)?;
    }

    Ok(())
}
