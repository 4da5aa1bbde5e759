pub mod queries;

use anyhow::Context;
use rusqlite::Connection;

/// Storage scope for a key, mirroring the persistent vs session-scoped split
/// of the original key-value storage. Session rows do not survive a restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Persistent,
    Session,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Persistent => "persistent",
            Scope::Session => "session",
        }
    }
}

pub fn init_db(path: &str) -> anyhow::Result<Connection> {
    let conn = Connection::open(path).context("failed to open store")?;

    conn.execute_batch("PRAGMA journal_mode=WAL;")
        .context("failed to set store pragmas")?;

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS kv (
            scope TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope, key)
        );",
    )
    .context("failed to create kv table")?;

    // Session-scoped entries belong to the previous run.
    conn.execute("DELETE FROM kv WHERE scope = ?1", [Scope::Session.as_str()])
        .context("failed to clear session scope")?;

    Ok(conn)
}
