//! Connection pool and schema bootstrap.

use std::path::Path;

use linkcal_domain::Result;
use r2d2::PooledConnection;
use r2d2_sqlite::SqliteConnectionManager;

use crate::errors::InfraError;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS linked_accounts (
    id                  TEXT PRIMARY KEY,
    user_id             TEXT NOT NULL,
    provider            TEXT NOT NULL,
    email               TEXT NOT NULL,
    display_name        TEXT,
    color               TEXT,
    refresh_token       TEXT NOT NULL,
    last_synced         TEXT,
    webhook_channel_id  TEXT,
    webhook_resource_id TEXT,
    webhook_expiration  TEXT,
    created_at          TEXT NOT NULL,
    UNIQUE(user_id, email)
);

CREATE TABLE IF NOT EXISTS meetings (
    id                 TEXT PRIMARY KEY,
    user_id            TEXT NOT NULL,
    linked_account_id  TEXT NOT NULL REFERENCES linked_accounts(id) ON DELETE CASCADE,
    external_event_id  TEXT NOT NULL,
    provider           TEXT NOT NULL,
    name               TEXT NOT NULL,
    start_date         TEXT NOT NULL,
    end_date           TEXT NOT NULL,
    attendees          TEXT NOT NULL,
    location           TEXT NOT NULL,
    link               TEXT NOT NULL,
    message            TEXT NOT NULL,
    status             TEXT NOT NULL,
    created_at         TEXT NOT NULL,
    updated_at         TEXT NOT NULL,
    UNIQUE(external_event_id, provider, linked_account_id)
);

CREATE INDEX IF NOT EXISTS idx_meetings_account ON meetings(linked_account_id);
CREATE INDEX IF NOT EXISTS idx_accounts_channel ON linked_accounts(webhook_channel_id);
";

/// r2d2-backed SQLite pool that applies the schema on open and enforces
/// foreign keys on every connection.
#[derive(Clone)]
pub struct SqlitePool {
    inner: r2d2::Pool<SqliteConnectionManager>,
}

impl SqlitePool {
    /// Open (or create) the database at `path` and bootstrap the schema.
    pub fn open(path: &Path, pool_size: u32) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path)
            .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));

        let inner = r2d2::Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(|e| InfraError::from(e).0)?;

        let conn = inner.get().map_err(|e| InfraError::from(e).0)?;
        conn.execute_batch(SCHEMA).map_err(|e| InfraError::from(e).0)?;

        Ok(Self { inner })
    }

    pub fn get(&self) -> Result<PooledConnection<SqliteConnectionManager>> {
        self.inner.get().map_err(|e| InfraError::from(e).0)
    }
}
