//! SQLite-backed store for subjects and everything that hangs off them.
//!
//! The database lives at `~/.subtrack/subtrack.db` and is the single source
//! of truth: five entity tables plus one trigger-maintained full-text index
//! (`unified_fts`). One long-lived connection, used synchronously; every
//! mutating call commits immediately.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use thiserror::Error;

use crate::migrations;

pub mod subjects;
pub mod agenda;
pub mod meetings;
pub mod actions;
pub mod notes;
pub mod search;

pub use actions::TimeframeEntry;
pub use search::{ContentType, SearchResult};

/// Errors surfaced by database operations.
///
/// Missing rows are not errors: by-id lookups return `Ok(None)`. A
/// `Sqlite` variant is a storage-fatal condition (I/O failure, corruption)
/// and is propagated, never retried.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("duplicate id `{id}` in {table}")]
    DuplicateId { table: &'static str, id: String },

    #[error(transparent)]
    Validation(#[from] crate::models::ValidationError),

    #[error("Home directory not found")]
    HomeDirNotFound,

    #[error("Failed to create database directory: {0}")]
    CreateDir(std::io::Error),

    #[error("Schema migration failed: {0}")]
    Migration(String),
}

/// SQLite connection wrapper owning all CRUD and derived queries.
///
/// Intentionally not `Clone` or `Sync`; a caller that needs shared access
/// holds it behind a mutex.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Borrow the underlying connection for ad-hoc queries.
    pub fn conn_ref(&self) -> &Connection {
        &self.conn
    }

    /// Open (or create) the database at `~/.subtrack/subtrack.db`.
    pub fn open() -> Result<Self, DbError> {
        let path = Self::db_path()?;
        Self::open_at(path)
    }

    /// Open a database at an explicit path.
    pub fn open_at(path: PathBuf) -> Result<Self, DbError> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(DbError::CreateDir)?;
            }
        }
        let conn = Connection::open(&path)?;

        // WAL for better concurrent read behavior against the single writer.
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        Self::init_schema(conn)
    }

    /// Open an ephemeral in-memory database. Nothing persists past `close`.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(conn)
    }

    /// Apply the baseline schema and additive migrations. Any failure here
    /// is fatal — partial-schema operation is not supported.
    fn init_schema(conn: Connection) -> Result<Self, DbError> {
        conn.execute_batch(include_str!("schema.sql"))?;
        migrations::run_migrations(&conn).map_err(DbError::Migration)?;
        log::debug!("schema ready");
        Ok(Self { conn })
    }

    /// Resolve the default database path: `~/.subtrack/subtrack.db`.
    fn db_path() -> Result<PathBuf, DbError> {
        let home = dirs::home_dir().ok_or(DbError::HomeDirNotFound)?;
        Ok(home.join(".subtrack").join("subtrack.db"))
    }

    /// Execute a closure within a transaction. Commits on Ok, rolls back on Err.
    pub fn with_transaction<F, T>(&self, f: F) -> Result<T, DbError>
    where
        F: FnOnce(&Self) -> Result<T, DbError>,
    {
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        match f(self) {
            Ok(val) => {
                self.conn.execute_batch("COMMIT")?;
                Ok(val)
            }
            Err(e) => {
                let _ = self.conn.execute_batch("ROLLBACK");
                Err(e)
            }
        }
    }

    /// Close the connection, releasing the storage file.
    pub fn close(self) -> Result<(), DbError> {
        self.conn.close().map_err(|(_, e)| DbError::Sqlite(e))
    }

    /// Map a primary-key collision on INSERT to `DuplicateId`; pass
    /// everything else through as storage errors.
    fn insert_error(e: rusqlite::Error, table: &'static str, id: &str) -> DbError {
        match e {
            rusqlite::Error::SqliteFailure(err, _)
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                DbError::DuplicateId {
                    table,
                    id: id.to_string(),
                }
            }
            other => DbError::Sqlite(other),
        }
    }

    /// Current time in the stored wire format.
    fn now_string() -> String {
        Utc::now().to_rfc3339()
    }
}

// =============================================================================
// Row-mapping helpers
// =============================================================================

/// Decode a stored RFC 3339 timestamp inside a `query_map` closure.
pub(crate) fn datetime_col(idx: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

pub(crate) fn opt_datetime_col(
    idx: usize,
    s: Option<String>,
) -> rusqlite::Result<Option<DateTime<Utc>>> {
    s.map(|s| datetime_col(idx, &s)).transpose()
}

/// Lift a model-boundary validation result (enum decode) into a row-mapping
/// error so `query_map` closures can use `?`.
pub(crate) fn enum_col<T>(
    idx: usize,
    res: Result<T, crate::models::ValidationError>,
) -> rusqlite::Result<T> {
    res.map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

// =============================================================================
// Shared test utilities
// =============================================================================


// =============================================================================
// Tests
// =============================================================================
