//! SQLite adapter: a three-column table keyed by the transformed name.
//!
//! Prefix search uses a `hex(key) LIKE ?` predicate over the hex-encoded
//! key, ordered by key so the scan order matches the key-value adapters.
//! Batches run inside one explicit transaction.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use namestore_core::Timestamp;
use rusqlite::{params, Connection, OptionalExtension};

use super::PersistenceBackend;
use crate::error::StorageError;

/// Error type for SQLite backend operations.
#[derive(Debug, thiserror::Error)]
pub enum SqliteError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("connection lock poisoned")]
    LockPoisoned,
}

impl From<SqliteError> for StorageError {
    fn from(e: SqliteError) -> Self {
        match e {
            SqliteError::LockPoisoned => StorageError::LockPoisoned,
            other => StorageError::Backend {
                reason: other.to_string(),
            },
        }
    }
}

/// SQLite-backed persistence engine.
pub struct SqliteBackend {
    conn: Mutex<Connection>,
}

impl SqliteBackend {
    /// Open (creating if missing) the database file at `path`, along with
    /// any missing parent directories, and ensure the schema exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SqliteError> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS data (
                key BLOB PRIMARY KEY,
                value BLOB,
                expire_time_ms INTEGER
            )",
            [],
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database, mainly useful for tests.
    pub fn open_in_memory() -> Result<Self, SqliteError> {
        let conn = Connection::open_in_memory()?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS data (
                key BLOB PRIMARY KEY,
                value BLOB,
                expire_time_ms INTEGER
            )",
            [],
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

fn expire_millis(expire_at: Option<Timestamp>) -> Option<i64> {
    expire_at.map(|t| t.timestamp_millis())
}

#[async_trait]
impl PersistenceBackend for SqliteBackend {
    async fn put(
        &self,
        key: &[u8],
        packet: &[u8],
        expire_at: Option<Timestamp>,
    ) -> Result<(), StorageError> {
        let conn = self.conn.lock().map_err(|_| SqliteError::LockPoisoned)?;
        conn.execute(
            "INSERT OR REPLACE INTO data (key, value, expire_time_ms) VALUES (?1, ?2, ?3)",
            params![key, packet, expire_millis(expire_at)],
        )
        .map_err(SqliteError::from)?;
        Ok(())
    }

    async fn put_batch(
        &self,
        keys: &[Vec<u8>],
        packets: &[Vec<u8>],
        expirations: &[Option<Timestamp>],
    ) -> Result<(), StorageError> {
        let mut conn = self.conn.lock().map_err(|_| SqliteError::LockPoisoned)?;
        let tx = conn.transaction().map_err(SqliteError::from)?;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT OR REPLACE INTO data (key, value, expire_time_ms) VALUES (?1, ?2, ?3)",
                )
                .map_err(SqliteError::from)?;
            for ((key, packet), expire_at) in keys.iter().zip(packets).zip(expirations) {
                stmt.execute(params![key, packet, expire_millis(*expire_at)])
                    .map_err(SqliteError::from)?;
            }
        }
        tx.commit().map_err(SqliteError::from)?;
        Ok(())
    }

    async fn get(
        &self,
        key: &[u8],
        can_be_prefix: bool,
        must_be_fresh: bool,
    ) -> Result<Option<Vec<u8>>, StorageError> {
        let now = Utc::now().timestamp_millis();
        let conn = self.conn.lock().map_err(|_| SqliteError::LockPoisoned)?;

        // sqlite's hex() is uppercase
        let result = match (can_be_prefix, must_be_fresh) {
            (false, false) => conn
                .query_row(
                    "SELECT value FROM data WHERE key = ?1",
                    params![key],
                    |row| row.get(0),
                )
                .optional(),
            (false, true) => conn
                .query_row(
                    "SELECT value FROM data WHERE key = ?1
                     AND (expire_time_ms IS NULL OR expire_time_ms > ?2)",
                    params![key, now],
                    |row| row.get(0),
                )
                .optional(),
            (true, false) => conn
                .query_row(
                    "SELECT value FROM data WHERE hex(key) LIKE ?1
                     ORDER BY key LIMIT 1",
                    params![format!("{}%", hex::encode_upper(key))],
                    |row| row.get(0),
                )
                .optional(),
            (true, true) => conn
                .query_row(
                    "SELECT value FROM data WHERE hex(key) LIKE ?1
                     AND (expire_time_ms IS NULL OR expire_time_ms > ?2)
                     ORDER BY key LIMIT 1",
                    params![format!("{}%", hex::encode_upper(key)), now],
                    |row| row.get(0),
                )
                .optional(),
        };
        result.map_err(|e| SqliteError::from(e).into())
    }

    async fn remove(&self, key: &[u8]) -> Result<bool, StorageError> {
        let conn = self.conn.lock().map_err(|_| SqliteError::LockPoisoned)?;
        let removed = conn
            .execute("DELETE FROM data WHERE key = ?1", params![key])
            .map_err(SqliteError::from)?;
        Ok(removed > 0)
    }
}
