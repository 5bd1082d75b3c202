//! LMDB adapter (via heed): embedded ordered key-value engine.
//!
//! LMDB keeps keys in byte order, so a name-prefix lookup is a range scan
//! from the transformed key, cut off at the first key that no longer
//! starts with it. Batches run inside a single write transaction and are
//! therefore all-or-nothing.

use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};
use namestore_core::Timestamp;

use super::{decode_stored_value, encode_stored_value, stored_entry_is_fresh, PersistenceBackend};
use crate::error::StorageError;

/// Error type for LMDB backend operations.
#[derive(Debug, thiserror::Error)]
pub enum LmdbError {
    #[error("failed to open LMDB environment: {0}")]
    EnvOpen(String),

    #[error("failed to open database: {0}")]
    DbOpen(String),

    #[error("transaction error: {0}")]
    Transaction(String),

    #[error("stored value is corrupt")]
    CorruptValue,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<LmdbError> for StorageError {
    fn from(e: LmdbError) -> Self {
        StorageError::Backend {
            reason: e.to_string(),
        }
    }
}

/// LMDB-backed persistence engine.
pub struct LmdbBackend {
    env: Env,
    db: Database<Bytes, Bytes>,
}

impl LmdbBackend {
    /// Open (creating if missing) an LMDB environment at `path` with the
    /// given maximum map size.
    pub fn open<P: AsRef<Path>>(path: P, max_size_mb: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(&path)?;

        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(max_size_mb * 1024 * 1024)
                .max_dbs(1)
                .open(path.as_ref())
        }
        .map_err(|e| LmdbError::EnvOpen(e.to_string()))?;

        let mut wtxn = env
            .write_txn()
            .map_err(|e| LmdbError::Transaction(e.to_string()))?;
        let db: Database<Bytes, Bytes> = env
            .create_database(&mut wtxn, None)
            .map_err(|e| LmdbError::DbOpen(e.to_string()))?;
        wtxn.commit()
            .map_err(|e| LmdbError::Transaction(e.to_string()))?;

        Ok(Self { env, db })
    }
}

#[async_trait]
impl PersistenceBackend for LmdbBackend {
    async fn put(
        &self,
        key: &[u8],
        packet: &[u8],
        expire_at: Option<Timestamp>,
    ) -> Result<(), StorageError> {
        let value = encode_stored_value(packet, expire_at);
        let mut wtxn = self
            .env
            .write_txn()
            .map_err(|e| LmdbError::Transaction(e.to_string()))?;
        self.db
            .put(&mut wtxn, key, &value)
            .map_err(|e| LmdbError::Transaction(e.to_string()))?;
        wtxn.commit()
            .map_err(|e| LmdbError::Transaction(e.to_string()))?;
        Ok(())
    }

    async fn put_batch(
        &self,
        keys: &[Vec<u8>],
        packets: &[Vec<u8>],
        expirations: &[Option<Timestamp>],
    ) -> Result<(), StorageError> {
        let mut wtxn = self
            .env
            .write_txn()
            .map_err(|e| LmdbError::Transaction(e.to_string()))?;
        for ((key, packet), expire_at) in keys.iter().zip(packets).zip(expirations) {
            let value = encode_stored_value(packet, *expire_at);
            self.db
                .put(&mut wtxn, key, &value)
                .map_err(|e| LmdbError::Transaction(e.to_string()))?;
        }
        wtxn.commit()
            .map_err(|e| LmdbError::Transaction(e.to_string()))?;
        Ok(())
    }

    async fn get(
        &self,
        key: &[u8],
        can_be_prefix: bool,
        must_be_fresh: bool,
    ) -> Result<Option<Vec<u8>>, StorageError> {
        let now = Utc::now();
        let rtxn = self
            .env
            .read_txn()
            .map_err(|e| LmdbError::Transaction(e.to_string()))?;

        if !can_be_prefix {
            let stored = self
                .db
                .get(&rtxn, key)
                .map_err(|e| LmdbError::Transaction(e.to_string()))?;
            return match stored {
                Some(bytes) => {
                    let (expire_at, packet) =
                        decode_stored_value(bytes).ok_or(LmdbError::CorruptValue)?;
                    if !must_be_fresh || stored_entry_is_fresh(expire_at, now) {
                        Ok(Some(packet.to_vec()))
                    } else {
                        Ok(None)
                    }
                }
                None => Ok(None),
            };
        }

        let iter = self
            .db
            .prefix_iter(&rtxn, key)
            .map_err(|e| LmdbError::Transaction(e.to_string()))?;
        for entry in iter {
            let (_, bytes) = entry.map_err(|e| LmdbError::Transaction(e.to_string()))?;
            let (expire_at, packet) = decode_stored_value(bytes).ok_or(LmdbError::CorruptValue)?;
            if !must_be_fresh || stored_entry_is_fresh(expire_at, now) {
                return Ok(Some(packet.to_vec()));
            }
        }
        Ok(None)
    }

    async fn remove(&self, key: &[u8]) -> Result<bool, StorageError> {
        let mut wtxn = self
            .env
            .write_txn()
            .map_err(|e| LmdbError::Transaction(e.to_string()))?;
        let deleted = self
            .db
            .delete(&mut wtxn, key)
            .map_err(|e| LmdbError::Transaction(e.to_string()))?;
        wtxn.commit()
            .map_err(|e| LmdbError::Transaction(e.to_string()))?;
        Ok(deleted)
    }
}
