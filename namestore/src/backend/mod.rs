//! Persistence backend contract and adapters.
//!
//! Each engine is reduced to four operations over transformed byte keys
//! (see [`crate::key::persistence_key`]). Prefix lookups rely on the
//! key-transform invariant: a name prefix search becomes a byte-prefix
//! scan.

use async_trait::async_trait;
#[cfg(feature = "lmdb")]
use chrono::DateTime;
use namestore_core::Timestamp;

use crate::error::StorageError;

#[cfg(feature = "lmdb")]
pub mod lmdb;
#[cfg(feature = "mongo")]
pub mod mongo;
#[cfg(feature = "sqlite")]
pub mod sqlite;

/// The four operations every persistent engine must provide.
///
/// `must_be_fresh` excludes entries whose stored expiration is at or before
/// now; entries stored without an expiration always qualify. Partial
/// failure of `put_batch` is engine-defined but must not corrupt entries
/// that were already applied.
#[async_trait]
pub trait PersistenceBackend: Send + Sync {
    /// Upsert one record by exact key.
    async fn put(
        &self,
        key: &[u8],
        packet: &[u8],
        expire_at: Option<Timestamp>,
    ) -> Result<(), StorageError>;

    /// Upsert many records. The three slices are parallel and equal-length.
    async fn put_batch(
        &self,
        keys: &[Vec<u8>],
        packets: &[Vec<u8>],
        expirations: &[Option<Timestamp>],
    ) -> Result<(), StorageError>;

    /// Exact or byte-prefix lookup.
    async fn get(
        &self,
        key: &[u8],
        can_be_prefix: bool,
        must_be_fresh: bool,
    ) -> Result<Option<Vec<u8>>, StorageError>;

    /// Delete by exact key. Returns `true` iff an entry existed.
    async fn remove(&self, key: &[u8]) -> Result<bool, StorageError>;
}

// Stored-value layout shared by the key-value adapters:
// [tag: 1 byte][expire_time_ms: 8 bytes LE, present iff tag == 1][packet]

#[cfg(feature = "lmdb")]
pub(crate) fn encode_stored_value(packet: &[u8], expire_at: Option<Timestamp>) -> Vec<u8> {
    match expire_at {
        Some(expire_at) => {
            let mut buf = Vec::with_capacity(9 + packet.len());
            buf.push(1);
            buf.extend_from_slice(&expire_at.timestamp_millis().to_le_bytes());
            buf.extend_from_slice(packet);
            buf
        }
        None => {
            let mut buf = Vec::with_capacity(1 + packet.len());
            buf.push(0);
            buf.extend_from_slice(packet);
            buf
        }
    }
}

#[cfg(feature = "lmdb")]
pub(crate) fn decode_stored_value(bytes: &[u8]) -> Option<(Option<Timestamp>, &[u8])> {
    match bytes.split_first()? {
        (0, packet) => Some((None, packet)),
        (1, rest) => {
            if rest.len() < 8 {
                return None;
            }
            let millis = i64::from_le_bytes(rest[..8].try_into().ok()?);
            Some((DateTime::from_timestamp_millis(millis), &rest[8..]))
        }
        _ => None,
    }
}

/// Freshness filter for adapters that judge expiry client-side: absent
/// expiry is always fresh.
#[cfg(feature = "lmdb")]
pub(crate) fn stored_entry_is_fresh(expire_at: Option<Timestamp>, now: Timestamp) -> bool {
    expire_at.map_or(true, |expire_at| expire_at > now)
}
