//! The store contract shared by every variant.

use async_trait::async_trait;
use namestore_core::Name;

use crate::error::StorageError;

/// A content store keyed by hierarchical names.
///
/// Implementations differ in durability (memory-only vs persistent) but
/// share the same observable behavior: last write wins, lookup misses are
/// `Ok(None)`, and freshness is judged against the clock at read time.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Store an encoded Data packet under `name`. The packet's declared
    /// freshness period, if any, determines the record's expiry.
    async fn put(&self, name: &Name, packet: &[u8]) -> Result<(), StorageError>;

    /// Retrieve a packet.
    ///
    /// With `can_be_prefix`, any stored name that `name` is a prefix of
    /// matches and the first match in trie order is returned. With
    /// `must_be_fresh`, records whose expiry has passed are treated as
    /// absent; records without an expiry always qualify.
    async fn get(
        &self,
        name: &Name,
        can_be_prefix: bool,
        must_be_fresh: bool,
    ) -> Result<Option<Vec<u8>>, StorageError>;

    /// Remove the exact entry for `name` from every tier. Returns `true`
    /// iff any tier held it.
    async fn remove(&self, name: &Name) -> Result<bool, StorageError>;
}
