//! Volatile store: the name trie with no persistent tier.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use namestore_core::{Name, Record};

use crate::error::StorageError;
use crate::store::Storage;
use crate::trie::NameTrie;

/// Memory-only store. Expired entries are filtered on read, never purged.
///
/// Also serves as the hot tier inside [`PersistentStorage`]; standalone it
/// needs no initialization and never fails with backend errors.
///
/// [`PersistentStorage`]: crate::PersistentStorage
#[derive(Debug, Default)]
pub struct MemoryStorage {
    cache: Mutex<NameTrie<Record>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of buffered packets, expired ones included.
    pub fn len(&self) -> Result<usize, StorageError> {
        Ok(self.cache.lock().map_err(|_| StorageError::LockPoisoned)?.len())
    }

    pub fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn put(&self, name: &Name, packet: &[u8]) -> Result<(), StorageError> {
        let record = Record::from_packet(packet)?;
        self.cache
            .lock()
            .map_err(|_| StorageError::LockPoisoned)?
            .insert(name.clone(), record);
        Ok(())
    }

    async fn get(
        &self,
        name: &Name,
        can_be_prefix: bool,
        must_be_fresh: bool,
    ) -> Result<Option<Vec<u8>>, StorageError> {
        let now = Utc::now();
        let cache = self.cache.lock().map_err(|_| StorageError::LockPoisoned)?;
        if !can_be_prefix {
            return Ok(cache
                .get(name)
                .filter(|record| record.satisfies(must_be_fresh, now))
                .map(|record| record.packet.clone()));
        }
        for (_, record) in cache.prefix_iter(name) {
            if record.satisfies(must_be_fresh, now) {
                return Ok(Some(record.packet.clone()));
            }
        }
        Ok(None)
    }

    async fn remove(&self, name: &Name) -> Result<bool, StorageError> {
        Ok(self
            .cache
            .lock()
            .map_err(|_| StorageError::LockPoisoned)?
            .remove(name)
            .is_some())
    }
}
