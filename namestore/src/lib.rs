//! Two-tier content store for named data.
//!
//! Packets are indexed by hierarchical [`Name`]s. The fast tier is an
//! in-memory name trie; the durable tier is a pluggable
//! [`PersistenceBackend`] (LMDB, SQLite, or MongoDB, behind feature
//! flags). [`PersistentStorage`] combines the two: writes are buffered in
//! the trie and flushed to the backend in periodic batches, reads search
//! the buffer first and fall through to the backend.
//!
//! Names cross into a backend through [`persistence_key`], which turns
//! name-prefix containment into byte-prefix containment so every engine
//! can answer prefix lookups with an ordinary range or pattern scan.
//!
//! ```no_run
//! use namestore::{Name, PersistentStorage, Storage, StoreConfig};
//! use namestore::backend::sqlite::SqliteBackend;
//! use std::time::Duration;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = SqliteBackend::open("store.db")?;
//! let config = StoreConfig::new().with_write_period(Duration::from_secs(10));
//! let store = PersistentStorage::open(backend, config)?;
//!
//! let name = Name::from_uri("/example/data")?;
//! # let packet: Vec<u8> = vec![];
//! store.put(&name, &packet).await?;
//! let found = store.get(&name, false, true).await?;
//! store.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod error;
pub mod key;
pub mod memory;
pub mod persistent;
pub mod store;
pub mod trie;

pub use backend::PersistenceBackend;
pub use error::StorageError;
pub use key::persistence_key;
pub use memory::MemoryStorage;
pub use persistent::{PersistentStorage, StoreConfig};
pub use store::Storage;
pub use trie::NameTrie;

pub use namestore_core::{
    encode_data, parse_data_metadata, CodecError, Component, DataMetadata, Name, Record, Timestamp,
};
