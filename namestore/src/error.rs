//! Error types for store operations.

use namestore_core::CodecError;
use thiserror::Error;

/// Storage layer errors.
///
/// Lookup misses are not errors: `get` returns `Ok(None)` and `remove`
/// returns `Ok(false)` when nothing matches.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    /// An operation was invoked before [`initialize`] completed, or after
    /// the store was closed.
    ///
    /// [`initialize`]: crate::PersistentStorage::initialize
    #[error("storage is not initialized")]
    Uninitialized,

    /// [`initialize`] was invoked on an already-initialized store.
    ///
    /// [`initialize`]: crate::PersistentStorage::initialize
    #[error("storage was initialized more than once")]
    AlreadyInitialized,

    /// The buffer lock was poisoned by a panicking writer.
    #[error("storage buffer lock poisoned")]
    LockPoisoned,

    /// The packet or name could not be decoded.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// A persistence backend failed.
    #[error("backend error: {reason}")]
    Backend { reason: String },
}
