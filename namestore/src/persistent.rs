//! Persistent store coordinator: buffer-vs-backend routing and the
//! periodic write-back task.
//!
//! With buffering enabled, writes land only in the in-memory trie and
//! become durable at the next write-back cycle; reads search the buffer
//! first and fall through to the backend under the transformed key. With
//! buffering disabled (`write_period == 0`) every operation goes straight
//! to the backend.
//!
//! The drain-and-replace step of a write-back cycle runs entirely inside
//! one critical section, so no reader or writer can observe a partially
//! drained buffer and no write can land between the drain and the install
//! of the fresh buffer. The batch write to the backend happens after the
//! lock is released; writes arriving during backend I/O land in the new
//! buffer and are picked up by the next cycle.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use namestore_core::{Name, Record};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::backend::PersistenceBackend;
use crate::error::StorageError;
use crate::key::persistence_key;
use crate::store::Storage;
use crate::trie::NameTrie;

/// Configuration for a [`PersistentStorage`].
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Interval between write-back cycles. [`Duration::ZERO`] disables
    /// buffering entirely: writes go synchronously to the backend and no
    /// flush task is started.
    pub write_period: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            write_period: Duration::from_secs(10),
        }
    }
}

impl StoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_write_period(mut self, write_period: Duration) -> Self {
        self.write_period = write_period;
        self
    }
}

const STATE_NEW: u8 = 0;
const STATE_OPEN: u8 = 1;
const STATE_CLOSED: u8 = 2;

struct FlushTask {
    handle: JoinHandle<()>,
    shutdown: watch::Sender<bool>,
}

/// A two-tier store: in-memory trie buffer over a persistent backend.
///
/// The lifecycle is explicit: construction is inert, [`initialize`] starts
/// the write-back task, and [`close`] stops it deterministically, letting
/// an in-flight cycle run to completion and flushing whatever the buffer
/// still holds. Operations before [`initialize`] or after [`close`] fail
/// with [`StorageError::Uninitialized`]; a second [`initialize`] fails with
/// [`StorageError::AlreadyInitialized`].
///
/// [`initialize`]: PersistentStorage::initialize
/// [`close`]: PersistentStorage::close
pub struct PersistentStorage<B: PersistenceBackend + 'static> {
    backend: Arc<B>,
    buffer: Arc<Mutex<NameTrie<Record>>>,
    config: StoreConfig,
    state: AtomicU8,
    flush_task: Mutex<Option<FlushTask>>,
}

impl<B: PersistenceBackend + 'static> PersistentStorage<B> {
    /// Create a store without initializing it. The backend handle is owned
    /// by this store for its lifetime.
    pub fn new(backend: B, config: StoreConfig) -> Self {
        Self {
            backend: Arc::new(backend),
            buffer: Arc::new(Mutex::new(NameTrie::new())),
            config,
            state: AtomicU8::new(STATE_NEW),
            flush_task: Mutex::new(None),
        }
    }

    /// Create and immediately initialize a store. Must be called from
    /// within a tokio runtime when buffering is enabled.
    pub fn open(backend: B, config: StoreConfig) -> Result<Self, StorageError> {
        let store = Self::new(backend, config);
        store.initialize()?;
        Ok(store)
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn buffering_enabled(&self) -> bool {
        !self.config.write_period.is_zero()
    }

    fn ensure_open(&self) -> Result<(), StorageError> {
        if self.state.load(Ordering::Acquire) == STATE_OPEN {
            Ok(())
        } else {
            Err(StorageError::Uninitialized)
        }
    }

    /// Start the store, spawning the periodic write-back task when
    /// buffering is enabled.
    pub fn initialize(&self) -> Result<(), StorageError> {
        if self
            .state
            .compare_exchange(STATE_NEW, STATE_OPEN, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(StorageError::AlreadyInitialized);
        }
        if self.buffering_enabled() {
            let (shutdown, shutdown_rx) = watch::channel(false);
            let handle = spawn_flush_loop(
                Arc::clone(&self.buffer),
                Arc::clone(&self.backend),
                self.config.write_period,
                shutdown_rx,
            );
            *self
                .flush_task
                .lock()
                .map_err(|_| StorageError::LockPoisoned)? = Some(FlushTask { handle, shutdown });
            debug!(write_period_ms = self.config.write_period.as_millis() as u64,
                "started periodic write-back task");
        }
        Ok(())
    }

    /// Drain the buffer and submit one batch write to the backend. A no-op
    /// when the buffer is empty.
    pub async fn flush(&self) -> Result<(), StorageError> {
        self.ensure_open()?;
        write_back(&self.buffer, self.backend.as_ref()).await
    }

    /// Stop the store: signal the write-back task, wait for any in-flight
    /// cycle to finish, then flush whatever the buffer still holds. After
    /// `close` every operation fails with [`StorageError::Uninitialized`].
    pub async fn close(&self) -> Result<(), StorageError> {
        if self
            .state
            .compare_exchange(STATE_OPEN, STATE_CLOSED, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(StorageError::Uninitialized);
        }
        let task = self
            .flush_task
            .lock()
            .map_err(|_| StorageError::LockPoisoned)?
            .take();
        if let Some(task) = task {
            // Observed only at the inter-flush wait point; an in-flight
            // cycle runs to completion before the task exits.
            let _ = task.shutdown.send(true);
            if task.handle.await.is_err() {
                warn!("write-back task panicked before shutdown");
            }
        }
        write_back(&self.buffer, self.backend.as_ref()).await
    }
}

impl<B: PersistenceBackend + 'static> Drop for PersistentStorage<B> {
    fn drop(&mut self) {
        // Fallback for stores dropped without close(): unblock the task so
        // it exits at its next wait point. Buffered packets not yet written
        // back are lost on this path.
        if let Ok(mut task) = self.flush_task.lock() {
            if let Some(task) = task.take() {
                let _ = task.shutdown.send(true);
            }
        }
    }
}

#[async_trait]
impl<B: PersistenceBackend + 'static> Storage for PersistentStorage<B> {
    async fn put(&self, name: &Name, packet: &[u8]) -> Result<(), StorageError> {
        self.ensure_open()?;
        let record = Record::from_packet(packet)?;
        if self.buffering_enabled() {
            self.buffer
                .lock()
                .map_err(|_| StorageError::LockPoisoned)?
                .insert(name.clone(), record);
            Ok(())
        } else {
            let key = persistence_key(name)?;
            self.backend.put(&key, &record.packet, record.expire_at).await
        }
    }

    async fn get(
        &self,
        name: &Name,
        can_be_prefix: bool,
        must_be_fresh: bool,
    ) -> Result<Option<Vec<u8>>, StorageError> {
        self.ensure_open()?;
        if self.buffering_enabled() {
            let now = Utc::now();
            let buffer = self.buffer.lock().map_err(|_| StorageError::LockPoisoned)?;
            if !can_be_prefix {
                if let Some(record) = buffer.get(name) {
                    if record.satisfies(must_be_fresh, now) {
                        return Ok(Some(record.packet.clone()));
                    }
                }
            } else {
                for (_, record) in buffer.prefix_iter(name) {
                    if record.satisfies(must_be_fresh, now) {
                        return Ok(Some(record.packet.clone()));
                    }
                }
            }
        }
        let key = persistence_key(name)?;
        self.backend.get(&key, can_be_prefix, must_be_fresh).await
    }

    async fn remove(&self, name: &Name) -> Result<bool, StorageError> {
        self.ensure_open()?;
        let mut removed = false;
        if self.buffering_enabled() {
            removed = self
                .buffer
                .lock()
                .map_err(|_| StorageError::LockPoisoned)?
                .remove(name)
                .is_some();
        }
        let key = persistence_key(name)?;
        if self.backend.remove(&key).await? {
            removed = true;
        }
        Ok(removed)
    }
}

/// One write-back cycle: drain the buffer under the lock, then submit the
/// drained entries as a single batch. The buffer is empty and accepting
/// new writes before the batch write begins.
async fn write_back<B: PersistenceBackend>(
    buffer: &Mutex<NameTrie<Record>>,
    backend: &B,
) -> Result<(), StorageError> {
    let drained = buffer
        .lock()
        .map_err(|_| StorageError::LockPoisoned)?
        .drain();
    if drained.is_empty() {
        return Ok(());
    }

    let mut keys = Vec::with_capacity(drained.len());
    let mut packets = Vec::with_capacity(drained.len());
    let mut expirations = Vec::with_capacity(drained.len());
    for (name, record) in drained {
        keys.push(persistence_key(&name)?);
        packets.push(record.packet);
        expirations.push(record.expire_at);
    }
    backend.put_batch(&keys, &packets, &expirations).await
}

fn spawn_flush_loop<B: PersistenceBackend + 'static>(
    buffer: Arc<Mutex<NameTrie<Record>>>,
    backend: Arc<B>,
    write_period: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if let Err(err) = write_back(&buffer, backend.as_ref()).await {
                // Drained-but-unwritten entries of this cycle are lost; the
                // loop keeps running so later writes still reach the
                // backend.
                error!(error = %err, "write-back cycle failed");
            }
            tokio::select! {
                _ = tokio::time::sleep(write_period) => {}
                _ = shutdown.changed() => break,
            }
        }
    })
}
