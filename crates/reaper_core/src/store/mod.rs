//! The embedded engine: committed state, the commit log and the writer slot.

mod lock;
mod state;

pub(crate) use state::EMPTY_NAMESPACE;
pub use state::{IndexRegion, Namespace, State};

use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::stats::{StoreCounters, StoreStats};
use crate::transaction::{ReadTransaction, WriteTransaction};
use crate::types::SequenceNumber;
use crate::wal::{LogOp, WalManager, WalRecord, WalRecordType};
use lock::StoreLock;
use parking_lot::{Mutex, RwLock};
use reaper_storage::{FileBackend, InMemoryBackend, StorageBackend};
use serde::Serialize;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Log sizes around a compaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Compaction {
    /// Log size before compaction.
    pub bytes_before: u64,
    /// Log size after compaction.
    pub bytes_after: u64,
}

/// Handle to an open store.
///
/// Cloning is cheap and every clone refers to the same store. Create one per
/// process and hand clones to the components that need it.
///
/// # Concurrency
///
/// - Readers take an immutable snapshot and never block.
/// - One write transaction at a time; a second writer waits.
/// - A commit is one log record, so a crash keeps all of it or none of it.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

pub(crate) struct StoreInner {
    config: Config,
    wal: WalManager,
    state: RwLock<Arc<State>>,
    write_lock: Mutex<()>,
    committed_seq: AtomicU64,
    pub(crate) counters: StoreCounters,
    _lock: Option<StoreLock>,
}

impl Store {
    /// Opens a file store with default configuration, creating it if missing.
    pub fn open(path: impl AsRef<Path>) -> CoreResult<Self> {
        Self::open_with_config(path, Config::default())
    }

    /// Opens a file store.
    ///
    /// Waits up to [`Config::lock_timeout`] for another process to release
    /// the store, then replays the commit log.
    ///
    /// # Errors
    ///
    /// - [`CoreError::StoreUnavailable`] if the file is missing and
    ///   `create_if_missing` is off, the lock times out, or the file cannot
    ///   be opened
    /// - [`CoreError::ChecksumMismatch`] or [`CoreError::WalCorruption`] if
    ///   the log is damaged
    pub fn open_with_config(path: impl AsRef<Path>, config: Config) -> CoreResult<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "opening store");

        if !config.create_if_missing && !path.exists() {
            return Err(CoreError::store_unavailable(format!(
                "store does not exist: {}",
                path.display()
            )));
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                CoreError::store_unavailable(format!("cannot create {}: {e}", parent.display()))
            })?;
        }

        let lock = StoreLock::acquire(path, config.lock_timeout)?;
        debug!(lock = %lock.path().display(), "acquired store lock");
        let backend = FileBackend::open(path).map_err(|e| {
            CoreError::store_unavailable(format!("cannot open {}: {e}", path.display()))
        })?;

        Self::recover(config, Box::new(backend), Some(lock))
    }

    /// Creates an empty store that lives only in memory.
    pub fn open_in_memory() -> CoreResult<Self> {
        Self::open_with_backend(Config::default(), Box::new(InMemoryBackend::new()))
    }

    /// Opens a store over any storage backend, replaying what it holds.
    pub fn open_with_backend(config: Config, backend: Box<dyn StorageBackend>) -> CoreResult<Self> {
        Self::recover(config, backend, None)
    }

    fn recover(
        config: Config,
        backend: Box<dyn StorageBackend>,
        lock: Option<StoreLock>,
    ) -> CoreResult<Self> {
        let wal = WalManager::new(backend, config.sync_on_commit);

        let mut state = State::default();
        let mut seq = SequenceNumber::new(0);
        let outcome = wal.replay(|offset, record| {
            match record.kind {
                WalRecordType::Snapshot => state = State::default(),
                WalRecordType::Commit if record.sequence != seq.next() => {
                    return Err(CoreError::wal_corruption(format!(
                        "record at offset {offset} has {}, expected {}",
                        record.sequence,
                        seq.next()
                    )));
                }
                WalRecordType::Commit => {}
            }
            for op in &record.ops {
                state.apply(op)?;
            }
            seq = record.sequence;
            Ok(())
        })?;

        if outcome.torn_bytes > 0 {
            warn!(
                torn_bytes = outcome.torn_bytes,
                valid_len = outcome.valid_len,
                "discarding torn commit record at end of log"
            );
            wal.truncate(outcome.valid_len)?;
        }

        debug!(
            records = outcome.records,
            namespaces = state.len(),
            committed_seq = seq.as_u64(),
            "store recovered"
        );

        Ok(Self {
            inner: Arc::new(StoreInner {
                config,
                wal,
                state: RwLock::new(Arc::new(state)),
                write_lock: Mutex::new(()),
                committed_seq: AtomicU64::new(seq.as_u64()),
                counters: StoreCounters::default(),
                _lock: lock,
            }),
        })
    }

    /// Takes a snapshot of the committed state.
    #[must_use]
    pub fn begin_read(&self) -> ReadTransaction {
        let state = self.inner.state.read();
        let sequence = SequenceNumber::new(self.inner.committed_seq.load(Ordering::Acquire));
        ReadTransaction::new(Arc::clone(&state), sequence)
    }

    /// Begins the write transaction, waiting for any active writer to finish.
    pub fn begin_write(&self) -> WriteTransaction<'_> {
        let guard = self.inner.write_lock.lock();
        let (working, snapshot_seq) = {
            let state = self.inner.state.read();
            let seq = SequenceNumber::new(self.inner.committed_seq.load(Ordering::Acquire));
            (State::clone(&state), seq)
        };
        WriteTransaction::new(&self.inner, guard, working, snapshot_seq)
    }

    /// Sequence number of the last commit.
    #[must_use]
    pub fn committed_seq(&self) -> SequenceNumber {
        SequenceNumber::new(self.inner.committed_seq.load(Ordering::Acquire))
    }

    /// Rewrites the commit log as a single snapshot of the committed state.
    ///
    /// Holds the writer slot for the duration. File stores write the new log
    /// to a sibling file and rename it over the old one.
    pub fn compact(&self) -> CoreResult<Compaction> {
        let _guard = self.inner.write_lock.lock();
        let bytes_before = self.inner.wal.size()?;

        let snapshot = Arc::clone(&self.inner.state.read());
        let record = WalRecord::snapshot(self.committed_seq(), snapshot.to_ops());
        let bytes_after = self.inner.wal.replace(&record)?;

        debug!(bytes_before, bytes_after, "compacted commit log");
        Ok(Compaction {
            bytes_before,
            bytes_after,
        })
    }

    /// Collects statistics for the committed state.
    pub fn stats(&self) -> CoreResult<StoreStats> {
        let snapshot = self.begin_read();
        Ok(StoreStats::collect(
            snapshot.state(),
            snapshot.sequence(),
            self.inner.wal.size()?,
            &self.inner.counters,
        ))
    }

    /// Current commit log size in bytes.
    pub fn log_size(&self) -> CoreResult<u64> {
        self.inner.wal.size()
    }

    pub(crate) fn inner(&self) -> &StoreInner {
        &self.inner
    }

    /// Returns the configuration the store was opened with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.inner.config
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("committed_seq", &self.committed_seq())
            .finish_non_exhaustive()
    }
}

impl StoreInner {
    /// Makes a finished write transaction durable and visible.
    ///
    /// The caller holds the writer slot.
    pub(crate) fn publish(&self, state: State, ops: Vec<LogOp>) -> CoreResult<SequenceNumber> {
        let current = SequenceNumber::new(self.committed_seq.load(Ordering::Acquire));
        if ops.is_empty() {
            return Ok(current);
        }

        let seq = current.next();
        let op_count = ops.len();
        let offset = self.wal.append(&WalRecord::commit(seq, ops))?;

        let mut published = self.state.write();
        *published = Arc::new(state);
        self.committed_seq.store(seq.as_u64(), Ordering::Release);
        drop(published);

        self.counters.record_commit();
        trace!(seq = seq.as_u64(), ops = op_count, offset, "committed");
        Ok(seq)
    }
}
