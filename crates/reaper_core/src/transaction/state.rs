//! Transaction state.

use crate::error::CoreResult;
use crate::store::{Namespace, State, StoreInner, EMPTY_NAMESPACE};
use crate::types::{Partition, SequenceNumber};
use crate::wal::LogOp;
use parking_lot::MutexGuard;
use reaper_codec::Document;
use std::sync::Arc;

/// A read-only snapshot of committed state.
///
/// Later commits are not visible through it, and holding it never blocks
/// the writer.
#[derive(Debug, Clone)]
pub struct ReadTransaction {
    snapshot: Arc<State>,
    sequence: SequenceNumber,
}

impl ReadTransaction {
    pub(crate) fn new(snapshot: Arc<State>, sequence: SequenceNumber) -> Self {
        Self { snapshot, sequence }
    }

    /// Sequence number the snapshot was taken at.
    #[must_use]
    pub fn sequence(&self) -> SequenceNumber {
        self.sequence
    }

    /// The whole snapshot.
    #[must_use]
    pub fn state(&self) -> &State {
        &self.snapshot
    }

    /// Returns a user's namespace in a partition.
    #[must_use]
    pub fn namespace(&self, partition: Partition, user: &str) -> Option<&Namespace> {
        self.snapshot.namespace(partition, user)
    }
}

/// The active write transaction.
///
/// Mutations are applied to a private copy of the state and recorded as log
/// ops. [`commit`](Self::commit) appends them as one record and publishes the
/// copy; dropping the transaction discards both.
pub struct WriteTransaction<'a> {
    store: &'a StoreInner,
    _guard: MutexGuard<'a, ()>,
    working: State,
    ops: Vec<LogOp>,
    snapshot_seq: SequenceNumber,
    finished: bool,
}

impl<'a> WriteTransaction<'a> {
    pub(crate) fn new(
        store: &'a StoreInner,
        guard: MutexGuard<'a, ()>,
        working: State,
        snapshot_seq: SequenceNumber,
    ) -> Self {
        Self {
            store,
            _guard: guard,
            working,
            ops: Vec::new(),
            snapshot_seq,
            finished: false,
        }
    }

    /// Sequence number of the state this transaction started from.
    #[must_use]
    pub fn snapshot_seq(&self) -> SequenceNumber {
        self.snapshot_seq
    }

    /// Working state, including this transaction's own writes.
    #[must_use]
    pub fn state(&self) -> &State {
        &self.working
    }

    /// Returns a namespace as this transaction sees it.
    #[must_use]
    pub fn namespace(&self, partition: Partition, user: &str) -> Option<&Namespace> {
        self.working.namespace(partition, user)
    }

    /// Number of buffered mutations.
    #[must_use]
    pub fn pending_ops(&self) -> usize {
        self.ops.len()
    }

    /// Applies a mutation to the working state and buffers it for commit.
    ///
    /// # Errors
    ///
    /// Fails if the op targets a namespace or index that does not exist.
    pub fn apply(&mut self, op: LogOp) -> CoreResult<()> {
        self.working.apply(&op)?;
        self.ops.push(op);
        Ok(())
    }

    /// Creates a namespace unless it already exists.
    pub fn create_namespace(&mut self, partition: Partition, user: &str) -> CoreResult<()> {
        if self.working.namespace(partition, user).is_some() {
            return Ok(());
        }
        self.apply(LogOp::CreateNamespace {
            partition,
            user: user.to_owned(),
        })
    }

    /// Commits the transaction.
    ///
    /// Returns the new sequence number, or the current one if nothing was
    /// written.
    ///
    /// # Errors
    ///
    /// Returns an error if the log append fails; nothing becomes visible then.
    pub fn commit(mut self) -> CoreResult<SequenceNumber> {
        self.finished = true;
        let working = std::mem::take(&mut self.working);
        let ops = std::mem::take(&mut self.ops);
        let result = self.store.publish(working, ops);
        if result.is_err() {
            self.store.counters.record_abort();
        }
        result
    }

    /// Discards the transaction.
    pub fn abort(self) {}
}

impl Drop for WriteTransaction<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.store.counters.record_abort();
        }
    }
}

/// Write access to one user namespace inside a write transaction.
///
/// Handed to [`TransactionManager::update`](crate::TransactionManager::update)
/// closures. The namespace always exists while a writer is alive.
pub struct NamespaceWriter<'t, 'a> {
    txn: &'t mut WriteTransaction<'a>,
    partition: Partition,
    user: &'t str,
}

impl<'t, 'a> NamespaceWriter<'t, 'a> {
    pub(crate) fn new(
        txn: &'t mut WriteTransaction<'a>,
        partition: Partition,
        user: &'t str,
    ) -> Self {
        Self {
            txn,
            partition,
            user,
        }
    }

    /// Partition being written.
    #[must_use]
    pub fn partition(&self) -> Partition {
        self.partition
    }

    /// User owning the namespace.
    #[must_use]
    pub fn user(&self) -> &str {
        self.user
    }

    /// The namespace, including writes made so far.
    #[must_use]
    pub fn namespace(&self) -> &Namespace {
        self.txn
            .namespace(self.partition, self.user)
            .unwrap_or(&EMPTY_NAMESPACE)
    }

    /// Decodes the record under `key`.
    pub fn get_document<T: Document>(&self, key: &str) -> CoreResult<Option<T>> {
        self.namespace().get_document(key)
    }

    /// Looks up a key in an index.
    #[must_use]
    pub fn index_lookup(&self, index: &str, key: &[u8]) -> Option<&str> {
        self.namespace().index_lookup(index, key)
    }

    /// Writes raw record bytes.
    pub fn put(&mut self, key: &str, value: Vec<u8>) -> CoreResult<()> {
        let op = LogOp::PutRecord {
            partition: self.partition,
            user: self.user.to_owned(),
            key: key.to_owned(),
            value,
        };
        self.txn.apply(op)
    }

    /// Encodes and writes a record.
    pub fn put_document<T: Document>(&mut self, key: &str, document: &T) -> CoreResult<()> {
        let value = document.encode()?;
        self.put(key, value)
    }

    /// Deletes a record.
    pub fn delete(&mut self, key: &str) -> CoreResult<()> {
        let op = LogOp::DeleteRecord {
            partition: self.partition,
            user: self.user.to_owned(),
            key: key.to_owned(),
        };
        self.txn.apply(op)
    }

    /// Creates an index region unless it already exists.
    pub fn create_index(&mut self, index: &str) -> CoreResult<()> {
        if self.namespace().index(index).is_some() {
            return Ok(());
        }
        let op = LogOp::CreateIndex {
            partition: self.partition,
            user: self.user.to_owned(),
            index: index.to_owned(),
        };
        self.txn.apply(op)
    }

    /// Points an index key at a record, creating the index if needed.
    pub fn put_index_entry(&mut self, index: &str, key: &[u8], target: &str) -> CoreResult<()> {
        self.create_index(index)?;
        let op = LogOp::PutIndexEntry {
            partition: self.partition,
            user: self.user.to_owned(),
            index: index.to_owned(),
            key: key.to_vec(),
            target: target.to_owned(),
        };
        self.txn.apply(op)
    }

    /// Removes an index key. A missing index is a no-op.
    pub fn delete_index_entry(&mut self, index: &str, key: &[u8]) -> CoreResult<()> {
        if self.namespace().index(index).is_none() {
            return Ok(());
        }
        let op = LogOp::DeleteIndexEntry {
            partition: self.partition,
            user: self.user.to_owned(),
            index: index.to_owned(),
            key: key.to_vec(),
        };
        self.txn.apply(op)
    }
}
