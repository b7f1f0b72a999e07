//! Transaction manager.

use crate::error::{CoreError, CoreResult};
use crate::store::{Namespace, Store};
use crate::transaction::state::NamespaceWriter;
use crate::types::Partition;
use tracing::debug;

/// Runs closures against one user's namespace in one partition.
///
/// Every operation of [`CategoryIndex`](crate::CategoryIndex) and
/// [`FeedStore`](crate::FeedStore) goes through exactly one `view` or
/// `update` call, so it either fully happens or not at all.
///
/// ## Escalation
///
/// [`view`](Self::view) on a user whose namespace does not exist yet does not
/// fail: it releases its snapshot, takes the writer slot, creates the
/// namespace and runs the closure there. A first read therefore provisions
/// storage for the user, and waits for any active writer.
///
/// Lookups that must fail for an unknown user use
/// [`view_existing`](Self::view_existing), which never escalates.
#[derive(Debug, Clone)]
pub struct TransactionManager {
    store: Store,
    partition: Partition,
}

impl TransactionManager {
    /// Creates a manager bound to a partition.
    #[must_use]
    pub fn new(store: Store, partition: Partition) -> Self {
        Self { store, partition }
    }

    /// The partition this manager works on.
    #[must_use]
    pub fn partition(&self) -> Partition {
        self.partition
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Runs `f` against a snapshot of the user's namespace.
    ///
    /// Escalates to [`update`](Self::update) when the namespace is missing.
    ///
    /// # Errors
    ///
    /// Returns whatever `f` returns, or a commit error if escalation had to
    /// write the new namespace.
    pub fn view<T, F>(&self, user: &str, f: F) -> CoreResult<T>
    where
        F: FnOnce(&Namespace) -> CoreResult<T>,
    {
        let snapshot = self.store.begin_read();
        if let Some(ns) = snapshot.namespace(self.partition, user) {
            return f(ns);
        }
        drop(snapshot);

        debug!(partition = %self.partition, user, "namespace missing, escalating view to update");
        self.store.inner().counters.record_escalation();
        self.update(user, |writer| f(writer.namespace()))
    }

    /// Runs `f` against a snapshot of the user's namespace, which must exist.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if the user has no namespace in this
    /// partition, otherwise whatever `f` returns. Nothing is written either way.
    pub fn view_existing<T, F>(&self, user: &str, f: F) -> CoreResult<T>
    where
        F: FnOnce(&Namespace) -> CoreResult<T>,
    {
        let snapshot = self.store.begin_read();
        match snapshot.namespace(self.partition, user) {
            Some(ns) => f(ns),
            None => Err(CoreError::not_found("namespace", user)),
        }
    }

    /// Runs `f` inside the write transaction, creating the namespace first.
    ///
    /// Commits when `f` returns `Ok`. On `Err` the transaction is aborted
    /// and nothing persists, including the namespace creation.
    pub fn update<T, F>(&self, user: &str, f: F) -> CoreResult<T>
    where
        F: FnOnce(&mut NamespaceWriter<'_, '_>) -> CoreResult<T>,
    {
        let mut txn = self.store.begin_write();
        txn.create_namespace(self.partition, user)?;

        let result = {
            let mut writer = NamespaceWriter::new(&mut txn, self.partition, user);
            f(&mut writer)
        };

        match result {
            Ok(value) => {
                txn.commit()?;
                Ok(value)
            }
            Err(err) => {
                txn.abort();
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_escalates_and_creates_namespace() {
        let store = Store::open_in_memory().unwrap();
        let txm = TransactionManager::new(store.clone(), Partition::Categories);

        let count = txm.view("alice", |ns| Ok(ns.record_count())).unwrap();
        assert_eq!(count, 0);

        assert!(store
            .begin_read()
            .namespace(Partition::Categories, "alice")
            .is_some());
        assert_eq!(store.stats().unwrap().escalations, 1);

        // Second view finds the namespace and does not write.
        let seq = store.committed_seq();
        txm.view("alice", |_| Ok(())).unwrap();
        assert_eq!(store.committed_seq(), seq);
        assert_eq!(store.stats().unwrap().escalations, 1);
    }

    #[test]
    fn failed_escalated_view_rolls_back_namespace() {
        let store = Store::open_in_memory().unwrap();
        let txm = TransactionManager::new(store.clone(), Partition::Feeds);

        let result: CoreResult<()> = txm.view("bob", |_| Err(CoreError::not_found("feed", "x")));
        assert!(result.unwrap_err().is_not_found());
        assert!(store.begin_read().namespace(Partition::Feeds, "bob").is_none());
    }

    #[test]
    fn view_existing_fails_without_writing() {
        let store = Store::open_in_memory().unwrap();
        let txm = TransactionManager::new(store.clone(), Partition::Feeds);

        let result = txm.view_existing("carol", |ns| Ok(ns.record_count()));
        assert!(matches!(
            result,
            Err(CoreError::NotFound { entity: "namespace", .. })
        ));
        assert_eq!(store.committed_seq(), crate::types::SequenceNumber::new(0));
        assert!(store.begin_read().namespace(Partition::Feeds, "carol").is_none());
        assert_eq!(store.stats().unwrap().escalations, 0);

        txm.update("carol", |_| Ok(())).unwrap();
        let count = txm.view_existing("carol", |ns| Ok(ns.record_count())).unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn update_error_discards_all_writes() {
        let store = Store::open_in_memory().unwrap();
        let txm = TransactionManager::new(store.clone(), Partition::Categories);
        txm.update("u", |_| Ok(())).unwrap();
        let seq = store.committed_seq();

        let result: CoreResult<()> = txm.update("u", |writer| {
            writer.put("a", vec![1])?;
            writer.put_index_entry("name", b"a", "a")?;
            Err(CoreError::invalid_id("a"))
        });
        assert!(matches!(result, Err(CoreError::InvalidId { .. })));
        assert_eq!(store.committed_seq(), seq);

        let count = txm.view("u", |ns| Ok(ns.record_count())).unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn partitions_are_isolated() {
        let store = Store::open_in_memory().unwrap();
        let categories = TransactionManager::new(store.clone(), Partition::Categories);
        let feeds = TransactionManager::new(store, Partition::Feeds);

        categories
            .update("u", |writer| writer.put("id", vec![0]))
            .unwrap();
        let seen = feeds.view("u", |ns| Ok(ns.contains("id"))).unwrap();
        assert!(!seen);
    }
}
