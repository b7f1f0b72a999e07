//! Store statistics.
//!
//! Counters are kept per open store and reset on every open. The rest of
//! [`StoreStats`] is computed from the committed state when requested.
//!
//! ```rust
//! use reaper_core::{CategoryIndex, Store};
//!
//! let store = Store::open_in_memory().unwrap();
//! CategoryIndex::new(store.clone()).add_category("alice", "Tech").unwrap();
//!
//! let stats = store.stats().unwrap();
//! assert_eq!(stats.commits, 1);
//! assert_eq!(stats.namespaces[0].records, 1);
//! ```

use crate::store::State;
use crate::types::{Partition, SequenceNumber};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters, updated by transactions.
#[derive(Debug, Default)]
pub(crate) struct StoreCounters {
    commits: AtomicU64,
    aborts: AtomicU64,
    escalations: AtomicU64,
}

impl StoreCounters {
    pub(crate) fn record_commit(&self) {
        self.commits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_abort(&self) {
        self.aborts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_escalation(&self) {
        self.escalations.fetch_add(1, Ordering::Relaxed);
    }
}

/// Size of one user namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamespaceStats {
    /// Partition holding the namespace.
    pub partition: Partition,
    /// User identifier.
    pub user: String,
    /// Number of primary records.
    pub records: usize,
    /// Number of entries across all index regions.
    pub index_entries: usize,
}

/// Point-in-time statistics of a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    /// Sequence number of the last commit.
    pub committed_seq: SequenceNumber,
    /// Size of the commit log in bytes.
    pub log_bytes: u64,
    /// Write transactions committed since open.
    pub commits: u64,
    /// Write transactions aborted since open.
    pub aborts: u64,
    /// Views that escalated to an update since open.
    pub escalations: u64,
    /// Every namespace, in partition then user order.
    pub namespaces: Vec<NamespaceStats>,
}

impl StoreStats {
    pub(crate) fn collect(
        state: &State,
        committed_seq: SequenceNumber,
        log_bytes: u64,
        counters: &StoreCounters,
    ) -> Self {
        let namespaces = state
            .namespaces()
            .map(|(partition, user, ns)| NamespaceStats {
                partition,
                user: user.to_owned(),
                records: ns.record_count(),
                index_entries: ns.index_entry_count(),
            })
            .collect();

        Self {
            committed_seq,
            log_bytes,
            commits: counters.commits.load(Ordering::Relaxed),
            aborts: counters.aborts.load(Ordering::Relaxed),
            escalations: counters.escalations.load(Ordering::Relaxed),
            namespaces,
        }
    }

    /// Total primary records in one partition.
    #[must_use]
    pub fn records_in(&self, partition: Partition) -> usize {
        self.namespaces
            .iter()
            .filter(|ns| ns.partition == partition)
            .map(|ns| ns.records)
            .sum()
    }
}
