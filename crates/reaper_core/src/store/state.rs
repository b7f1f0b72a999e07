//! In-memory engine state rebuilt from the commit log.

use crate::error::{CoreError, CoreResult};
use crate::types::Partition;
use crate::wal::LogOp;
use reaper_codec::Document;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A secondary index: lookup key to the hex id of a primary record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexRegion {
    entries: BTreeMap<Vec<u8>, String>,
}

impl IndexRegion {
    /// Returns the target id for a lookup key.
    #[must_use]
    pub fn get(&self, key: &[u8]) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the index has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &str)> {
        self.entries
            .iter()
            .map(|(key, target)| (key.as_slice(), target.as_str()))
    }
}

/// One user's data within a partition.
///
/// Primary records and index regions are kept apart, so iterating records
/// never sees an index entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Namespace {
    records: BTreeMap<String, Vec<u8>>,
    indexes: BTreeMap<String, IndexRegion>,
}

pub(crate) static EMPTY_NAMESPACE: Namespace = Namespace {
    records: BTreeMap::new(),
    indexes: BTreeMap::new(),
};

impl Namespace {
    /// Returns the raw bytes of a record.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&[u8]> {
        self.records.get(key).map(Vec::as_slice)
    }

    /// Returns true if a record exists under `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.records.contains_key(key)
    }

    /// Decodes the record stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Serialization`] if the stored bytes are malformed.
    pub fn get_document<T: Document>(&self, key: &str) -> CoreResult<Option<T>> {
        self.get(key)
            .map(|bytes| T::decode(bytes).map_err(CoreError::from))
            .transpose()
    }

    /// Decodes every record in key order.
    pub fn documents<T: Document>(&self) -> CoreResult<Vec<T>> {
        self.records
            .values()
            .map(|bytes| T::decode(bytes).map_err(CoreError::from))
            .collect()
    }

    /// Iterates raw records in key order.
    pub fn records(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.records
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_slice()))
    }

    /// Number of primary records.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Returns an index region if it has been created.
    #[must_use]
    pub fn index(&self, name: &str) -> Option<&IndexRegion> {
        self.indexes.get(name)
    }

    /// Looks up a key in an index.
    #[must_use]
    pub fn index_lookup(&self, name: &str, key: &[u8]) -> Option<&str> {
        self.index(name).and_then(|index| index.get(key))
    }

    /// Iterates index regions by name.
    pub fn indexes(&self) -> impl Iterator<Item = (&str, &IndexRegion)> {
        self.indexes
            .iter()
            .map(|(name, index)| (name.as_str(), index))
    }

    /// Total number of entries over all index regions.
    #[must_use]
    pub fn index_entry_count(&self) -> usize {
        self.indexes.values().map(IndexRegion::len).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct NamespaceKey {
    partition: Partition,
    user: String,
}

/// Committed state of the whole store.
///
/// Namespaces are shared through `Arc`, so cloning a `State` is cheap and a
/// write transaction only copies the namespaces it actually touches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct State {
    namespaces: BTreeMap<NamespaceKey, Arc<Namespace>>,
}

impl State {
    /// Returns a user's namespace in a partition.
    #[must_use]
    pub fn namespace(&self, partition: Partition, user: &str) -> Option<&Namespace> {
        self.namespaces
            .get(&NamespaceKey {
                partition,
                user: user.to_owned(),
            })
            .map(Arc::as_ref)
    }

    /// Iterates all namespaces in partition, then user order.
    pub fn namespaces(&self) -> impl Iterator<Item = (Partition, &str, &Namespace)> {
        self.namespaces
            .iter()
            .map(|(key, ns)| (key.partition, key.user.as_str(), ns.as_ref()))
    }

    /// Number of namespaces across all partitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.namespaces.len()
    }

    /// Returns true if no namespace exists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty()
    }

    /// Applies one mutation.
    ///
    /// `CreateNamespace` and `CreateIndex` are idempotent. Every other op
    /// requires its namespace (and index) to exist.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::WalCorruption`] if the op targets a missing
    /// namespace or index.
    pub fn apply(&mut self, op: &LogOp) -> CoreResult<()> {
        let (partition, user) = op.namespace();
        let key = NamespaceKey {
            partition,
            user: user.to_owned(),
        };

        if let LogOp::CreateNamespace { .. } = op {
            self.namespaces.entry(key).or_default();
            return Ok(());
        }

        let ns = self.namespaces.get_mut(&key).ok_or_else(|| {
            CoreError::wal_corruption(format!("no namespace {user} in {partition}"))
        })?;
        let ns = Arc::make_mut(ns);

        match op {
            LogOp::CreateNamespace { .. } => {}
            LogOp::PutRecord { key, value, .. } => {
                ns.records.insert(key.clone(), value.clone());
            }
            LogOp::DeleteRecord { key, .. } => {
                ns.records.remove(key);
            }
            LogOp::CreateIndex { index, .. } => {
                ns.indexes.entry(index.clone()).or_default();
            }
            LogOp::PutIndexEntry {
                index, key, target, ..
            } => {
                region_mut(ns, index, user)?
                    .entries
                    .insert(key.clone(), target.clone());
            }
            LogOp::DeleteIndexEntry { index, key, .. } => {
                region_mut(ns, index, user)?.entries.remove(key);
            }
        }
        Ok(())
    }

    /// Returns the ops that rebuild this state from empty.
    #[must_use]
    pub fn to_ops(&self) -> Vec<LogOp> {
        let mut ops = Vec::new();
        for (key, ns) in &self.namespaces {
            let partition = key.partition;
            let user = &key.user;
            ops.push(LogOp::CreateNamespace {
                partition,
                user: user.clone(),
            });
            for (id, value) in &ns.records {
                ops.push(LogOp::PutRecord {
                    partition,
                    user: user.clone(),
                    key: id.clone(),
                    value: value.clone(),
                });
            }
            for (name, region) in &ns.indexes {
                ops.push(LogOp::CreateIndex {
                    partition,
                    user: user.clone(),
                    index: name.clone(),
                });
                for (lookup, target) in &region.entries {
                    ops.push(LogOp::PutIndexEntry {
                        partition,
                        user: user.clone(),
                        index: name.clone(),
                        key: lookup.clone(),
                        target: target.clone(),
                    });
                }
            }
        }
        ops
    }
}

fn region_mut<'a>(
    ns: &'a mut Namespace,
    index: &str,
    user: &str,
) -> CoreResult<&'a mut IndexRegion> {
    ns.indexes
        .get_mut(index)
        .ok_or_else(|| CoreError::wal_corruption(format!("no index {index} for {user}")))
}
