//! Transactions.
//!
//! - [`ReadTransaction`]: an immutable snapshot of committed state.
//! - [`WriteTransaction`]: the single writer; buffers mutations and commits
//!   them as one log record.
//! - [`TransactionManager`]: runs closures against one user namespace of one
//!   partition, escalating reads to writes when the namespace is missing.

mod manager;
mod state;

pub use manager::TransactionManager;
pub use state::{NamespaceWriter, ReadTransaction, WriteTransaction};
