//! # Reaper Core
//!
//! Indexed storage for per-user subscription data.
//!
//! This crate provides:
//! - An embedded engine with snapshot reads, a single serialized writer and
//!   a checksummed commit log ([`Store`])
//! - Namespace-scoped transactions with read-to-write escalation
//!   ([`TransactionManager`])
//! - Categories with a unique name index ([`CategoryIndex`])
//! - Feeds with a unique public id index and embedded articles ([`FeedStore`])
//!
//! ## Example
//!
//! ```rust
//! use reaper_core::{CategoryIndex, FeedStore, Store};
//!
//! let store = Store::open_in_memory().unwrap();
//! let categories = CategoryIndex::new(store.clone());
//! let feeds = FeedStore::new(store);
//!
//! let tech = categories.add_category("alice", "Tech").unwrap();
//! let public_id = reaper_core::ObjectId::new().to_hex();
//! let feed = feeds
//!     .add_feed("alice", &public_id, "http://x", "X", &tech.id.to_hex(), ["http://x/a"])
//!     .unwrap();
//! assert_eq!(feed.articles.len(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod category;
mod config;
mod error;
mod feed;
mod stats;
mod store;
mod transaction;
mod types;
mod wal;

pub use category::{Category, CategoryIndex, NAME_INDEX};
pub use config::Config;
pub use error::{CoreError, CoreResult};
pub use feed::{Article, CategoryUpdate, Feed, FeedStore, PublicArticle, PUBLIC_ID_INDEX};
pub use reaper_codec::{Document, ObjectId};
pub use stats::{NamespaceStats, StoreStats};
pub use store::{Compaction, IndexRegion, Namespace, State, Store};
pub use transaction::{NamespaceWriter, ReadTransaction, TransactionManager, WriteTransaction};
pub use types::{Partition, SequenceNumber};
pub use wal::LogOp;
