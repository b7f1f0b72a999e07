//! # Reaper Testkit
//!
//! Test utilities for Reaper.
//!
//! This crate provides:
//! - Store fixtures with automatic cleanup ([`TestStore`])
//! - Property-based generators for categories, feeds and articles
//! - A crash harness that tears and corrupts the commit log between opens
//!
//! The crate's own `tests/` directory holds the cross-crate scenario tests.
//!
//! ## Usage
//!
//! ```rust
//! use reaper_testkit::TestStore;
//!
//! let t = TestStore::memory();
//! let tech = t.categories.add_category("alice", "Tech").unwrap();
//! assert_eq!(t.categories.get_categories("alice").unwrap(), vec![tech]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod crash;
pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::crash::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use crash::*;
pub use fixtures::*;
pub use generators::*;
