//! # Reaper Storage
//!
//! Byte-level storage backends underneath the Reaper commit log.
//!
//! Backends are **opaque byte stores**. They know nothing about commit
//! records, namespaces or feeds; the engine in `reaper_core` owns every
//! format decision.
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - shared in-process buffer, for tests and ephemeral stores
//! - [`FileBackend`] - a single file on disk
//!
//! ## Example
//!
//! ```rust
//! use reaper_storage::{StorageBackend, InMemoryBackend};
//!
//! let mut backend = InMemoryBackend::new();
//! let offset = backend.append(b"hello world").unwrap();
//! let data = backend.read_at(offset, 11).unwrap();
//! assert_eq!(&data, b"hello world");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
