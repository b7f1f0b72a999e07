//! Error types for Reaper core.

use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors returned by the store and the indexes built on it.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A record, index entry or namespace that the operation requires is absent.
    #[error("{entity} not found: {key}")]
    NotFound {
        /// Kind of thing that was looked up.
        entity: &'static str,
        /// The key that missed.
        key: String,
    },

    /// A category with this name already exists for the user.
    #[error("category name already in use: {name}")]
    DuplicateName {
        /// The colliding name.
        name: String,
    },

    /// A feed with this public id already exists for the user.
    #[error("feed public id already in use: {public_id}")]
    DuplicatePublicId {
        /// The colliding public id.
        public_id: String,
    },

    /// An update targeted an id with no record behind it.
    #[error("invalid id: {id}")]
    InvalidId {
        /// The id that was targeted.
        id: String,
    },

    /// Stored bytes or caller-supplied ids could not be decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] reaper_codec::CodecError),

    /// The store could not be opened.
    #[error("store unavailable: {message}")]
    StoreUnavailable {
        /// Why opening failed.
        message: String,
    },

    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] reaper_storage::StorageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The commit log is corrupted or invalid.
    #[error("commit log corruption: {message}")]
    WalCorruption {
        /// Description of the corruption.
        message: String,
    },

    /// Checksum mismatch on a commit record.
    #[error("checksum mismatch at offset {offset}: expected {expected:08x}, got {actual:08x}")]
    ChecksumMismatch {
        /// Offset of the record in the log.
        offset: u64,
        /// Checksum stored in the record.
        expected: u32,
        /// Checksum computed from the record bytes.
        actual: u32,
    },

    /// Operation not permitted in current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why operation is invalid.
        message: String,
    },
}

impl CoreError {
    /// Creates a not found error.
    pub fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            key: key.into(),
        }
    }

    /// Creates an invalid id error.
    pub fn invalid_id(id: impl Into<String>) -> Self {
        Self::InvalidId { id: id.into() }
    }

    /// Creates a store unavailable error.
    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            message: message.into(),
        }
    }

    /// Creates a commit log corruption error.
    pub fn wal_corruption(message: impl Into<String>) -> Self {
        Self::WalCorruption {
            message: message.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Returns true for [`CoreError::NotFound`].
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
