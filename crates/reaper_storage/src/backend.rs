//! Storage backend trait definition.

use crate::error::StorageResult;

/// A low-level, append-only byte store.
///
/// The Reaper engine writes one framed commit record per write transaction
/// with [`append`](Self::append) and replays them with
/// [`read_at`](Self::read_at) when the store is opened.
///
/// # Invariants
///
/// - `append` returns the offset where data was written
/// - `read_at` returns exactly the bytes previously written at that offset
/// - after `sync` returns, appended data survives process termination
/// - `replace` is all-or-nothing: readers observe either the old or the new contents
pub trait StorageBackend: Send + Sync {
    /// Reads `len` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::ReadPastEnd`](crate::StorageError::ReadPastEnd)
    /// if the range extends beyond the current size, or an I/O error.
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>>;

    /// Appends data to the end of the storage and returns its offset.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs.
    fn append(&mut self, data: &[u8]) -> StorageResult<u64>;

    /// Pushes buffered writes to the operating system.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush operation fails.
    fn flush(&mut self) -> StorageResult<()>;

    /// Returns the current size in bytes, which is where the next append lands.
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be determined.
    fn size(&self) -> StorageResult<u64>;

    /// Syncs data and metadata to durable storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync operation fails.
    fn sync(&mut self) -> StorageResult<()>;

    /// Discards everything after `new_size`.
    ///
    /// Used to cut a torn record off the end of the log during recovery.
    ///
    /// # Errors
    ///
    /// Returns an error if `new_size` is greater than the current size or
    /// the truncation fails.
    fn truncate(&mut self, new_size: u64) -> StorageResult<()>;

    /// Atomically replaces the whole contents with `data`.
    ///
    /// Used by log compaction. A crash during `replace` must leave either the
    /// previous contents or the new ones, never a mix.
    ///
    /// # Errors
    ///
    /// Returns an error if the new contents cannot be written durably.
    fn replace(&mut self, data: &[u8]) -> StorageResult<()>;
}
