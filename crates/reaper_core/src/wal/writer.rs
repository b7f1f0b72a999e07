//! Commit log writer and reader.

use crate::error::{CoreError, CoreResult};
use crate::wal::record::{compute_crc32, WalRecord, WalRecordType, WAL_MAGIC, WAL_VERSION};
use parking_lot::Mutex;
use reaper_storage::StorageBackend;
use tracing::warn;

/// Header size for commit records.
/// magic (4) + version (2) + type (1) + length (4) = 11 bytes
const HEADER_SIZE: usize = 11;

/// CRC size.
const CRC_SIZE: usize = 4;

/// Result of replaying the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayOutcome {
    /// Number of complete records handed to the callback.
    pub records: usize,
    /// Length of the valid prefix of the log.
    pub valid_len: u64,
    /// Bytes after the valid prefix belonging to a torn record.
    pub torn_bytes: u64,
}

/// Manages commit log writes and reads.
pub struct WalManager {
    backend: Mutex<Box<dyn StorageBackend>>,
    sync_on_commit: bool,
}

impl WalManager {
    /// Creates a new log manager over a backend.
    pub fn new(backend: Box<dyn StorageBackend>, sync_on_commit: bool) -> Self {
        Self {
            backend: Mutex::new(backend),
            sync_on_commit,
        }
    }

    /// Builds the framed bytes of a record.
    pub fn frame(record: &WalRecord) -> CoreResult<Vec<u8>> {
        let payload = record.encode_payload()?;
        let len = u32::try_from(payload.len())
            .map_err(|_| CoreError::invalid_operation("commit record payload too large"))?;

        let mut data = Vec::with_capacity(HEADER_SIZE + payload.len() + CRC_SIZE);
        data.extend_from_slice(&WAL_MAGIC);
        data.extend_from_slice(&WAL_VERSION.to_le_bytes());
        data.push(record.kind.as_byte());
        data.extend_from_slice(&len.to_le_bytes());
        data.extend_from_slice(&payload);

        // CRC32 over everything before it
        let crc = compute_crc32(&data);
        data.extend_from_slice(&crc.to_le_bytes());
        Ok(data)
    }

    /// Appends a record to the log.
    ///
    /// Returns the offset where the record was written. If the write or sync
    /// fails, the log is cut back to its previous length so a failed commit
    /// never becomes visible on the next open.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or I/O fails.
    pub fn append(&self, record: &WalRecord) -> CoreResult<u64> {
        let data = Self::frame(record)?;

        let mut backend = self.backend.lock();
        let before = backend.size()?;

        let written = backend.append(&data).and_then(|offset| {
            backend.flush()?;
            if self.sync_on_commit {
                backend.sync()?;
            }
            Ok(offset)
        });

        match written {
            Ok(offset) => Ok(offset),
            Err(err) => {
                if let Err(rollback) = backend.truncate(before) {
                    warn!(error = %rollback, "failed to roll back partial commit record");
                }
                Err(err.into())
            }
        }
    }

    /// Reads the log from the start, calling `apply` for every complete record.
    ///
    /// A torn record at the end is not an error: replay stops there and
    /// reports its size in [`ReplayOutcome::torn_bytes`].
    ///
    /// # Errors
    ///
    /// Returns an error on checksum mismatch, bad magic, unknown record type,
    /// unsupported version, or if `apply` fails.
    pub fn replay<F>(&self, mut apply: F) -> CoreResult<ReplayOutcome>
    where
        F: FnMut(u64, WalRecord) -> CoreResult<()>,
    {
        let backend = self.backend.lock();
        let size = backend.size()?;
        let mut offset = 0u64;
        let mut records = 0usize;

        while offset < size {
            let remaining = size - offset;
            if remaining < HEADER_SIZE as u64 {
                break;
            }

            let header = backend.read_at(offset, HEADER_SIZE)?;
            if header[0..4] != WAL_MAGIC {
                return Err(CoreError::wal_corruption(format!(
                    "invalid magic at offset {offset}"
                )));
            }

            let version = u16::from_le_bytes([header[4], header[5]]);
            if version > WAL_VERSION {
                return Err(CoreError::wal_corruption(format!(
                    "unsupported log version {version} at offset {offset}"
                )));
            }

            let kind = WalRecordType::from_byte(header[6]).ok_or_else(|| {
                CoreError::wal_corruption(format!(
                    "unknown record type {} at offset {offset}",
                    header[6]
                ))
            })?;

            let len = u32::from_le_bytes([header[7], header[8], header[9], header[10]]) as u64;
            let total = HEADER_SIZE as u64 + len + CRC_SIZE as u64;
            if total > remaining {
                break;
            }

            let body = backend.read_at(offset, total as usize)?;
            let (framed, crc_bytes) = body.split_at(body.len() - CRC_SIZE);
            let expected =
                u32::from_le_bytes([crc_bytes[0], crc_bytes[1], crc_bytes[2], crc_bytes[3]]);
            let actual = compute_crc32(framed);
            if expected != actual {
                return Err(CoreError::ChecksumMismatch {
                    offset,
                    expected,
                    actual,
                });
            }

            let record = WalRecord::decode_payload(kind, &framed[HEADER_SIZE..])?;
            apply(offset, record)?;

            records += 1;
            offset += total;
        }

        Ok(ReplayOutcome {
            records,
            valid_len: offset,
            torn_bytes: size - offset,
        })
    }

    /// Truncates the log to the specified length.
    pub fn truncate(&self, len: u64) -> CoreResult<()> {
        let mut backend = self.backend.lock();
        backend.truncate(len)?;
        if self.sync_on_commit {
            backend.sync()?;
        }
        Ok(())
    }

    /// Replaces the whole log with a single record.
    ///
    /// Used by compaction. Returns the new log size.
    pub fn replace(&self, record: &WalRecord) -> CoreResult<u64> {
        let data = Self::frame(record)?;
        let mut backend = self.backend.lock();
        backend.replace(&data)?;
        Ok(backend.size()?)
    }

    /// Returns the current log size.
    pub fn size(&self) -> CoreResult<u64> {
        Ok(self.backend.lock().size()?)
    }
}
