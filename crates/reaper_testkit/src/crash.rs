//! Crash recovery testing.
//!
//! [`CrashHarness`] keeps the commit log in a shared in-memory buffer so a
//! test can drop the store, damage the log the way a crash would, and open
//! it again.
//!
//! ```rust
//! use reaper_testkit::CrashHarness;
//!
//! let harness = CrashHarness::new();
//! let store = harness.open().unwrap();
//! reaper_core::CategoryIndex::new(store.clone())
//!     .add_category("u", "Tech")
//!     .unwrap();
//! drop(store);
//!
//! harness.tear(3);
//! let store = harness.open().unwrap();
//! assert_eq!(store.committed_seq().as_u64(), 0);
//! ```

use reaper_core::{Config, CoreResult, Store};
use reaper_storage::InMemoryBackend;

/// Where a simulated crash leaves the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrashPoint {
    /// Inside the record header of the last commit.
    DuringHeader,
    /// Inside the payload of the last commit.
    DuringPayload,
    /// Just before the checksum of the last commit was written.
    BeforeChecksum,
    /// After the last commit completed.
    AfterCommit,
}

/// Reopenable store over a shared in-memory log.
#[derive(Debug, Default)]
pub struct CrashHarness {
    backend: InMemoryBackend,
}

impl CrashHarness {
    /// Creates a harness with an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a store over the current log, replaying it.
    pub fn open(&self) -> CoreResult<Store> {
        Store::open_with_backend(Config::default(), Box::new(self.backend.share()))
    }

    /// Current log length.
    pub fn log_len(&self) -> usize {
        self.backend.data().len()
    }

    /// Removes `bytes` from the end of the log.
    pub fn tear(&self, bytes: usize) {
        let mut data = self.backend.data();
        data.truncate(data.len().saturating_sub(bytes));
        self.replace(data);
    }

    /// Cuts the last record back to where `point` says the crash happened.
    ///
    /// `last_record_len` is the framed size of the final record, as measured
    /// by comparing [`log_len`](Self::log_len) before and after the commit.
    pub fn crash_at(&self, point: CrashPoint, last_record_len: usize) {
        let keep = match point {
            CrashPoint::DuringHeader => 5,
            CrashPoint::DuringPayload => last_record_len / 2,
            CrashPoint::BeforeChecksum => last_record_len - 4,
            CrashPoint::AfterCommit => last_record_len,
        };
        self.tear(last_record_len - keep);
    }

    /// Flips one byte of the log.
    pub fn corrupt(&self, offset: usize) {
        self.backend.flip_byte(offset);
    }

    /// Appends raw bytes, as a foreign writer would.
    pub fn append_garbage(&self, bytes: &[u8]) {
        let mut data = self.backend.data();
        data.extend_from_slice(bytes);
        self.replace(data);
    }

    fn replace(&self, data: Vec<u8>) {
        use reaper_storage::StorageBackend;
        self.backend
            .share()
            .replace(&data)
            .expect("In-memory replace cannot fail");
    }
}
