//! Commit log for durability and crash recovery.
//!
//! Every write transaction that changes state is appended as one framed
//! record holding all of its mutations. Opening a store replays the log
//! from the start to rebuild the in-memory state.
//!
//! ## Record Format
//!
//! ```text
//! | magic (4) | version (2) | type (1) | length (4) | payload (N) | crc32 (4) |
//! ```
//!
//! ## Recovery Policy
//!
//! Tolerated, treated as the clean end of the log and cut off:
//!
//! - **Truncated header**: fewer than 11 bytes left
//! - **Truncated payload**: the length field runs past the end of the file
//!
//! Both are a crash in the middle of an append. The transaction in that record
//! never acknowledged its commit, so dropping it keeps every index consistent.
//!
//! Fatal, the store refuses to open:
//!
//! - **CRC mismatch**
//! - **Invalid magic**, **unknown record type**, **future version**
//! - **Undecodable payload** or a mutation against a missing namespace

mod record;
mod writer;

pub use record::{compute_crc32, LogOp, WalRecord, WalRecordType};
pub use writer::{ReplayOutcome, WalManager};
