//! Commit record types and serialization.

use crate::error::{CoreError, CoreResult};
use crate::types::{Partition, SequenceNumber};

/// Magic bytes identifying a commit record.
pub const WAL_MAGIC: [u8; 4] = *b"RLOG";

/// Current log format version.
pub const WAL_VERSION: u16 = 1;

/// Type of commit record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WalRecordType {
    /// Mutations of one write transaction, applied on top of prior state.
    Commit = 1,
    /// Complete state written by compaction; replaces everything before it.
    Snapshot = 2,
}

impl WalRecordType {
    /// Converts a byte to a record type.
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            1 => Some(Self::Commit),
            2 => Some(Self::Snapshot),
            _ => None,
        }
    }

    /// Converts the record type to a byte.
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        self as u8
    }
}

/// One mutation of engine state.
///
/// Write transactions and log replay both go through
/// [`State::apply`](crate::State::apply), so what is persisted is exactly
/// what was applied in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogOp {
    /// Create an empty user namespace.
    CreateNamespace {
        /// Owning partition.
        partition: Partition,
        /// User identifier.
        user: String,
    },
    /// Insert or overwrite a primary record.
    PutRecord {
        /// Owning partition.
        partition: Partition,
        /// User identifier.
        user: String,
        /// Hex object id.
        key: String,
        /// Encoded record.
        value: Vec<u8>,
    },
    /// Delete a primary record.
    DeleteRecord {
        /// Owning partition.
        partition: Partition,
        /// User identifier.
        user: String,
        /// Hex object id.
        key: String,
    },
    /// Create an empty secondary index region.
    CreateIndex {
        /// Owning partition.
        partition: Partition,
        /// User identifier.
        user: String,
        /// Index name.
        index: String,
    },
    /// Insert or overwrite an index entry.
    PutIndexEntry {
        /// Owning partition.
        partition: Partition,
        /// User identifier.
        user: String,
        /// Index name.
        index: String,
        /// Lookup key.
        key: Vec<u8>,
        /// Hex object id of the indexed record.
        target: String,
    },
    /// Delete an index entry.
    DeleteIndexEntry {
        /// Owning partition.
        partition: Partition,
        /// User identifier.
        user: String,
        /// Index name.
        index: String,
        /// Lookup key.
        key: Vec<u8>,
    },
}

impl LogOp {
    fn tag(&self) -> u8 {
        match self {
            Self::CreateNamespace { .. } => 1,
            Self::PutRecord { .. } => 2,
            Self::DeleteRecord { .. } => 3,
            Self::CreateIndex { .. } => 4,
            Self::PutIndexEntry { .. } => 5,
            Self::DeleteIndexEntry { .. } => 6,
        }
    }

    /// Partition and user the op mutates.
    #[must_use]
    pub fn namespace(&self) -> (Partition, &str) {
        match self {
            Self::CreateNamespace { partition, user }
            | Self::PutRecord {
                partition, user, ..
            }
            | Self::DeleteRecord {
                partition, user, ..
            }
            | Self::CreateIndex {
                partition, user, ..
            }
            | Self::PutIndexEntry {
                partition, user, ..
            }
            | Self::DeleteIndexEntry {
                partition, user, ..
            } => (*partition, user),
        }
    }

    fn encode_into(&self, out: &mut PayloadWriter) -> CoreResult<()> {
        let (partition, user) = self.namespace();
        out.put_u8(self.tag());
        out.put_u8(partition.as_byte());
        out.put_bytes(user.as_bytes())?;

        match self {
            Self::CreateNamespace { .. } => {}
            Self::PutRecord { key, value, .. } => {
                out.put_bytes(key.as_bytes())?;
                out.put_bytes(value)?;
            }
            Self::DeleteRecord { key, .. } => {
                out.put_bytes(key.as_bytes())?;
            }
            Self::CreateIndex { index, .. } => {
                out.put_bytes(index.as_bytes())?;
            }
            Self::PutIndexEntry {
                index, key, target, ..
            } => {
                out.put_bytes(index.as_bytes())?;
                out.put_bytes(key)?;
                out.put_bytes(target.as_bytes())?;
            }
            Self::DeleteIndexEntry { index, key, .. } => {
                out.put_bytes(index.as_bytes())?;
                out.put_bytes(key)?;
            }
        }
        Ok(())
    }

    fn decode_from(input: &mut PayloadReader<'_>) -> CoreResult<Self> {
        let tag = input.read_u8()?;
        let partition_byte = input.read_u8()?;
        let partition = Partition::from_byte(partition_byte).ok_or_else(|| {
            CoreError::wal_corruption(format!("unknown partition {partition_byte}"))
        })?;
        let user = input.read_string()?;

        let op = match tag {
            1 => Self::CreateNamespace { partition, user },
            2 => Self::PutRecord {
                partition,
                user,
                key: input.read_string()?,
                value: input.read_bytes()?,
            },
            3 => Self::DeleteRecord {
                partition,
                user,
                key: input.read_string()?,
            },
            4 => Self::CreateIndex {
                partition,
                user,
                index: input.read_string()?,
            },
            5 => Self::PutIndexEntry {
                partition,
                user,
                index: input.read_string()?,
                key: input.read_bytes()?,
                target: input.read_string()?,
            },
            6 => Self::DeleteIndexEntry {
                partition,
                user,
                index: input.read_string()?,
                key: input.read_bytes()?,
            },
            other => {
                return Err(CoreError::wal_corruption(format!("unknown op tag {other}")));
            }
        };
        Ok(op)
    }
}

/// A commit record: the ops of one transaction, or a full snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalRecord {
    /// Commit or snapshot.
    pub kind: WalRecordType,
    /// Sequence number the state reaches after this record.
    pub sequence: SequenceNumber,
    /// Mutations, in application order.
    pub ops: Vec<LogOp>,
}

impl WalRecord {
    /// Creates a commit record.
    #[must_use]
    pub fn commit(sequence: SequenceNumber, ops: Vec<LogOp>) -> Self {
        Self {
            kind: WalRecordType::Commit,
            sequence,
            ops,
        }
    }

    /// Creates a snapshot record.
    #[must_use]
    pub fn snapshot(sequence: SequenceNumber, ops: Vec<LogOp>) -> Self {
        Self {
            kind: WalRecordType::Snapshot,
            sequence,
            ops,
        }
    }

    /// Serializes the record payload (without envelope).
    ///
    /// # Errors
    ///
    /// Returns an error if a field or the op count does not fit in 32 bits.
    pub fn encode_payload(&self) -> CoreResult<Vec<u8>> {
        let mut out = PayloadWriter::default();
        out.put_u64(self.sequence.as_u64());
        out.put_u32(len_u32(self.ops.len())?);
        for op in &self.ops {
            op.encode_into(&mut out)?;
        }
        Ok(out.buf)
    }

    /// Deserializes a record from its type and payload.
    pub fn decode_payload(kind: WalRecordType, payload: &[u8]) -> CoreResult<Self> {
        let mut input = PayloadReader {
            payload,
            cursor: 0,
        };
        let sequence = SequenceNumber::new(input.read_u64()?);
        let count = input.read_u32()? as usize;

        // Every op needs at least tag + partition + user length.
        if count > payload.len() / 6 {
            return Err(CoreError::wal_corruption(format!(
                "op count {count} exceeds payload size {}",
                payload.len()
            )));
        }

        let mut ops = Vec::with_capacity(count);
        for _ in 0..count {
            ops.push(LogOp::decode_from(&mut input)?);
        }

        if input.cursor != payload.len() {
            return Err(CoreError::wal_corruption(format!(
                "trailing bytes in record: expected {} bytes, got {}",
                input.cursor,
                payload.len()
            )));
        }

        Ok(Self {
            kind,
            sequence,
            ops,
        })
    }
}

fn len_u32(len: usize) -> CoreResult<u32> {
    u32::try_from(len)
        .map_err(|_| CoreError::invalid_operation(format!("field of {len} bytes is too large")))
}

#[derive(Default)]
struct PayloadWriter {
    buf: Vec<u8>,
}

impl PayloadWriter {
    fn put_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn put_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn put_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn put_bytes(&mut self, bytes: &[u8]) -> CoreResult<()> {
        self.put_u32(len_u32(bytes.len())?);
        self.buf.extend_from_slice(bytes);
        Ok(())
    }
}

struct PayloadReader<'a> {
    payload: &'a [u8],
    cursor: usize,
}

impl<'a> PayloadReader<'a> {
    fn take(&mut self, n: usize) -> CoreResult<&'a [u8]> {
        let end = self
            .cursor
            .checked_add(n)
            .filter(|&end| end <= self.payload.len())
            .ok_or_else(|| CoreError::wal_corruption("unexpected end of payload"))?;
        let slice = &self.payload[self.cursor..end];
        self.cursor = end;
        Ok(slice)
    }

    fn read_u8(&mut self) -> CoreResult<u8> {
        Ok(self.take(1)?[0])
    }

    fn read_u32(&mut self) -> CoreResult<u32> {
        let bytes: [u8; 4] = self
            .take(4)?
            .try_into()
            .map_err(|_| CoreError::wal_corruption("invalid u32"))?;
        Ok(u32::from_le_bytes(bytes))
    }

    fn read_u64(&mut self) -> CoreResult<u64> {
        let bytes: [u8; 8] = self
            .take(8)?
            .try_into()
            .map_err(|_| CoreError::wal_corruption("invalid u64"))?;
        Ok(u64::from_le_bytes(bytes))
    }

    fn read_bytes(&mut self) -> CoreResult<Vec<u8>> {
        let len = self.read_u32()? as usize;
        Ok(self.take(len)?.to_vec())
    }

    fn read_string(&mut self) -> CoreResult<String> {
        String::from_utf8(self.read_bytes()?)
            .map_err(|_| CoreError::wal_corruption("invalid UTF-8 in record"))
    }
}

/// Computes CRC32 checksum for data.
pub fn compute_crc32(data: &[u8]) -> u32 {
    // IEEE polynomial, table built at compile time.
    const CRC32_TABLE: [u32; 256] = {
        let mut table = [0u32; 256];
        let mut i = 0;
        while i < 256 {
            let mut crc = i as u32;
            let mut j = 0;
            while j < 8 {
                if crc & 1 != 0 {
                    crc = (crc >> 1) ^ 0xEDB8_8320;
                } else {
                    crc >>= 1;
                }
                j += 1;
            }
            table[i] = crc;
            i += 1;
        }
        table
    };

    let mut crc = 0xFFFF_FFFF_u32;
    for &byte in data {
        let index = ((crc ^ u32::from(byte)) & 0xFF) as usize;
        crc = (crc >> 8) ^ CRC32_TABLE[index];
    }
    !crc
}
