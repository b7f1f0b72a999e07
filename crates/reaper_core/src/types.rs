//! Core type definitions.

use serde::Serialize;
use std::fmt;

/// Sequence number of a committed write transaction.
///
/// Every commit that changes state gets the next number; a store that has
/// never been written to is at sequence 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SequenceNumber(pub u64);

impl SequenceNumber {
    /// Creates a new sequence number.
    #[must_use]
    pub const fn new(seq: u64) -> Self {
        Self(seq)
    }

    /// Returns the raw sequence value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns the next sequence number.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for SequenceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "seq:{}", self.0)
    }
}

/// Top-level partition of the store.
///
/// Each entity kind lives in its own partition, and each partition holds one
/// namespace per user. Category and feed records therefore never share a
/// key space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Partition {
    /// Category records and the name index.
    Categories,
    /// Feed records and the public id index.
    Feeds,
}

impl Partition {
    /// All partitions, in storage order.
    pub const ALL: [Partition; 2] = [Partition::Categories, Partition::Feeds];

    /// Converts the partition to its log byte.
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        match self {
            Self::Categories => 1,
            Self::Feeds => 2,
        }
    }

    /// Converts a log byte back to a partition.
    #[must_use]
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            1 => Some(Self::Categories),
            2 => Some(Self::Feeds),
            _ => None,
        }
    }

    /// Human-readable partition name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Categories => "categories",
            Self::Feeds => "feeds",
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_number_next() {
        let s1 = SequenceNumber::new(5);
        assert_eq!(s1.next().as_u64(), 6);
        assert!(s1 < s1.next());
    }

    #[test]
    fn partition_byte_roundtrip() {
        for partition in Partition::ALL {
            assert_eq!(Partition::from_byte(partition.as_byte()), Some(partition));
        }
        assert_eq!(Partition::from_byte(0), None);
    }

    #[test]
    fn partition_display() {
        assert_eq!(Partition::Feeds.to_string(), "feeds");
        assert_eq!(format!("{}", SequenceNumber::new(3)), "seq:3");
    }
}
