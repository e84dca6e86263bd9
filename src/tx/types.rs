//! Core MVCC identifier types: TxId and CommitId.

use std::fmt;

/// Transaction ID (64-bit).
///
/// The transaction manager mints these sequentially from 1. Id 0 is the
/// INVALID sentinel and doubles as "no owner" in row-group slot headers: a
/// slot owned by INVALID carries no pending write, which is exactly what
/// delete latching and visibility test against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TxId(u64);

impl TxId {
    /// The reserved sentinel (0): no transaction, or no slot owner.
    pub const INVALID: Self = Self(0);

    /// Wraps a raw transaction id.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// The raw id.
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Whether this is the INVALID sentinel.
    pub const fn is_invalid(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Commit ID (64-bit MVCC timestamp).
///
/// Commit IDs are allocated sequentially starting from 1 when transactions
/// commit. Two sentinels are reserved: 0 is INVALID (used as a tombstone for
/// writes that never became visible) and `u64::MAX` is MAX (the timestamp of
/// a version that is still live, or of an insert that has not committed yet).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommitId(u64);

impl CommitId {
    /// Invalid commit ID (0).
    pub const INVALID: Self = Self(0);

    /// Maximum commit ID: an uncommitted begin or a still-open end.
    pub const MAX: Self = Self(u64::MAX);

    /// Wraps a raw commit id.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// The raw id.
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Whether this is the INVALID sentinel.
    pub const fn is_invalid(&self) -> bool {
        self.0 == 0
    }

    /// Whether this is the MAX sentinel.
    pub const fn is_max(&self) -> bool {
        self.0 == u64::MAX
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
