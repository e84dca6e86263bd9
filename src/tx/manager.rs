//! Transaction handles and identifier allocation.

use std::sync::atomic::{AtomicU64, Ordering};

use super::types::{CommitId, TxId};

/// A transaction handle, as seen by the storage core.
///
/// Carries the two MVCC facts every table operation needs: the transaction's
/// own identifier (its writes are visible to itself) and the newest commit
/// timestamp that was durable when the transaction began (everything at or
/// below it is visible).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transaction {
    id: TxId,
    last_commit_id: CommitId,
}

impl Transaction {
    /// Creates a transaction handle from raw identifiers.
    ///
    /// Normally obtained from [`TransactionManager::begin`]; this constructor
    /// exists for callers that carry their own transaction management.
    pub fn new(id: TxId, last_commit_id: CommitId) -> Self {
        Self { id, last_commit_id }
    }

    /// The transaction's identifier.
    pub fn transaction_id(&self) -> TxId {
        self.id
    }

    /// The newest commit timestamp visible to this transaction.
    pub fn last_commit_id(&self) -> CommitId {
        self.last_commit_id
    }
}

/// Mints transaction identifiers and commit timestamps.
///
/// This is the minimal allocation surface the storage core needs; it does
/// not track per-transaction write sets or drive commit finalization on
/// row-group headers. That orchestration belongs to the engine above.
pub struct TransactionManager {
    /// Next transaction ID to allocate. Starts at 1 (0 is INVALID).
    next_txid: AtomicU64,
    /// Next commit ID to allocate. Starts at 1 (0 is INVALID).
    next_commit_id: AtomicU64,
    /// Newest commit ID handed out, observed by new transactions.
    last_commit_id: AtomicU64,
}

impl TransactionManager {
    /// Creates a new transaction manager.
    pub fn new() -> Self {
        Self {
            next_txid: AtomicU64::new(1),
            next_commit_id: AtomicU64::new(1),
            last_commit_id: AtomicU64::new(0),
        }
    }

    /// Begins a new transaction.
    ///
    /// Allocates a fresh TxId and captures the newest committed timestamp as
    /// the transaction's visibility horizon.
    pub fn begin(&self) -> Transaction {
        let id = TxId::new(self.next_txid.fetch_add(1, Ordering::Relaxed));
        let last_commit_id = CommitId::new(self.last_commit_id.load(Ordering::Acquire));
        Transaction::new(id, last_commit_id)
    }

    /// Mints a commit timestamp for a committing transaction and publishes
    /// it as the newest committed state.
    ///
    /// The caller is responsible for finalizing the transaction's writes on
    /// the affected row-group headers with the returned id.
    pub fn commit(&self, _txn: &Transaction) -> CommitId {
        let cid = self.next_commit_id.fetch_add(1, Ordering::Relaxed);
        self.last_commit_id.store(cid, Ordering::Release);
        CommitId::new(cid)
    }
}

impl Default for TransactionManager {
    fn default() -> Self {
        Self::new()
    }
}
