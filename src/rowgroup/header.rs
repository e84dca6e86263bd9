//! Per-slot MVCC header for a row group.
//!
//! Each allocated slot carries three facts:
//! - `owner`: the transaction currently holding an uncommitted write on the
//!   slot (the inserter until its insert commits, or a deleter's latch), or
//!   INVALID when no write is pending.
//! - `begin`: the commit id at which the version became visible; MAX while
//!   the insert is uncommitted.
//! - `end`: the commit id at which the version ceased to be visible; MAX
//!   while the version is live, INVALID when the version was tombstoned
//!   without ever committing (self-deleted or aborted insert).
//!
//! Slot allocation uses an atomic high-water mark: claimers race on a
//! fetch-add and a loser past capacity simply fails, leaving growth to the
//! table. Commit and abort finalization are driven from outside; the header
//! only records state transitions.

use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::tx::{CommitId, TxId};

/// MVCC state of one tuple slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SlotState {
    owner: TxId,
    begin: CommitId,
    end: CommitId,
}

impl SlotState {
    const EMPTY: Self = Self {
        owner: TxId::INVALID,
        begin: CommitId::MAX,
        end: CommitId::MAX,
    };
}

/// MVCC header of a row group: fixed slot capacity, an allocation
/// high-water mark, and per-slot version state.
#[derive(Debug)]
pub struct RowGroupHeader {
    capacity: usize,
    /// Claim counter; may run past `capacity` when claimers lose the race.
    claimed: AtomicUsize,
    slots: Mutex<Vec<SlotState>>,
}

impl RowGroupHeader {
    /// Creates a header with `capacity` slots, all unallocated.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            claimed: AtomicUsize::new(0),
            slots: Mutex::new(vec![SlotState::EMPTY; capacity]),
        }
    }

    /// Number of slots this header was allocated with.
    pub fn allocated_count(&self) -> usize {
        self.capacity
    }

    /// High-water mark of claimed slots, capped at capacity.
    pub fn next_slot(&self) -> usize {
        self.claimed.load(Ordering::Acquire).min(self.capacity)
    }

    /// Claims a fresh slot for an insert by `txn`.
    ///
    /// Returns the slot offset, or `None` when the header is full. The slot
    /// is owned by `txn` with an uncommitted begin until
    /// [`commit_insert`](Self::commit_insert) or
    /// [`abort_write`](Self::abort_write) finalizes it.
    pub fn claim(&self, txn: TxId) -> Option<usize> {
        let slot = self.claimed.fetch_add(1, Ordering::AcqRel);
        if slot >= self.capacity {
            return None;
        }
        let mut slots = self.slots.lock();
        slots[slot] = SlotState {
            owner: txn,
            begin: CommitId::MAX,
            end: CommitId::MAX,
        };
        Some(slot)
    }

    /// MVCC visibility check for `slot` as seen by `(txn, last_commit_id)`.
    ///
    /// A transaction sees its own uncommitted insert (unless it deleted it
    /// again) and every committed version whose `[begin, end)` interval
    /// contains its visibility horizon. A committed tuple the transaction
    /// has latched for delete is already invisible to that transaction,
    /// while other transactions keep seeing it until the delete commits.
    pub fn is_visible(&self, slot: usize, txn: TxId, last_commit_id: CommitId) -> bool {
        if slot >= self.next_slot() {
            return false;
        }
        let state = self.slots.lock()[slot];
        if state.owner == txn && !txn.is_invalid() {
            // Own pending write: a live uncommitted insert is visible; a
            // self-deleted insert or a delete latch on a committed tuple
            // is not.
            state.begin.is_max() && state.end.is_max()
        } else {
            !state.begin.is_max() && state.begin <= last_commit_id && last_commit_id < state.end
        }
    }

    /// Attempts to delete `slot` on behalf of `txn`.
    ///
    /// Fails (returns false) when the slot is unallocated, latched by
    /// another transaction, already deleted by `txn` itself, already
    /// deleted by a committed transaction, or not visible to `txn` in the
    /// first place. On success the slot is latched by `txn` (or tombstoned
    /// outright when `txn` deletes its own uncommitted insert) until
    /// [`commit_delete`](Self::commit_delete) or
    /// [`abort_write`](Self::abort_write) finalizes it.
    pub fn delete(&self, txn: TxId, slot: usize, last_commit_id: CommitId) -> bool {
        if slot >= self.next_slot() {
            return false;
        }
        let mut slots = self.slots.lock();
        let state = &mut slots[slot];

        if !state.owner.is_invalid() && state.owner != txn {
            // Latched by another transaction
            return false;
        }
        if !state.end.is_max() {
            // Already deleted: committed, tombstoned, or pending by us
            return false;
        }
        if state.owner == txn {
            if state.begin.is_max() {
                // Deleting our own uncommitted insert: tombstone in place
                state.end = CommitId::INVALID;
                true
            } else {
                // Already latched by us for delete
                false
            }
        } else {
            if state.begin.is_max() || state.begin > last_commit_id {
                // Version not visible to us
                return false;
            }
            state.owner = txn;
            true
        }
    }

    /// Finalizes a committed insert: the version becomes visible at `cid`
    /// and the owner latch is released.
    pub fn commit_insert(&self, slot: usize, cid: CommitId) {
        let mut slots = self.slots.lock();
        let state = &mut slots[slot];
        state.begin = cid;
        state.owner = TxId::INVALID;
    }

    /// Finalizes a committed delete: the version ceases at `cid` and the
    /// owner latch is released.
    pub fn commit_delete(&self, slot: usize, cid: CommitId) {
        let mut slots = self.slots.lock();
        let state = &mut slots[slot];
        state.end = cid;
        state.owner = TxId::INVALID;
    }

    /// Rolls back the pending write on `slot`.
    ///
    /// An uncommitted insert is tombstoned; a delete latch on a committed
    /// tuple is released, restoring the version.
    pub fn abort_write(&self, slot: usize) {
        let mut slots = self.slots.lock();
        let state = &mut slots[slot];
        if state.begin.is_max() {
            // Aborted insert: tombstone so no reader ever sees the slot
            state.end = CommitId::INVALID;
        }
        // A delete latch is simply released; the version stays live
        state.owner = TxId::INVALID;
    }

    /// Overwrites this header's state with a bitwise copy of `other`.
    ///
    /// Used by reorganization: the rewritten row group must answer
    /// visibility exactly as the original did, slot for slot.
    ///
    /// # Panics
    ///
    /// Panics if the capacities differ.
    pub fn copy_from(&self, other: &RowGroupHeader) {
        assert_eq!(self.capacity, other.capacity, "header capacity mismatch");
        let source = other.slots.lock().clone();
        let claimed = other.claimed.load(Ordering::Acquire);
        *self.slots.lock() = source;
        self.claimed.store(claimed, Ordering::Release);
    }
}
