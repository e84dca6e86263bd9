//! Insert, update, and delete paths.
//!
//! Inserts claim a heap slot, enforce primary/unique constraints against
//! visible index entries, then record the new pointer in every index.
//! Updates allocate a fresh slot for the new version and try a same-key
//! repoint across all indexes first, falling back to fresh index insertion
//! when any key changed. Deletes are pure header operations; index entries
//! are left behind and filtered by visibility at scan time.

use tracing::{trace, warn};

use super::core::Table;
use super::error::TableError;
use crate::catalog::RowGroupDirectory;
use crate::rowgroup::ItemPointer;
use crate::tuple::Tuple;
use crate::tx::Transaction;

/// Returns true if any of `locations` is visible to `txn`.
///
/// Pointers into unresolved row groups are skipped; an index can carry
/// entries for groups that were dropped with their table.
fn contains_visible_entry(
    directory: &RowGroupDirectory,
    locations: &[ItemPointer],
    txn: &Transaction,
) -> bool {
    locations.iter().any(|location| {
        directory
            .lookup(location.row_group)
            .map(|group| {
                group.is_visible(
                    location.offset,
                    txn.transaction_id(),
                    txn.last_commit_id(),
                )
            })
            .unwrap_or(false)
    })
}

impl Table {
    /// Inserts `tuple` on behalf of `txn`.
    ///
    /// Claims a heap slot, enforces primary/unique constraints against
    /// visible index entries, records the pointer in every index, and bumps
    /// the row counters.
    ///
    /// On a unique violation the claimed slot is *not* reclaimed: it stays
    /// allocated, but no index entry points to it and its insert never
    /// commits, so it is unreachable.
    pub fn insert_tuple(
        &self,
        txn: &Transaction,
        tuple: &Tuple,
    ) -> Result<ItemPointer, TableError> {
        let location = self.get_tuple_slot(txn, tuple)?;
        trace!(table = %self.id(), %location, "inserting tuple");

        self.insert_in_indexes(txn, tuple, location, true)?;

        self.stats.increase_row_count(1);
        for index in self.index_snapshot() {
            index.increase_row_count(1);
        }

        Ok(location)
    }

    /// Updates a tuple to a new version at a fresh heap slot.
    ///
    /// The common case is a same-key update: every index already has an
    /// entry for the new tuple's key and repoints it to the new location.
    /// If any index reports a missing key, the update degrades to a fresh
    /// index insertion for the already-claimed slot, without the uniqueness
    /// pre-check: that check would self-conflict against the key the
    /// repoint attempt just touched.
    pub fn update_tuple(
        &self,
        txn: &Transaction,
        tuple: &Tuple,
    ) -> Result<ItemPointer, TableError> {
        let location = self.get_tuple_slot(txn, tuple)?;
        trace!(table = %self.id(), %location, "updating tuple");

        if self.update_in_indexes(tuple, location) {
            return Ok(location);
        }
        self.insert_in_indexes(txn, tuple, location, false)?;
        Ok(location)
    }

    /// Deletes the tuple at `location`.
    ///
    /// Pure row-group header operation; indexes are not touched, and stale
    /// pointers are filtered by visibility later. Returns false when the
    /// slot is latched by another transaction or carries a committed
    /// delete; the caller must respect that.
    pub fn delete_tuple(&self, txn: &Transaction, location: ItemPointer) -> bool {
        let Some(group) = self.directory().lookup(location.row_group) else {
            warn!(table = %self.id(), %location, "delete against unknown row group");
            return false;
        };

        let deleted = group.delete(
            txn.transaction_id(),
            location.offset,
            txn.last_commit_id(),
        );
        if !deleted {
            warn!(table = %self.id(), %location, "failed to delete tuple");
            return false;
        }

        self.stats.decrease_row_count(1);
        true
    }

    /// Records `location` under `tuple`'s key in every index, enforcing
    /// primary/unique visibility first when `check_visibility` is set.
    ///
    /// The existence check and the insertions are not atomic across
    /// indexes; two concurrent inserters of the same key can both pass the
    /// check. Serializability on top of this is the transaction manager's
    /// concern.
    ///
    /// # Panics
    ///
    /// Panics if an index insert fails after its constraint check passed.
    fn insert_in_indexes(
        &self,
        txn: &Transaction,
        tuple: &Tuple,
        location: ItemPointer,
        check_visibility: bool,
    ) -> Result<(), TableError> {
        let indexes = self.index_snapshot();

        if check_visibility {
            for index in indexes.iter().rev() {
                if !index.constraint().requires_unique() {
                    continue;
                }
                let key = index.key_for(tuple);
                let locations = index.scan(&key);
                if contains_visible_entry(self.directory(), &locations, txn) {
                    warn!(
                        table = %self.id(),
                        index = index.name(),
                        "a visible index entry exists"
                    );
                    return Err(TableError::UniqueViolation {
                        index: index.name().to_string(),
                    });
                }
            }
        }

        for index in indexes.iter().rev() {
            let key = index.key_for(tuple);
            let inserted = index.insert(key, location);
            assert!(
                inserted,
                "index {} rejected entry after constraint check",
                index.name()
            );
        }

        Ok(())
    }

    /// Attempts a same-key repoint of `tuple`'s keys to `location` across
    /// all indexes. Returns false as soon as any index has no entry for
    /// the key.
    fn update_in_indexes(&self, tuple: &Tuple, location: ItemPointer) -> bool {
        for index in self.index_snapshot() {
            let key = index.key_for(tuple);
            if !index.update(&key, location) {
                trace!(
                    table = %self.id(),
                    index = index.name(),
                    "same-key index update missed"
                );
                return false;
            }
        }
        true
    }
}
