//! Online row-group reorganization.
//!
//! [`Table::transform_row_group`] rewrites a row group under a new
//! column-to-tile mapping (typically migrating a hot row group from row
//! storage to a column grouping) and atomically rebinds the directory
//! entry so new lookups observe the rewritten group. Slot indices and MVCC
//! state are preserved exactly, so readers that already resolved the old
//! group keep getting consistent answers.
//!
//! Transformation is only safe on row groups at steady state: the group
//! must not be the table's insertion tail, or the copy races with ongoing
//! inserts. Selecting such a group is the caller's responsibility.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, warn};

use super::core::Table;
use super::error::TableError;
use crate::catalog::{Column, RowGroupId};
use crate::rowgroup::{ColumnMap, RowGroup};

/// Derives the tile schemas of the transformed row group.
///
/// Each mapped column's descriptor is copied from wherever it lives in the
/// original group into its new `(tile, offset)` position; per-tile columns
/// are collated in ascending offset order and tiles emitted in ascending
/// tile order. The map must use contiguous tile indices starting at 0.
fn transformed_tile_schemas(group: &RowGroup, column_map: &ColumnMap) -> Vec<Vec<Column>> {
    let orig_schemas = group.tile_schemas();

    let mut collated: BTreeMap<usize, BTreeMap<usize, Column>> = BTreeMap::new();
    for (column, (new_tile, new_offset)) in column_map.iter() {
        let (orig_tile, orig_offset) = group.locate_tile_and_column(column);
        let descriptor = orig_schemas[orig_tile][orig_offset].clone();
        collated
            .entry(new_tile)
            .or_default()
            .insert(new_offset, descriptor);
    }

    collated
        .into_values()
        .map(|tile| tile.into_values().collect())
        .collect()
}

/// Copies `orig` into `transformed` column-at-a-time, then copies the MVCC
/// header so visibility answers are identical slot for slot.
fn copy_row_group(orig: &RowGroup, transformed: &RowGroup) {
    let column_count = transformed.column_map().column_count();
    debug_assert_eq!(column_count, orig.column_map().column_count());

    let tuple_count = orig.allocated_count();
    for column in 0..column_count {
        let (orig_tile, orig_offset) = orig.locate_tile_and_column(column);
        let (new_tile, new_offset) = transformed.locate_tile_and_column(column);
        let source = orig.tile(orig_tile);
        let target = transformed.tile(new_tile);
        for slot in 0..tuple_count {
            target.set_value(slot, new_offset, source.value(slot, orig_offset));
        }
    }

    transformed.copy_header_from(orig);
}

impl Table {
    /// Rewrites row group `row_group_id` under `column_map`.
    ///
    /// Allocates a new row group with the same id, capacity, and identity,
    /// copies every column value and the MVCC header across, and rebinds
    /// the directory entry. The table's id list is untouched: it stores
    /// ids, and the id survives.
    ///
    /// With `cleanup` the old group is released and destroyed once the last
    /// outstanding reference drops; without it the old group is retired but
    /// kept alive.
    pub fn transform_row_group(
        &self,
        row_group_id: RowGroupId,
        column_map: ColumnMap,
        cleanup: bool,
    ) -> Result<Arc<RowGroup>, TableError> {
        {
            let lists = self.lists.lock();
            if !lists.row_groups.contains(&row_group_id) {
                warn!(table = %self.id(), row_group = %row_group_id, "row group not in table");
                return Err(TableError::RowGroupNotFound(row_group_id));
            }
        }

        let group = self
            .directory()
            .lookup(row_group_id)
            .expect("row group not in directory - this is a bug");

        let tile_schemas = transformed_tile_schemas(&group, &column_map);
        let transformed = Arc::new(RowGroup::new(
            group.database_id(),
            group.table_id(),
            row_group_id,
            tile_schemas,
            column_map,
            group.allocated_count(),
            self.backend(),
        ));

        copy_row_group(&group, &transformed);

        self.directory()
            .rebind(row_group_id, Arc::clone(&transformed));

        if !cleanup {
            self.retired.lock().push(Arc::clone(&group));
        }
        debug!(
            table = %self.id(),
            row_group = %row_group_id,
            tiles = transformed.tile_count(),
            cleanup,
            "transformed row group"
        );

        Ok(transformed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{DatabaseId, RowGroupDirectory, Schema, TableId};
    use crate::datum::{Type, Value};
    use crate::storage::{MemoryBackend, StorageBackend};
    use crate::tuple::Tuple;
    use crate::tx::{CommitId, TransactionManager, TxId};

    fn sample_table(backend: Arc<MemoryBackend>) -> Table {
        Table::new(
            DatabaseId::new(1),
            TableId::new(1),
            "accounts",
            Schema::new(vec![
                Column::new("id", Type::Int4, false),
                Column::new("name", Type::Varchar, true),
            ]),
            4,
            Arc::new(RowGroupDirectory::new()),
            backend,
        )
    }

    fn row(id: i32, name: &str) -> Tuple {
        Tuple::new(vec![Value::Int32(id), Value::Text(name.into())])
    }

    /// One column per tile: `{0 → (0,0), 1 → (1,0)}`.
    fn columnar_map() -> ColumnMap {
        ColumnMap::new(vec![(0, 0), (1, 0)])
    }

    #[test]
    fn test_unknown_row_group() {
        let table = sample_table(Arc::new(MemoryBackend::new()));
        let err = table
            .transform_row_group(RowGroupId::new(999), columnar_map(), true)
            .unwrap_err();
        assert_eq!(err, TableError::RowGroupNotFound(RowGroupId::new(999)));
    }

    #[test]
    fn test_transform_preserves_values_and_visibility() {
        let table = sample_table(Arc::new(MemoryBackend::new()));
        let manager = TransactionManager::new();
        let txn = manager.begin();

        let mut pointers = Vec::new();
        for i in 0..4 {
            pointers.push(table.get_tuple_slot(&txn, &row(i, "v")).unwrap());
        }
        let group_id = pointers[0].row_group;
        let old_group = table.directory().lookup(group_id).unwrap();
        // Commit two of the four inserts, delete one of the committed
        let cid = manager.commit(&txn);
        old_group.header().commit_insert(0, cid);
        old_group.header().commit_insert(1, cid);
        let deleter = manager.begin();
        assert!(old_group.delete(deleter.transaction_id(), 1, deleter.last_commit_id()));

        let transformed = table
            .transform_row_group(group_id, columnar_map(), true)
            .unwrap();

        assert_eq!(transformed.id(), group_id);
        assert_eq!(transformed.tile_count(), 2);
        assert_eq!(transformed.locate_tile_and_column(1), (1, 0));
        assert_eq!(
            transformed.tile_schemas(),
            vec![
                vec![Column::new("id", Type::Int4, false)],
                vec![Column::new("name", Type::Varchar, true)],
            ]
        );

        // Values preserved per (slot, column)
        for slot in 0..4 {
            for column in 0..2 {
                assert_eq!(
                    transformed.value(slot, column),
                    old_group.value(slot, column)
                );
            }
        }
        // Visibility preserved per slot, for several observers
        for slot in 0..4 {
            for observer in [txn.transaction_id(), deleter.transaction_id(), TxId::new(99)] {
                for horizon in [CommitId::new(0), cid, CommitId::new(cid.as_u64() + 1)] {
                    assert_eq!(
                        transformed.is_visible(slot, observer, horizon),
                        old_group.is_visible(slot, observer, horizon),
                        "slot {} observer {} horizon {}",
                        slot,
                        observer,
                        horizon
                    );
                }
            }
        }

        // New lookups resolve to the transformed group
        let resolved = table.directory().lookup(group_id).unwrap();
        assert!(Arc::ptr_eq(&resolved, &transformed));
    }

    #[test]
    fn test_cleanup_releases_old_group_storage() {
        let backend = Arc::new(MemoryBackend::new());
        let table = sample_table(Arc::clone(&backend));
        let group_id = table.row_group(0).unwrap().id();

        let before = backend.reserved_bytes();
        let transformed = table
            .transform_row_group(group_id, columnar_map(), true)
            .unwrap();
        // Same columns, same capacity: the new group reserves what the old
        // one held, and the old reservation is gone
        assert_eq!(backend.reserved_bytes(), before);
        drop(transformed);
    }

    #[test]
    fn test_no_cleanup_retires_old_group() {
        let backend = Arc::new(MemoryBackend::new());
        let table = sample_table(Arc::clone(&backend));
        let group_id = table.row_group(0).unwrap().id();

        let before = backend.reserved_bytes();
        table
            .transform_row_group(group_id, columnar_map(), false)
            .unwrap();
        // Old group is retired, not destroyed: both reservations live
        assert_eq!(backend.reserved_bytes(), before * 2);
    }

    #[test]
    fn test_transform_back_to_row_layout() {
        let table = sample_table(Arc::new(MemoryBackend::new()));
        let manager = TransactionManager::new();
        let txn = manager.begin();
        table.get_tuple_slot(&txn, &row(7, "x")).unwrap();
        let group_id = table.row_group(0).unwrap().id();

        table
            .transform_row_group(group_id, columnar_map(), true)
            .unwrap();
        let restored = table
            .transform_row_group(group_id, ColumnMap::row_layout(2), true)
            .unwrap();

        assert_eq!(restored.tile_count(), 1);
        assert_eq!(restored.value(0, 0), Value::Int32(7));
        assert_eq!(restored.value(0, 1), Value::Text("x".into()));
        assert!(restored.is_visible(0, txn.transaction_id(), txn.last_commit_id()));
    }
}
