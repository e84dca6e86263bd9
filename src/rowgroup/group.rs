//! The row group: tiles + MVCC header + column map.

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use super::column_map::ColumnMap;
use super::header::RowGroupHeader;
use super::tile::Tile;
use crate::catalog::{Column, DatabaseId, RowGroupId, TableId};
use crate::datum::Value;
use crate::storage::StorageBackend;
use crate::tuple::Tuple;
use crate::tx::{CommitId, TxId};

/// Physical location of a tuple: `(row group id, slot offset)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemPointer {
    /// The row group holding the tuple.
    pub row_group: RowGroupId,
    /// Slot offset within the row group.
    pub offset: usize,
}

impl ItemPointer {
    /// The reserved invalid pointer.
    pub const INVALID: Self = Self {
        row_group: RowGroupId::INVALID,
        offset: 0,
    };

    /// Creates a pointer to `(row_group, offset)`.
    pub const fn new(row_group: RowGroupId, offset: usize) -> Self {
        Self { row_group, offset }
    }

    /// Returns true if this is the invalid sentinel.
    pub const fn is_invalid(&self) -> bool {
        self.row_group.is_invalid()
    }
}

impl fmt::Display for ItemPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row_group, self.offset)
    }
}

/// A fixed-capacity container of tuple slots, stored across one or more
/// tiles according to a column map, with an MVCC header answering
/// visibility per slot.
#[derive(Debug)]
pub struct RowGroup {
    id: RowGroupId,
    database: DatabaseId,
    table: TableId,
    column_map: ColumnMap,
    tiles: Vec<Tile>,
    header: RowGroupHeader,
}

impl RowGroup {
    /// Creates a row group with the given tile schemas and column map.
    ///
    /// `tile_schemas[t]` describes tile `t`; the column map must address
    /// exactly those tiles and offsets. Each tile reserves its footprint
    /// against `backend`.
    pub fn new(
        database: DatabaseId,
        table: TableId,
        id: RowGroupId,
        tile_schemas: Vec<Vec<Column>>,
        column_map: ColumnMap,
        capacity: usize,
        backend: &Arc<dyn StorageBackend>,
    ) -> Self {
        debug_assert_eq!(tile_schemas.len(), column_map.tile_count());
        let tiles = tile_schemas
            .into_iter()
            .map(|schema| Tile::new(schema, capacity, Arc::clone(backend)))
            .collect();
        Self {
            id,
            database,
            table,
            column_map,
            tiles,
            header: RowGroupHeader::new(capacity),
        }
    }

    /// The row group's id.
    pub fn id(&self) -> RowGroupId {
        self.id
    }

    /// The owning database's id.
    pub fn database_id(&self) -> DatabaseId {
        self.database
    }

    /// The owning table's id.
    pub fn table_id(&self) -> TableId {
        self.table
    }

    /// The MVCC header.
    pub fn header(&self) -> &RowGroupHeader {
        &self.header
    }

    /// The column map.
    pub fn column_map(&self) -> &ColumnMap {
        &self.column_map
    }

    /// High-water mark of claimed slots.
    pub fn next_slot(&self) -> usize {
        self.header.next_slot()
    }

    /// Number of slots this group was allocated with.
    pub fn allocated_count(&self) -> usize {
        self.header.allocated_count()
    }

    /// Number of tiles.
    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// The tile at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn tile(&self, index: usize) -> &Tile {
        &self.tiles[index]
    }

    /// The schemas of all tiles, in tile order.
    pub fn tile_schemas(&self) -> Vec<Vec<Column>> {
        self.tiles.iter().map(|t| t.schema().to_vec()).collect()
    }

    /// Physical location of logical `column`: `(tile index, column offset)`.
    pub fn locate_tile_and_column(&self, column: usize) -> (usize, usize) {
        self.column_map.locate(column)
    }

    /// Inserts `tuple` on behalf of `txn`, claiming a fresh slot.
    ///
    /// Returns the slot offset, or `None` when the group is full. The
    /// insert is uncommitted until the header is finalized.
    pub fn insert(&self, txn: TxId, tuple: &Tuple) -> Option<usize> {
        debug_assert_eq!(tuple.column_count(), self.column_map.column_count());
        let slot = self.header.claim(txn)?;
        for (column, (tile, offset)) in self.column_map.iter() {
            self.tiles[tile].set_value(slot, offset, tuple.value(column).clone());
        }
        trace!(row_group = %self.id, slot, %txn, "inserted tuple");
        Some(slot)
    }

    /// Deletes `slot` on behalf of `(txn, last_commit_id)`.
    ///
    /// Pure header operation; tile data is untouched. Returns false when
    /// the slot is latched by another transaction or already deleted.
    pub fn delete(&self, txn: TxId, slot: usize, last_commit_id: CommitId) -> bool {
        let deleted = self.header.delete(txn, slot, last_commit_id);
        if deleted {
            trace!(row_group = %self.id, slot, %txn, "deleted tuple");
        }
        deleted
    }

    /// MVCC visibility of `slot` as seen by `(txn, last_commit_id)`.
    pub fn is_visible(&self, slot: usize, txn: TxId, last_commit_id: CommitId) -> bool {
        self.header.is_visible(slot, txn, last_commit_id)
    }

    /// Reads the value of logical `column` at `slot`.
    pub fn value(&self, slot: usize, column: usize) -> Value {
        let (tile, offset) = self.column_map.locate(column);
        self.tiles[tile].value(slot, offset)
    }

    /// Copies `other`'s MVCC header state into this group's header.
    pub fn copy_header_from(&self, other: &RowGroup) {
        self.header.copy_from(other.header());
    }
}
