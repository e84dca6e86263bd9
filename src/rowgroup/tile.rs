//! Tiles: column-groups within a row group.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::catalog::Column;
use crate::datum::Value;
use crate::storage::StorageBackend;

/// Estimated width for variable-length columns when reserving storage.
const VAR_LEN_WIDTH: usize = 16;

/// One column-group of a row group: a fixed-capacity, column-major value
/// store for a contiguous subset of the table's columns, described by its
/// own tile schema.
///
/// Tiles reserve their estimated footprint with the storage backend at
/// construction and release it when dropped.
pub struct Tile {
    schema: Vec<Column>,
    capacity: usize,
    /// `columns[offset][slot]`, pre-sized to capacity with NULLs.
    columns: RwLock<Vec<Vec<Value>>>,
    backend: Arc<dyn StorageBackend>,
    footprint: usize,
}

impl Tile {
    /// Creates a tile for `schema` with room for `capacity` slots.
    pub fn new(schema: Vec<Column>, capacity: usize, backend: Arc<dyn StorageBackend>) -> Self {
        let row_width: usize = schema
            .iter()
            .map(|c| c.data_type().fixed_size().unwrap_or(VAR_LEN_WIDTH))
            .sum();
        let footprint = row_width * capacity;
        backend.reserve(footprint);

        let columns = (0..schema.len())
            .map(|_| vec![Value::Null; capacity])
            .collect();

        Self {
            schema,
            capacity,
            columns: RwLock::new(columns),
            backend,
            footprint,
        }
    }

    /// The tile's schema (the columns it holds, in tile order).
    pub fn schema(&self) -> &[Column] {
        &self.schema
    }

    /// Number of columns in this tile.
    pub fn column_count(&self) -> usize {
        self.schema.len()
    }

    /// Number of slots this tile was allocated with.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Reads the value at `(slot, column_offset)`.
    ///
    /// # Panics
    ///
    /// Panics if `slot` or `column_offset` is out of bounds.
    pub fn value(&self, slot: usize, column_offset: usize) -> Value {
        self.columns.read()[column_offset][slot].clone()
    }

    /// Writes the value at `(slot, column_offset)`.
    ///
    /// # Panics
    ///
    /// Panics if `slot` or `column_offset` is out of bounds.
    pub fn set_value(&self, slot: usize, column_offset: usize, value: Value) {
        self.columns.write()[column_offset][slot] = value;
    }
}

impl Drop for Tile {
    fn drop(&mut self) {
        self.backend.release(self.footprint);
    }
}

impl fmt::Debug for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tile")
            .field("schema", &self.schema)
            .field("capacity", &self.capacity)
            .field("columns", &self.columns)
            .field("footprint", &self.footprint)
            .finish_non_exhaustive()
    }
}
