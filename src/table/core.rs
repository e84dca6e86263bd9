//! The table: identity, slot acquisition, growth, and list management.

use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{trace, warn};

use super::error::TableError;
use super::indexes::IndexSet;
use super::stats::TableStats;
use crate::catalog::{
    Constraint, ConstraintKind, DatabaseId, ForeignKey, IndexId, RowGroupDirectory, RowGroupId,
    Schema, TableId,
};
use crate::index::Index;
use crate::rowgroup::{ColumnMap, ItemPointer, RowGroup};
use crate::storage::StorageBackend;
use crate::tuple::Tuple;
use crate::tx::Transaction;

/// The three lists guarded by the table mutex.
pub(super) struct TableLists {
    /// Row-group ids in append order; the tail is the insertion target.
    pub row_groups: Vec<RowGroupId>,
    pub indexes: IndexSet,
    pub foreign_keys: Vec<ForeignKey>,
}

/// A table: a growing sequence of fixed-capacity row groups plus the
/// secondary indexes and foreign keys defined over them.
///
/// One mutex guards the row-group id list, the index set, and the
/// foreign-key list. It is never held across row-group header operations or
/// index operations; those synchronize themselves.
pub struct Table {
    database: DatabaseId,
    id: TableId,
    name: String,
    /// Immutable after construction except for foreign-key constraint
    /// attachment, which happens under the table mutex.
    schema: RwLock<Schema>,
    tuples_per_row_group: usize,
    directory: Arc<RowGroupDirectory>,
    backend: Arc<dyn StorageBackend>,
    pub(super) lists: Mutex<TableLists>,
    pub(super) stats: TableStats,
    /// Row groups replaced by a reorganization with cleanup disabled; kept
    /// alive so outstanding references stay valid.
    pub(super) retired: Mutex<Vec<Arc<RowGroup>>>,
}

impl Table {
    /// Creates a table and seeds it with its first row group.
    ///
    /// # Panics
    ///
    /// Panics if `tuples_per_row_group` is zero.
    pub fn new(
        database: DatabaseId,
        id: TableId,
        name: impl Into<String>,
        schema: Schema,
        tuples_per_row_group: usize,
        directory: Arc<RowGroupDirectory>,
        backend: Arc<dyn StorageBackend>,
    ) -> Self {
        assert!(tuples_per_row_group > 0, "row groups need at least one slot");
        let table = Self {
            database,
            id,
            name: name.into(),
            schema: RwLock::new(schema),
            tuples_per_row_group,
            directory,
            backend,
            lists: Mutex::new(TableLists {
                row_groups: Vec::new(),
                indexes: IndexSet::new(),
                foreign_keys: Vec::new(),
            }),
            stats: TableStats::new(),
            retired: Mutex::new(Vec::new()),
        };
        table.add_default_row_group();
        table
    }

    /// The owning database's id.
    pub fn database_id(&self) -> DatabaseId {
        self.database
    }

    /// The table's id.
    pub fn id(&self) -> TableId {
        self.id
    }

    /// The table's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Slot capacity of every row group this table creates.
    pub fn tuples_per_row_group(&self) -> usize {
        self.tuples_per_row_group
    }

    /// The row-group directory this table resolves through.
    pub fn directory(&self) -> &Arc<RowGroupDirectory> {
        &self.directory
    }

    /// The storage backend handle.
    pub fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.backend
    }

    /// A copy of the table schema.
    pub fn schema(&self) -> Schema {
        self.schema.read().clone()
    }

    //===------------------------------------------------------------===//
    // Slot acquisition
    //===------------------------------------------------------------===//

    /// Checks tuple integrity and claims a heap slot, growing the table if
    /// the tail row group is full.
    ///
    /// The tail snapshot taken under the mutex may go stale before the
    /// insert attempt; that is benign, because inserting into a full row
    /// group simply fails and the loop retries against the new tail.
    pub fn get_tuple_slot(
        &self,
        txn: &Transaction,
        tuple: &Tuple,
    ) -> Result<ItemPointer, TableError> {
        self.check_constraints(tuple)?;

        let txn_id = txn.transaction_id();
        loop {
            let tail_id = {
                let lists = self.lists.lock();
                *lists
                    .row_groups
                    .last()
                    .expect("table has no row groups - this is a bug")
            };
            let tail = self
                .directory
                .lookup(tail_id)
                .expect("row group not in directory - this is a bug");

            if let Some(slot) = tail.insert(txn_id, tuple) {
                trace!(table = %self.id, row_group = %tail_id, slot, "claimed tuple slot");
                return Ok(ItemPointer::new(tail_id, slot));
            }
            self.add_default_row_group();
        }
    }

    /// Every non-nullable column must be non-null.
    ///
    /// # Panics
    ///
    /// Panics if the tuple's column count does not match the schema;
    /// conformance is the caller's precondition.
    fn check_constraints(&self, tuple: &Tuple) -> Result<(), TableError> {
        let schema = self.schema.read();
        assert_eq!(
            schema.column_count(),
            tuple.column_count(),
            "tuple does not conform to table schema"
        );

        for column in (0..schema.column_count()).rev() {
            if tuple.is_null(column) && !schema.allows_null(column) {
                let name = schema.column(column).name().to_string();
                trace!(table = %self.id, column = %name, "NOT NULL constraint violated");
                return Err(TableError::ConstraintViolation { column: name });
            }
        }
        Ok(())
    }

    //===------------------------------------------------------------===//
    // Row groups
    //===------------------------------------------------------------===//

    /// Grows the table by one default-layout row group, unless another
    /// writer already did.
    ///
    /// The candidate is pre-minted outside the mutex. Under the mutex the
    /// tail is re-checked: if it still has free slots, some other inserter
    /// won the growth race and the candidate is discarded (its id is never
    /// registered). Returns the new row group's id, or INVALID when the
    /// candidate was discarded.
    pub fn add_default_row_group(&self) -> RowGroupId {
        let candidate_id = self.directory.mint_id();
        let candidate = {
            let schema = self.schema.read();
            let column_map = ColumnMap::row_layout(schema.column_count());
            Arc::new(RowGroup::new(
                self.database,
                self.id,
                candidate_id,
                vec![schema.columns().to_vec()],
                column_map,
                self.tuples_per_row_group,
                &self.backend,
            ))
        };

        let mut lists = self.lists.lock();

        if let Some(&tail_id) = lists.row_groups.last() {
            let tail = self
                .directory
                .lookup(tail_id)
                .expect("row group not in directory - this is a bug");
            if tail.next_slot() < tail.allocated_count() {
                trace!(
                    table = %self.id,
                    tail = %tail_id,
                    "tail row group has free slots; discarding growth candidate"
                );
                return RowGroupId::INVALID;
            }
        }

        lists.row_groups.push(candidate_id);
        self.directory.register(candidate_id, candidate);
        trace!(table = %self.id, row_group = %candidate_id, "added row group");
        candidate_id
    }

    /// Appends an externally built row group.
    pub fn add_row_group(&self, group: Arc<RowGroup>) {
        let mut lists = self.lists.lock();
        let id = group.id();
        lists.row_groups.push(id);
        self.directory.register(id, group);
        trace!(table = %self.id, row_group = %id, "added row group");
    }

    /// Number of row groups.
    pub fn row_group_count(&self) -> usize {
        self.lists.lock().row_groups.len()
    }

    /// Resolves the row group at `offset` in append order.
    pub fn row_group(&self, offset: usize) -> Option<Arc<RowGroup>> {
        let id = *self.lists.lock().row_groups.get(offset)?;
        self.directory.lookup(id)
    }

    /// Resolves a row group of this table by id.
    pub fn row_group_by_id(&self, id: RowGroupId) -> Option<Arc<RowGroup>> {
        if !self.lists.lock().row_groups.contains(&id) {
            return None;
        }
        self.directory.lookup(id)
    }

    /// The row-group ids in append order.
    pub fn row_group_ids(&self) -> Vec<RowGroupId> {
        self.lists.lock().row_groups.clone()
    }

    //===------------------------------------------------------------===//
    // Indexes
    //===------------------------------------------------------------===//

    /// Appends an index.
    pub fn add_index(&self, index: Arc<Index>) {
        self.lists.lock().indexes.add(index);
    }

    /// The index at `offset` in addition order.
    pub fn get_index_by_offset(&self, offset: usize) -> Option<Arc<Index>> {
        self.lists.lock().indexes.get(offset)
    }

    /// The index with `id`.
    pub fn get_index_by_id(&self, id: IndexId) -> Option<Arc<Index>> {
        self.lists.lock().indexes.get_by_id(id)
    }

    /// Drops the index with `id` from the table's list.
    ///
    /// The index object itself lives on for as long as anyone holds it.
    pub fn drop_index_by_id(&self, id: IndexId) -> Option<Arc<Index>> {
        let dropped = self.lists.lock().indexes.remove_by_id(id);
        if dropped.is_none() {
            warn!(table = %self.id, index = %id, "drop of unknown index");
        }
        dropped
    }

    /// Number of indexes.
    pub fn index_count(&self) -> usize {
        self.lists.lock().indexes.len()
    }

    /// Whether any index carries the primary-key constraint.
    pub fn has_primary_key(&self) -> bool {
        self.lists.lock().indexes.has_primary_key()
    }

    /// Number of unique (non-primary) indexes.
    pub fn unique_constraint_count(&self) -> usize {
        self.lists.lock().indexes.unique_constraint_count()
    }

    /// Snapshot of the indexes, taken under the table mutex; write paths
    /// operate on the snapshot outside the mutex.
    pub(super) fn index_snapshot(&self) -> Vec<Arc<Index>> {
        self.lists.lock().indexes.snapshot()
    }

    //===------------------------------------------------------------===//
    // Foreign keys
    //===------------------------------------------------------------===//

    /// Adds a foreign key, deep-copying the descriptor and attaching a
    /// foreign constraint to each named source column of the schema.
    ///
    /// This is the only schema mutation after construction.
    pub fn add_foreign_key(&self, key: &ForeignKey) {
        let mut lists = self.lists.lock();
        let fk_offset = lists.foreign_keys.len();
        let constraint = Constraint::new(
            key.constraint_name(),
            ConstraintKind::Foreign { fk_offset },
        );

        let mut schema = self.schema.write();
        for column in key.source_columns() {
            let attached = schema.add_constraint(column, constraint.clone());
            debug_assert!(attached, "foreign key names unknown column {}", column);
        }
        drop(schema);

        lists.foreign_keys.push(key.clone());
    }

    /// The foreign key at `offset` in addition order.
    pub fn get_foreign_key(&self, offset: usize) -> Option<ForeignKey> {
        self.lists.lock().foreign_keys.get(offset).cloned()
    }

    /// Drops the foreign key at `offset`.
    ///
    /// Constraints already attached to schema columns are left in place.
    pub fn drop_foreign_key(&self, offset: usize) -> Option<ForeignKey> {
        let mut lists = self.lists.lock();
        if offset < lists.foreign_keys.len() {
            Some(lists.foreign_keys.remove(offset))
        } else {
            None
        }
    }

    /// Number of foreign keys.
    pub fn foreign_key_count(&self) -> usize {
        self.lists.lock().foreign_keys.len()
    }

    //===------------------------------------------------------------===//
    // Stats
    //===------------------------------------------------------------===//

    /// The approximate row count.
    pub fn get_row_count(&self) -> i64 {
        self.stats.row_count()
    }

    /// Whether the stats were mutated since the last reset.
    pub fn is_dirty(&self) -> bool {
        self.stats.is_dirty()
    }

    /// Clears the dirty flag.
    pub fn reset_dirty(&self) {
        self.stats.reset_dirty()
    }
}

impl Drop for Table {
    /// The table's row groups live in the directory; destroying the table
    /// withdraws them. Outstanding references keep individual groups alive
    /// until they are released.
    fn drop(&mut self) {
        let lists = self.lists.lock();
        for id in &lists.row_groups {
            self.directory.remove(*id);
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=====================================================")?;
        writeln!(f, "TABLE {} ({}.{})", self.name, self.database, self.id)?;

        let ids = self.row_group_ids();
        writeln!(f, "Row Group Count: {}", ids.len())?;

        let mut total = 0;
        for (offset, id) in ids.iter().enumerate() {
            match self.directory.lookup(*id) {
                Some(group) => {
                    let active = group.next_slot();
                    total += active;
                    writeln!(
                        f,
                        "Row Group {} (id {}): {}/{} slots",
                        offset,
                        id,
                        active,
                        group.allocated_count()
                    )?;
                }
                None => writeln!(f, "Row Group {} (id {}): unresolved", offset, id)?,
            }
        }

        writeln!(f, "Table Active Slot Count: {}", total)?;
        write!(f, "=====================================================")
    }
}
