//! Secondary indexes.
//!
//! An [`Index`] maps projected key tuples to the item pointers of the heap
//! tuples they were built from. The structure is an ordered map guarded by
//! a reader-writer lock. One key can carry several pointers, because MVCC
//! keeps superseded versions reachable and deletes never remove entries;
//! readers filter stale pointers by visibility.
//!
//! The constraint an index enforces is a closed enum
//! ([`IndexConstraint`]); primary-key and unique indexes get a visibility
//! check against existing entries before an insert goes through.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};

use parking_lot::RwLock;

use crate::catalog::{Column, IndexId};
use crate::rowgroup::ItemPointer;
use crate::tuple::Tuple;

/// The constraint an index enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexConstraint {
    /// Primary key: unique among visible entries, at most one per table.
    PrimaryKey,
    /// Unique among visible entries.
    Unique,
    /// No constraint.
    NonUnique,
}

impl IndexConstraint {
    /// Returns true for constraints that require a uniqueness check.
    pub fn requires_unique(&self) -> bool {
        matches!(self, IndexConstraint::PrimaryKey | IndexConstraint::Unique)
    }
}

/// Static description of an index: identity, key shape, and constraint.
#[derive(Debug, Clone)]
pub struct IndexMetadata {
    name: String,
    id: IndexId,
    constraint: IndexConstraint,
    /// Table column indices the key is projected from, in key order.
    indexed_columns: Vec<usize>,
    /// Schema of the key tuple, in key order.
    key_schema: Vec<Column>,
}

impl IndexMetadata {
    /// Creates index metadata.
    pub fn new(
        name: impl Into<String>,
        id: IndexId,
        constraint: IndexConstraint,
        indexed_columns: Vec<usize>,
        key_schema: Vec<Column>,
    ) -> Self {
        debug_assert_eq!(indexed_columns.len(), key_schema.len());
        Self {
            name: name.into(),
            id,
            constraint,
            indexed_columns,
            key_schema,
        }
    }

    /// The index's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The index's id.
    pub fn id(&self) -> IndexId {
        self.id
    }

    /// The constraint this index enforces.
    pub fn constraint(&self) -> IndexConstraint {
        self.constraint
    }

    /// Table column indices the key is projected from.
    pub fn indexed_columns(&self) -> &[usize] {
        &self.indexed_columns
    }

    /// Schema of the key tuple.
    pub fn key_schema(&self) -> &[Column] {
        &self.key_schema
    }
}

/// An ordered in-memory index over projected key tuples.
pub struct Index {
    metadata: IndexMetadata,
    entries: RwLock<BTreeMap<Tuple, Vec<ItemPointer>>>,
    /// Approximate tuple count, maintained by the table's write paths.
    row_count: AtomicI64,
}

impl Index {
    /// Creates an empty index.
    pub fn new(metadata: IndexMetadata) -> Self {
        Self {
            metadata,
            entries: RwLock::new(BTreeMap::new()),
            row_count: AtomicI64::new(0),
        }
    }

    /// The index's metadata.
    pub fn metadata(&self) -> &IndexMetadata {
        &self.metadata
    }

    /// The index's name.
    pub fn name(&self) -> &str {
        self.metadata.name()
    }

    /// The index's id.
    pub fn id(&self) -> IndexId {
        self.metadata.id()
    }

    /// The constraint this index enforces.
    pub fn constraint(&self) -> IndexConstraint {
        self.metadata.constraint()
    }

    /// Projects `tuple` onto this index's key columns.
    pub fn key_for(&self, tuple: &Tuple) -> Tuple {
        tuple.project(self.metadata.indexed_columns())
    }

    /// Returns every pointer recorded for `key`, oldest first.
    ///
    /// Pointers to superseded or deleted versions are included; callers
    /// filter by MVCC visibility.
    pub fn scan(&self, key: &Tuple) -> Vec<ItemPointer> {
        self.entries
            .read()
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    /// Records `pointer` under `key`.
    ///
    /// Recording the exact `(key, pointer)` pair twice is a no-op; an
    /// update fallback re-inserts pairs its repoint attempt already wrote.
    /// The return value reports acceptance and is asserted by the table.
    pub fn insert(&self, key: Tuple, pointer: ItemPointer) -> bool {
        let mut entries = self.entries.write();
        let pointers = entries.entry(key).or_default();
        if !pointers.contains(&pointer) {
            pointers.push(pointer);
        }
        true
    }

    /// Same-key update: repoints the newest entry for `key` to `pointer`.
    ///
    /// Returns false when no entry for `key` exists, in which case the
    /// caller falls back to a fresh insert.
    pub fn update(&self, key: &Tuple, pointer: ItemPointer) -> bool {
        let mut entries = self.entries.write();
        match entries.get_mut(key) {
            Some(pointers) => {
                match pointers.last_mut() {
                    Some(last) => *last = pointer,
                    None => pointers.push(pointer),
                }
                true
            }
            None => false,
        }
    }

    /// Removes the exact `(key, pointer)` pair.
    ///
    /// Returns false when the pair is not present. The table's delete path
    /// never calls this; stale pointers are filtered by visibility.
    pub fn delete(&self, key: &Tuple, pointer: ItemPointer) -> bool {
        let mut entries = self.entries.write();
        let Some(pointers) = entries.get_mut(key) else {
            return false;
        };
        let before = pointers.len();
        pointers.retain(|p| p != &pointer);
        let removed = pointers.len() < before;
        if pointers.is_empty() {
            entries.remove(key);
        }
        removed
    }

    /// Number of distinct keys currently present.
    pub fn key_count(&self) -> usize {
        self.entries.read().len()
    }

    /// Approximate tuple count.
    pub fn row_count(&self) -> i64 {
        self.row_count.load(Ordering::Relaxed)
    }

    /// Adjusts the approximate tuple count by `amount`.
    pub fn increase_row_count(&self, amount: i64) {
        self.row_count.fetch_add(amount, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::RowGroupId;
    use crate::datum::{Type, Value};

    fn id_index(constraint: IndexConstraint) -> Index {
        Index::new(IndexMetadata::new(
            "idx_id",
            IndexId::new(1),
            constraint,
            vec![0],
            vec![Column::new("id", Type::Int4, false)],
        ))
    }

    fn key(id: i32) -> Tuple {
        Tuple::new(vec![Value::Int32(id)])
    }

    fn ptr(group: u64, offset: usize) -> ItemPointer {
        ItemPointer::new(RowGroupId::new(group), offset)
    }

    #[test]
    fn test_requires_unique() {
        assert!(IndexConstraint::PrimaryKey.requires_unique());
        assert!(IndexConstraint::Unique.requires_unique());
        assert!(!IndexConstraint::NonUnique.requires_unique());
    }

    #[test]
    fn test_key_projection() {
        let index = Index::new(IndexMetadata::new(
            "idx_name",
            IndexId::new(2),
            IndexConstraint::NonUnique,
            vec![1],
            vec![Column::new("name", Type::Varchar, true)],
        ));
        let tuple = Tuple::new(vec![Value::Int32(1), Value::Text("a".into())]);
        assert_eq!(index.key_for(&tuple), Tuple::new(vec![Value::Text("a".into())]));
    }

    #[test]
    fn test_insert_and_scan() {
        let index = id_index(IndexConstraint::PrimaryKey);

        assert!(index.insert(key(1), ptr(1, 0)));
        assert_eq!(index.scan(&key(1)), vec![ptr(1, 0)]);
        assert!(index.scan(&key(2)).is_empty());
        assert_eq!(index.key_count(), 1);
    }

    #[test]
    fn test_insert_exact_duplicate_is_noop() {
        let index = id_index(IndexConstraint::PrimaryKey);
        assert!(index.insert(key(1), ptr(1, 0)));
        assert!(index.insert(key(1), ptr(1, 0)));
        assert_eq!(index.scan(&key(1)), vec![ptr(1, 0)]);
    }

    #[test]
    fn test_same_key_accumulates_versions() {
        let index = id_index(IndexConstraint::NonUnique);
        assert!(index.insert(key(1), ptr(1, 0)));
        assert!(index.insert(key(1), ptr(1, 3)));
        assert_eq!(index.scan(&key(1)), vec![ptr(1, 0), ptr(1, 3)]);
    }

    #[test]
    fn test_update_repoints_newest() {
        let index = id_index(IndexConstraint::PrimaryKey);
        index.insert(key(1), ptr(1, 0));

        assert!(index.update(&key(1), ptr(2, 0)));
        assert_eq!(index.scan(&key(1)), vec![ptr(2, 0)]);
    }

    #[test]
    fn test_update_missing_key_fails() {
        let index = id_index(IndexConstraint::PrimaryKey);
        assert!(!index.update(&key(1), ptr(1, 0)));
        assert!(index.scan(&key(1)).is_empty());
    }

    #[test]
    fn test_delete_exact_pair() {
        let index = id_index(IndexConstraint::NonUnique);
        index.insert(key(1), ptr(1, 0));
        index.insert(key(1), ptr(1, 1));

        assert!(index.delete(&key(1), ptr(1, 0)));
        assert_eq!(index.scan(&key(1)), vec![ptr(1, 1)]);
        assert!(!index.delete(&key(1), ptr(1, 0)));

        assert!(index.delete(&key(1), ptr(1, 1)));
        assert_eq!(index.key_count(), 0);
    }

    #[test]
    fn test_row_count() {
        let index = id_index(IndexConstraint::PrimaryKey);
        assert_eq!(index.row_count(), 0);
        index.increase_row_count(1);
        index.increase_row_count(1);
        assert_eq!(index.row_count(), 2);
    }
}
