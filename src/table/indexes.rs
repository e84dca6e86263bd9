//! The table's ordered index set.

use std::sync::Arc;

use crate::catalog::IndexId;
use crate::index::{Index, IndexConstraint};

/// Ordered collection of a table's indexes plus derived constraint
/// metadata.
///
/// `has_primary_key` is true iff at least one index carries the primary-key
/// constraint; `unique_constraint_count` is the number of unique
/// (non-primary) indexes. Both are recomputed on every add and drop.
pub struct IndexSet {
    indexes: Vec<Arc<Index>>,
    has_primary_key: bool,
    unique_constraint_count: usize,
}

impl IndexSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self {
            indexes: Vec::new(),
            has_primary_key: false,
            unique_constraint_count: 0,
        }
    }

    /// Appends an index.
    pub fn add(&mut self, index: Arc<Index>) {
        self.indexes.push(index);
        self.recompute();
    }

    /// Removes the index with `id`, returning it if present.
    pub fn remove_by_id(&mut self, id: IndexId) -> Option<Arc<Index>> {
        let offset = self.indexes.iter().position(|i| i.id() == id)?;
        let removed = self.indexes.remove(offset);
        self.recompute();
        Some(removed)
    }

    /// The index at `offset` in addition order.
    pub fn get(&self, offset: usize) -> Option<Arc<Index>> {
        self.indexes.get(offset).cloned()
    }

    /// The index with `id`.
    pub fn get_by_id(&self, id: IndexId) -> Option<Arc<Index>> {
        self.indexes.iter().find(|i| i.id() == id).cloned()
    }

    /// Number of indexes.
    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    /// Returns true if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }

    /// A snapshot of the indexes in addition order.
    ///
    /// Write paths take a snapshot under the table mutex and operate on it
    /// outside the mutex.
    pub fn snapshot(&self) -> Vec<Arc<Index>> {
        self.indexes.clone()
    }

    /// Whether any index carries the primary-key constraint.
    pub fn has_primary_key(&self) -> bool {
        self.has_primary_key
    }

    /// Number of unique (non-primary) indexes.
    pub fn unique_constraint_count(&self) -> usize {
        self.unique_constraint_count
    }

    fn recompute(&mut self) {
        self.has_primary_key = self
            .indexes
            .iter()
            .any(|i| i.constraint() == IndexConstraint::PrimaryKey);
        self.unique_constraint_count = self
            .indexes
            .iter()
            .filter(|i| i.constraint() == IndexConstraint::Unique)
            .count();
    }
}

impl Default for IndexSet {
    fn default() -> Self {
        Self::new()
    }
}
