//! Process-wide row-group directory.
//!
//! The directory is the single owner of row-group objects. Tables hold
//! row-group ids, never direct references; every access resolves through
//! [`RowGroupDirectory::lookup`]. Reorganization swaps the object behind an
//! id with [`rebind`](RowGroupDirectory::rebind) without disturbing the
//! tables that reference it.
//!
//! The directory must outlive every table constructed against it.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::types::RowGroupId;
use crate::rowgroup::RowGroup;

/// Registry mapping row-group ids to row-group objects, plus the id minter.
pub struct RowGroupDirectory {
    /// Next row-group id to allocate and the registered groups, under one
    /// lock so registration order matches allocation observation order.
    state: RwLock<DirectoryState>,
}

struct DirectoryState {
    next_id: u64,
    groups: HashMap<RowGroupId, Arc<RowGroup>>,
}

impl RowGroupDirectory {
    /// Creates an empty directory. Ids start at 1 (0 is INVALID).
    pub fn new() -> Self {
        Self {
            state: RwLock::new(DirectoryState {
                next_id: 1,
                groups: HashMap::new(),
            }),
        }
    }

    /// Mints a fresh row-group id.
    ///
    /// The id is reserved immediately; registering the object is a separate
    /// step, and an id whose candidate loses a growth race is simply never
    /// registered.
    pub fn mint_id(&self) -> RowGroupId {
        let mut state = self.state.write();
        let id = RowGroupId::new(state.next_id);
        state.next_id += 1;
        id
    }

    /// Registers a row group under its id.
    ///
    /// # Panics
    ///
    /// Panics if the id is already registered; ids are minted once and
    /// double registration is a bug.
    pub fn register(&self, id: RowGroupId, group: Arc<RowGroup>) {
        let previous = self.state.write().groups.insert(id, group);
        assert!(previous.is_none(), "row group {} registered twice", id);
    }

    /// Resolves a row-group id to its current object.
    pub fn lookup(&self, id: RowGroupId) -> Option<Arc<RowGroup>> {
        self.state.read().groups.get(&id).cloned()
    }

    /// Atomically swaps the object behind `id`, returning the previous one.
    ///
    /// Readers that already resolved the old object keep using it; new
    /// lookups observe the replacement.
    pub fn rebind(&self, id: RowGroupId, group: Arc<RowGroup>) -> Option<Arc<RowGroup>> {
        self.state.write().groups.insert(id, group)
    }

    /// Removes the entry for `id`, returning the object if it was present.
    pub fn remove(&self, id: RowGroupId) -> Option<Arc<RowGroup>> {
        self.state.write().groups.remove(&id)
    }

    /// Number of registered row groups.
    pub fn len(&self) -> usize {
        self.state.read().groups.len()
    }

    /// Returns true if no row groups are registered.
    pub fn is_empty(&self) -> bool {
        self.state.read().groups.is_empty()
    }
}

impl Default for RowGroupDirectory {
    fn default() -> Self {
        Self::new()
    }
}
