//! Approximate table statistics.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

/// Running row count and dirty flag.
///
/// The count is approximate, not transactional: every successful insert
/// increments it, every successful delete decrements it, and nothing
/// reconciles it against aborted transactions. Reorganization does not
/// touch it. Every mutation sets the dirty flag; only
/// [`reset_dirty`](Self::reset_dirty) clears it.
pub struct TableStats {
    row_count: AtomicI64,
    dirty: AtomicBool,
}

impl TableStats {
    /// Creates zeroed, clean stats.
    pub fn new() -> Self {
        Self {
            row_count: AtomicI64::new(0),
            dirty: AtomicBool::new(false),
        }
    }

    /// Increases the row count by `amount`.
    pub fn increase_row_count(&self, amount: i64) {
        self.row_count.fetch_add(amount, Ordering::Relaxed);
        self.dirty.store(true, Ordering::Relaxed);
    }

    /// Decreases the row count by `amount`.
    pub fn decrease_row_count(&self, amount: i64) {
        self.row_count.fetch_sub(amount, Ordering::Relaxed);
        self.dirty.store(true, Ordering::Relaxed);
    }

    /// Overwrites the row count.
    pub fn set_row_count(&self, count: i64) {
        self.row_count.store(count, Ordering::Relaxed);
        self.dirty.store(true, Ordering::Relaxed);
    }

    /// The current approximate row count.
    pub fn row_count(&self) -> i64 {
        self.row_count.load(Ordering::Relaxed)
    }

    /// Whether the stats have been mutated since the last reset.
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Relaxed)
    }

    /// Clears the dirty flag.
    pub fn reset_dirty(&self) {
        self.dirty.store(false, Ordering::Relaxed);
    }
}

impl Default for TableStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counting() {
        let stats = TableStats::new();
        assert_eq!(stats.row_count(), 0);

        stats.increase_row_count(1);
        stats.increase_row_count(1);
        stats.decrease_row_count(1);
        assert_eq!(stats.row_count(), 1);

        stats.set_row_count(10);
        assert_eq!(stats.row_count(), 10);
    }

    #[test]
    fn test_dirty_flag() {
        let stats = TableStats::new();
        assert!(!stats.is_dirty());

        stats.increase_row_count(1);
        assert!(stats.is_dirty());

        stats.reset_dirty();
        assert!(!stats.is_dirty());

        stats.decrease_row_count(1);
        assert!(stats.is_dirty());
    }
}
