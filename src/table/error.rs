//! Error types for table operations.

use std::fmt;

use crate::catalog::RowGroupId;

/// Errors from table write and reorganization paths.
///
/// These are the user-caused failures; internal invariant breakage (an
/// index insert failing after its constraint check passed) panics instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    /// A non-nullable column was NULL. No slot was claimed.
    ConstraintViolation {
        /// Name of the violated column.
        column: String,
    },
    /// A visible entry already exists in a primary/unique index. The claimed
    /// heap slot stays allocated but unreachable.
    UniqueViolation {
        /// Name of the violated index.
        index: String,
    },
    /// Reorganization was asked for a row group this table does not own.
    RowGroupNotFound(RowGroupId),
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableError::ConstraintViolation { column } => {
                write!(f, "NOT NULL constraint violated: column {}", column)
            }
            TableError::UniqueViolation { index } => {
                write!(f, "unique constraint violated: index {}", index)
            }
            TableError::RowGroupNotFound(id) => {
                write!(f, "row group {} not found in table", id)
            }
        }
    }
}

impl std::error::Error for TableError {}
