//! Object identifier types.
//!
//! Every catalog object carries a numeric identifier that is stable for the
//! object's lifetime. Identifier 0 is reserved as INVALID across all of
//! them.

use std::fmt;

macro_rules! object_id {
    ($(#[$doc:meta])* $name:ident, $raw:ty) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name($raw);

        impl $name {
            /// Invalid identifier (0).
            pub const INVALID: Self = Self(0);

            /// Create a new identifier.
            pub const fn new(id: $raw) -> Self {
                Self(id)
            }

            /// Get the raw value.
            pub const fn as_raw(&self) -> $raw {
                self.0
            }

            /// Check if this is the invalid identifier.
            pub const fn is_invalid(&self) -> bool {
                self.0 == 0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

object_id!(
    /// Database identifier.
    DatabaseId,
    u32
);

object_id!(
    /// Table identifier, unique within a database.
    TableId,
    u32
);

object_id!(
    /// Index identifier.
    IndexId,
    u32
);

object_id!(
    /// Row-group identifier, unique process-wide; minted by the
    /// [`RowGroupDirectory`](crate::catalog::RowGroupDirectory).
    RowGroupId,
    u64
);
