//! Catalog metadata: object identifiers, schemas, constraints, foreign
//! keys, and the process-wide row-group directory.
//!
//! The directory is the single owner of row-group objects; tables reference
//! row groups by id and resolve them through it.

pub mod directory;
pub mod foreign_key;
pub mod schema;
pub mod types;

pub use directory::RowGroupDirectory;
pub use foreign_key::{ForeignKey, ForeignKeyBuilder};
pub use schema::{Column, Constraint, ConstraintKind, Schema};
pub use types::{DatabaseId, IndexId, RowGroupId, TableId};
