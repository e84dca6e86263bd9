//! Tables: the storage core's write surface.
//!
//! A [`Table`] owns an append-only list of row-group ids (resolved through
//! the process-wide directory), an ordered set of secondary indexes, and a
//! list of foreign-key descriptors. It mediates transactional
//! insert/update/delete under MVCC, enforces primary/unique constraints
//! against visible index state, and can reorganize a row group's physical
//! layout while the table is live.
//!
//! - [`core`]: table identity, slot acquisition, growth, index and
//!   foreign-key management
//! - [`writes`]: insert/update/delete paths and index coordination
//! - [`reorg`]: online row-group rewrite under a new column map
//! - [`stats`]: approximate row count and dirty flag
//! - [`indexes`]: the ordered index set with derived constraint metadata

pub mod core;
pub mod error;
pub mod indexes;
pub mod reorg;
pub mod stats;
pub mod writes;

pub use self::core::Table;
pub use error::TableError;
pub use indexes::IndexSet;
pub use stats::TableStats;
