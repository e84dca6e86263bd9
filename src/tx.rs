//! Transaction identifiers and MVCC timestamps.
//!
//! This module provides the narrow transaction surface the storage core
//! consumes:
//! - Transaction and commit identifier types ([`TxId`], [`CommitId`])
//! - A per-operation transaction handle ([`Transaction`])
//! - A [`TransactionManager`] that mints identifiers and commit timestamps
//!
//! Commit/abort orchestration (walking a transaction's write set and
//! finalizing row-group headers) is driven by the engine above this crate.

pub mod manager;
pub mod types;

pub use manager::{Transaction, TransactionManager};
pub use types::{CommitId, TxId};
