//! Error types for replication operations.

use lingodb_store::StoreError;
use thiserror::Error;

/// Boxed error type used at the commit-sink seam.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type for replication operations.
pub type ReplicationResult<T> = Result<T, ReplicationError>;

/// Errors that can occur while driving replication.
#[derive(Debug, Error)]
pub enum ReplicationError {
    /// The bridge was asked to do something its current mode forbids.
    #[error("invalid replication state: expected {expected}, found {found}")]
    InvalidState {
        /// The mode(s) the operation requires.
        expected: &'static str,
        /// The mode the bridge was actually in.
        found: String,
    },

    /// A store write failed while applying a pushed document.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The post-push remote commit failed.
    ///
    /// The local stores already hold the pushed documents; the collection
    /// keeps its optimistic state and the commit can be retried.
    #[error("remote commit failed: {0}")]
    Commit(#[source] BoxError),
}
