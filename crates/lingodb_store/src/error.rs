//! Error types for store operations.

use lingodb_codec::CodecError;
use std::io;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during slot store operations.
///
/// Corrupt slots are deliberately absent here: they are recovered inside
/// the store (logged and counted in scan reports), never surfaced as an
/// error.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A record failed to serialize, or the store geometry is invalid.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// `insert` was called for an id that already occupies a slot.
    ///
    /// The caller decides whether to retry as an update.
    #[error("duplicate id: {id}")]
    DuplicateId {
        /// The rejected record id.
        id: String,
    },

    /// `update` or `delete` was called for an id with no existing slot.
    #[error("record not found: {id}")]
    NotFound {
        /// The missing record id.
        id: String,
    },

    /// A write targeted a slot already occupied by a different id.
    ///
    /// Distinct ids can hash to the same slot address; overwriting would
    /// silently destroy the resident record on disk while the in-memory
    /// state kept both.
    #[error("slot collision: id {id} hashes to the slot occupied by {occupied_by}")]
    SlotCollision {
        /// The rejected record id.
        id: String,
        /// The id currently occupying the slot.
        occupied_by: String,
    },

    /// A payload cannot be framed as one slot line.
    #[error("payload not representable as a slot line: {reason}")]
    UnframablePayload {
        /// Why the payload was rejected.
        reason: String,
    },

    /// The store has not been connected to a directory yet.
    #[error("store is not connected to a directory")]
    NotConnected,
}
