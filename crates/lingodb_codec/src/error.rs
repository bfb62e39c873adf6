//! Error types for codec operations.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while encoding or addressing records.
#[derive(Debug, Error)]
pub enum CodecError {
    /// A slot holds bytes that do not decode to a record.
    ///
    /// This is a recoverable condition: the store logs it, treats the slot
    /// as empty, and continues scanning.
    #[error("corrupt slot: {reason}")]
    CorruptSlot {
        /// Human-readable decode failure.
        reason: String,
    },

    /// A record could not be serialized into a slot body.
    #[error("record serialization failed: {0}")]
    Serialize(String),

    /// The store geometry is invalid.
    #[error("invalid store geometry: {reason}")]
    InvalidGeometry {
        /// Why the geometry was rejected.
        reason: String,
    },
}

impl CodecError {
    /// Creates a corrupt-slot error.
    pub fn corrupt(reason: impl Into<String>) -> Self {
        Self::CorruptSlot {
            reason: reason.into(),
        }
    }
}
