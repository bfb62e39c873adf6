//! Error types for remote sync operations.

use lingodb_store::StoreError;
use std::fmt;
use thiserror::Error;

/// Result type for remote operations.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Result type for driver-level sync cycles.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors surfaced by a remote backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteError {
    /// The remote rejected the provided credentials.
    #[error("remote authentication failed")]
    AuthFailure,

    /// The remote could not be reached or the transfer broke off.
    #[error("remote transport error: {message}")]
    Transport {
        /// Backend-specific description.
        message: String,
        /// True if retrying the same operation may succeed.
        retryable: bool,
    },

    /// The remote refused the operation (e.g. a non-fast-forward push).
    #[error("remote rejected the operation: {0}")]
    Rejected(String),
}

impl RemoteError {
    /// True if retrying the failed operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RemoteError::Transport { retryable: true, .. })
    }
}

/// A phase of a sync cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    /// Fetching remote content into the working copy.
    Pull,
    /// Reloading stores from the working copy.
    Reload,
    /// Staging and committing local working-copy changes.
    Commit,
    /// Publishing the commit to the remote.
    Push,
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyncPhase::Pull => "pull",
            SyncPhase::Reload => "reload",
            SyncPhase::Commit => "commit",
            SyncPhase::Push => "push",
        };
        f.write_str(name)
    }
}

/// The underlying cause of a failed sync phase.
#[derive(Debug, Error)]
pub enum SyncFailure {
    /// The remote backend failed.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// A store reload failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors surfaced by a sync cycle.
///
/// A cycle has two phases, and callers need to know which one failed: a
/// [`Partial`](Self::Partial) error means earlier phases already took
/// effect and must not be rolled back blindly (a committed-but-unpushed
/// change, say, only needs the push retried).
#[derive(Debug, Error)]
pub enum SyncError {
    /// The named phase failed before anything took effect.
    #[error("sync {phase} failed: {source}")]
    Phase {
        /// The phase that failed.
        phase: SyncPhase,
        /// What went wrong.
        source: SyncFailure,
    },

    /// An earlier phase completed, then a later one failed.
    #[error("sync {failed} failed after {completed} completed: {source}")]
    Partial {
        /// The phase that already took effect.
        completed: SyncPhase,
        /// The phase that failed.
        failed: SyncPhase,
        /// What went wrong.
        source: SyncFailure,
    },
}

impl SyncError {
    pub(crate) fn phase(phase: SyncPhase, source: impl Into<SyncFailure>) -> Self {
        SyncError::Phase {
            phase,
            source: source.into(),
        }
    }

    pub(crate) fn partial(
        completed: SyncPhase,
        failed: SyncPhase,
        source: impl Into<SyncFailure>,
    ) -> Self {
        SyncError::Partial {
            completed,
            failed,
            source: source.into(),
        }
    }
}
