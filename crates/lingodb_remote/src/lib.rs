//! # lingodb Remote
//!
//! Synchronizes slot-store working copies with a version-controlled
//! remote.
//!
//! The [`SyncDriver`] runs two independent cycles against a
//! [`RemoteStore`] backend: pull-then-reload (fetch remote content, then
//! reconcile every registered store against the working copy) and
//! commit-then-push (stage whatever the stores wrote, commit it with a
//! fixed author, publish it). The two-phase [`SyncError`] tells callers
//! exactly which half of a cycle failed, because a committed-but-unpushed
//! state needs a different retry than a failed pull.
//!
//! The driver implements the replication bridge's
//! [`CommitSink`](lingodb_replication::CommitSink) seam, which is how a
//! push of local writes ends in a remote commit.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod driver;
mod error;
mod store;

pub use driver::{CommitOutcome, PullOutcome, ReloadTarget, SyncDriver};
pub use error::{RemoteError, RemoteResult, SyncError, SyncFailure, SyncPhase, SyncResult};
pub use store::{CloneOptions, CommitAuthor, MockRemote, RemoteAuth, RemoteStore};
