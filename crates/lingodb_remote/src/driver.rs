//! Drives the pull/reload and commit/push cycles of a sync session.

use crate::error::{SyncError, SyncPhase, SyncResult};
use crate::store::{CloneOptions, CommitAuthor, RemoteAuth, RemoteStore};
use lingodb_codec::SlotRecord;
use lingodb_replication::{BoxError, CommitSink};
use lingodb_store::{ReloadReport, SlotStore, StoreResult, SyncGuard};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A store the driver reloads after a remote pull.
///
/// Object-safe so one driver can carry stores of different record types.
pub trait ReloadTarget: Send + Sync {
    /// Flags that the working copy changed underneath the store.
    fn mark_externally_modified(&self);

    /// Re-scans the working copy and reconciles in-memory state.
    fn reload_from_working_copy(&self, force: bool) -> StoreResult<ReloadReport>;
}

impl<R: SlotRecord> ReloadTarget for SlotStore<R> {
    fn mark_externally_modified(&self) {
        SlotStore::mark_externally_modified(self);
    }

    fn reload_from_working_copy(&self, force: bool) -> StoreResult<ReloadReport> {
        self.load_slot_files_from_working_copy(force)
    }
}

/// The outcome of a pull cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PullOutcome {
    /// Number of stores that were reloaded.
    pub stores_reloaded: usize,
    /// Total entries whose content changed across all stores.
    pub entries_changed: usize,
}

/// The outcome of a commit cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The working copy was clean; nothing was committed or pushed.
    NoChanges,
    /// The listed paths were committed and pushed.
    Committed {
        /// Paths included in the commit.
        files: Vec<PathBuf>,
    },
}

/// Synchronizes slot stores with a remote working copy.
///
/// Pulling runs under the shared [`SyncGuard`] so a reload never interleaves
/// with a replication push-apply; committing does not take the guard because
/// the stores' writes have already landed by the time it runs.
pub struct SyncDriver {
    remote: Arc<dyn RemoteStore>,
    targets: Vec<Arc<dyn ReloadTarget>>,
    guard: SyncGuard,
    commit_message: String,
    author: CommitAuthor,
    auth: RemoteAuth,
}

impl SyncDriver {
    /// Creates a driver with no reload targets.
    pub fn new(remote: Arc<dyn RemoteStore>, author: CommitAuthor, auth: RemoteAuth) -> Self {
        Self {
            remote,
            targets: Vec::new(),
            guard: SyncGuard::new(),
            commit_message: "update translation files".to_string(),
            author,
            auth,
        }
    }

    /// Adds a store to reload after each pull.
    #[must_use]
    pub fn with_target(mut self, target: Arc<dyn ReloadTarget>) -> Self {
        self.targets.push(target);
        self
    }

    /// Shares a sync guard with the replication bridge.
    #[must_use]
    pub fn with_sync_guard(mut self, guard: SyncGuard) -> Self {
        self.guard = guard;
        self
    }

    /// Overrides the fixed commit message.
    #[must_use]
    pub fn with_commit_message(mut self, message: impl Into<String>) -> Self {
        self.commit_message = message.into();
        self
    }

    /// Returns the sync guard the driver holds during pull-reloads.
    pub fn sync_guard(&self) -> SyncGuard {
        self.guard.clone()
    }

    /// Creates the working copy from the remote and loads every
    /// registered store from it.
    ///
    /// Used once per project checkout; thereafter
    /// [`pull_and_reload`](Self::pull_and_reload) keeps the copy fresh.
    pub fn clone_and_load(&self, options: &CloneOptions) -> SyncResult<PullOutcome> {
        let _permit = self.guard.acquire();

        self.remote
            .clone_repo(options)
            .map_err(|e| SyncError::phase(SyncPhase::Pull, e))?;

        let mut entries_changed = 0;
        for target in &self.targets {
            let report = target
                .reload_from_working_copy(true)
                .map_err(|e| SyncError::partial(SyncPhase::Pull, SyncPhase::Reload, e))?;
            entries_changed += report.changed;
        }

        info!(url = %options.url, entries_changed, "cloned and loaded working copy");
        Ok(PullOutcome {
            stores_reloaded: self.targets.len(),
            entries_changed,
        })
    }

    /// Pulls remote changes and reloads every registered store.
    ///
    /// A pull failure leaves the stores untouched. A reload failure after a
    /// successful pull surfaces as [`SyncError::Partial`]: the working copy
    /// already holds the remote content and only the reload needs retrying.
    pub fn pull_and_reload(&self) -> SyncResult<PullOutcome> {
        let _permit = self.guard.acquire();

        self.remote
            .pull()
            .map_err(|e| SyncError::phase(SyncPhase::Pull, e))?;

        let mut entries_changed = 0;
        for target in &self.targets {
            target.mark_externally_modified();
            // Forced: the pull just rewrote the working copy.
            let report = target
                .reload_from_working_copy(true)
                .map_err(|e| SyncError::partial(SyncPhase::Pull, SyncPhase::Reload, e))?;
            entries_changed += report.changed;
            if report.corrupt_slots > 0 {
                warn!(corrupt = report.corrupt_slots, "corrupt slots skipped during reload");
            }
        }

        info!(
            stores = self.targets.len(),
            entries_changed, "pulled and reloaded working copy"
        );
        Ok(PullOutcome {
            stores_reloaded: self.targets.len(),
            entries_changed,
        })
    }

    /// Commits pending working-copy changes and pushes them.
    ///
    /// A clean working copy is a logged no-op. A commit failure leaves the
    /// paths unstaged for the next attempt. A push failure after a
    /// successful commit surfaces as [`SyncError::Partial`]: the commit
    /// exists locally and only the push needs retrying.
    pub fn push_and_commit(&self) -> SyncResult<CommitOutcome> {
        let files = self
            .remote
            .status_diff()
            .map_err(|e| SyncError::phase(SyncPhase::Commit, e))?;
        if files.is_empty() {
            debug!("working copy clean, nothing to commit");
            return Ok(CommitOutcome::NoChanges);
        }

        self.remote
            .stage_and_commit(&files, &self.commit_message, &self.author)
            .map_err(|e| SyncError::phase(SyncPhase::Commit, e))?;

        self.remote
            .push(&self.auth)
            .map_err(|e| SyncError::partial(SyncPhase::Commit, SyncPhase::Push, e))?;

        info!(files = files.len(), "committed and pushed working copy changes");
        Ok(CommitOutcome::Committed { files })
    }
}

impl CommitSink for SyncDriver {
    fn commit(&self) -> Result<(), BoxError> {
        self.push_and_commit()?;
        Ok(())
    }
}

impl std::fmt::Debug for SyncDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncDriver")
            .field("targets", &self.targets.len())
            .field("commit_message", &self.commit_message)
            .finish_non_exhaustive()
    }
}
