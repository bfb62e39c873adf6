//! The remote backend seam.

use crate::error::{RemoteError, RemoteResult};
use parking_lot::Mutex;
use std::path::PathBuf;

/// Author identity recorded on commits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitAuthor {
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
}

impl CommitAuthor {
    /// Creates an author identity.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// Credentials presented to the remote on push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteAuth {
    /// Username.
    pub username: String,
    /// Access token.
    pub token: String,
}

impl RemoteAuth {
    /// Creates push credentials.
    pub fn new(username: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            token: token.into(),
        }
    }
}

/// Options for the initial working-copy checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloneOptions {
    /// Remote url.
    pub url: String,
    /// Fetch only the default branch.
    pub single_branch: bool,
    /// Shallow-clone depth, if any.
    pub depth: Option<u32>,
}

impl CloneOptions {
    /// Creates options for a shallow single-branch checkout, the default
    /// shape for translation working copies.
    pub fn shallow(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            single_branch: true,
            depth: Some(1),
        }
    }
}

/// A version-controlled working copy with a remote counterpart.
///
/// The driver never interprets repository internals; it only asks the
/// backend to move content between the remote and the working copy that
/// the slot stores read from and write to.
pub trait RemoteStore: Send + Sync {
    /// Creates the local working copy from the remote.
    fn clone_repo(&self, options: &CloneOptions) -> RemoteResult<()>;

    /// Fetches remote changes into the working copy.
    fn pull(&self) -> RemoteResult<()>;

    /// Publishes local commits to the remote.
    fn push(&self, auth: &RemoteAuth) -> RemoteResult<()>;

    /// Lists working-copy paths that differ from the last commit.
    fn status_diff(&self) -> RemoteResult<Vec<PathBuf>>;

    /// Stages the given paths and commits them.
    fn stage_and_commit(
        &self,
        paths: &[PathBuf],
        message: &str,
        author: &CommitAuthor,
    ) -> RemoteResult<()>;
}

/// An in-memory remote backend for tests.
///
/// Records every call in order and lets tests inject a failure for any
/// single operation.
#[derive(Default)]
pub struct MockRemote {
    calls: Mutex<Vec<String>>,
    dirty: Mutex<Vec<PathBuf>>,
    fail_pull: Mutex<Option<RemoteError>>,
    fail_push: Mutex<Option<RemoteError>>,
    fail_commit: Mutex<Option<RemoteError>>,
}

impl MockRemote {
    /// Creates a mock with a clean working copy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the paths the next `status_diff` reports as changed.
    pub fn set_dirty_paths(&self, paths: Vec<PathBuf>) {
        *self.dirty.lock() = paths;
    }

    /// Makes the next `pull` fail with the given error.
    pub fn fail_pull_with(&self, err: RemoteError) {
        *self.fail_pull.lock() = Some(err);
    }

    /// Makes the next `push` fail with the given error.
    pub fn fail_push_with(&self, err: RemoteError) {
        *self.fail_push.lock() = Some(err);
    }

    /// Makes the next `stage_and_commit` fail with the given error.
    pub fn fail_commit_with(&self, err: RemoteError) {
        *self.fail_commit.lock() = Some(err);
    }

    /// Returns the operations invoked so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn record(&self, call: &str) {
        self.calls.lock().push(call.to_string());
    }
}

impl RemoteStore for MockRemote {
    fn clone_repo(&self, options: &CloneOptions) -> RemoteResult<()> {
        self.record(&format!("clone {}", options.url));
        Ok(())
    }

    fn pull(&self) -> RemoteResult<()> {
        self.record("pull");
        match self.fail_pull.lock().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn push(&self, _auth: &RemoteAuth) -> RemoteResult<()> {
        self.record("push");
        match self.fail_push.lock().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn status_diff(&self) -> RemoteResult<Vec<PathBuf>> {
        self.record("status_diff");
        Ok(self.dirty.lock().clone())
    }

    fn stage_and_commit(
        &self,
        paths: &[PathBuf],
        _message: &str,
        _author: &CommitAuthor,
    ) -> RemoteResult<()> {
        self.record(&format!("commit {} paths", paths.len()));
        match self.fail_commit.lock().take() {
            Some(err) => Err(err),
            None => {
                // A successful commit leaves the working copy clean.
                self.dirty.lock().clear();
                Ok(())
            }
        }
    }
}
