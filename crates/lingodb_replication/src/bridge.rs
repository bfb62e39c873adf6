//! The replication bridge state machine.

use crate::collection::ReactiveCollection;
use crate::error::{BoxError, ReplicationError, ReplicationResult};
use lingodb_codec::SlotRecord;
use lingodb_compose::{Checkpoint, ChildRecord, CompositeAdapter, CompositeDocument, DocumentStream};
use lingodb_store::SyncGuard;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tracing::debug;

/// The mode a bridge is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplicationMode {
    /// Constructed, not started.
    Idle,
    /// Running the initial full pull.
    InitialPull,
    /// Forwarding live changes in both directions.
    Live,
    /// Stopped; the live subscription has been released.
    Stopped,
}

impl ReplicationMode {
    /// Returns true if [`ReplicationBridge::start`] may be called in this
    /// mode.
    pub fn can_start(&self) -> bool {
        matches!(self, ReplicationMode::Idle | ReplicationMode::Stopped)
    }
}

/// The replication state owned by one bridge instance.
///
/// Explicitly owned (not process-global) so that multiple bridges can run
/// side by side and each is independently testable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplicationState {
    /// Current mode.
    pub mode: ReplicationMode,
    /// Checkpoint of the last pulled batch, if any.
    pub checkpoint: Option<Checkpoint>,
}

impl ReplicationState {
    fn new() -> Self {
        Self {
            mode: ReplicationMode::Idle,
            checkpoint: None,
        }
    }
}

/// Configuration for a replication bridge.
#[derive(Debug, Clone)]
pub struct ReplicationConfig {
    /// Maximum documents per pull batch. When a batch comes back smaller
    /// than this, the initial pull is considered complete.
    pub batch_size: usize,
}

impl ReplicationConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self { batch_size: 100 }
    }

    /// Sets the pull batch size.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// A rejected pushed document.
///
/// No server-side rejection is modeled at this layer, so push handlers
/// currently always return an empty conflict list; the type exists so the
/// push contract matches the bidirectional replication protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    /// Id of the rejected document.
    pub document_id: String,
    /// Why it was rejected.
    pub reason: String,
}

/// The outcome of one push cycle.
#[derive(Debug)]
pub struct PushOutcome {
    /// Number of documents applied to the stores.
    pub pushed: usize,
    /// Rejected documents. Always empty at this layer.
    pub conflicts: Vec<Conflict>,
}

/// Commits the working copy after a successful push.
///
/// Implemented by the remote sync driver; test doubles record invocations.
pub trait CommitSink: Send + Sync {
    /// Commits whatever the push just wrote to the working copy.
    fn commit(&self) -> Result<(), BoxError>;
}

/// A hook fired after every successful push commit.
///
/// Runs on its own thread: the push returns before the hook finishes, and
/// a failing hook never fails the push. The lint pass hangs off this seam.
pub trait PushHook: Send + Sync {
    /// Invoked after a successful push commit.
    fn after_push(&self);
}

/// Bridges the composite adapter with a reactive collection.
///
/// Lifecycle: `Idle -> InitialPull -> Live -> Stopped`, driven by
/// [`start`](Self::start) and [`stop`](Self::stop). While `Live`, the
/// caller pumps [`poll_remote_changes`](Self::poll_remote_changes) and
/// [`push_local_writes`](Self::push_local_writes); both are cheap no-ops
/// when nothing is pending.
pub struct ReplicationBridge<P, C, K>
where
    P: SlotRecord,
    C: ChildRecord,
    K: ReactiveCollection<CompositeDocument<P, C>>,
{
    adapter: Arc<CompositeAdapter<P, C>>,
    collection: Arc<K>,
    config: ReplicationConfig,
    state: RwLock<ReplicationState>,
    stream: Mutex<Option<DocumentStream<P, C>>>,
    guard: SyncGuard,
    commit_sink: Option<Arc<dyn CommitSink>>,
    push_hook: Option<Arc<dyn PushHook>>,
}

impl<P, C, K> ReplicationBridge<P, C, K>
where
    P: SlotRecord,
    C: ChildRecord,
    K: ReactiveCollection<CompositeDocument<P, C>>,
{
    /// Creates a bridge in `Idle` mode.
    pub fn new(
        adapter: Arc<CompositeAdapter<P, C>>,
        collection: Arc<K>,
        config: ReplicationConfig,
    ) -> Self {
        Self {
            adapter,
            collection,
            config,
            state: RwLock::new(ReplicationState::new()),
            stream: Mutex::new(None),
            guard: SyncGuard::new(),
            commit_sink: None,
            push_hook: None,
        }
    }

    /// Sets the commit sink invoked after each push.
    #[must_use]
    pub fn with_commit_sink(mut self, sink: Arc<dyn CommitSink>) -> Self {
        self.commit_sink = Some(sink);
        self
    }

    /// Sets the post-push hook.
    #[must_use]
    pub fn with_push_hook(mut self, hook: Arc<dyn PushHook>) -> Self {
        self.push_hook = Some(hook);
        self
    }

    /// Shares a sync guard with the remote sync driver so push-applies and
    /// pull-reloads exclude each other.
    #[must_use]
    pub fn with_sync_guard(mut self, guard: SyncGuard) -> Self {
        self.guard = guard;
        self
    }

    /// Returns a snapshot of the replication state.
    pub fn state(&self) -> ReplicationState {
        *self.state.read()
    }

    /// Returns the sync guard this bridge acquires around push-applies.
    pub fn sync_guard(&self) -> SyncGuard {
        self.guard.clone()
    }

    /// Runs the initial pull and switches to live forwarding.
    ///
    /// Every start runs a full resync, including a restart after
    /// [`stop`](Self::stop): batches are bulk-inserted into the
    /// collection until one comes back smaller than the batch size.
    pub fn start(&self) -> ReplicationResult<()> {
        {
            let mut state = self.state.write();
            if !state.mode.can_start() {
                return Err(self.invalid_state("Idle or Stopped", state.mode));
            }
            state.mode = ReplicationMode::InitialPull;
            // A checkpoint from a previous run is stale: store changes made
            // while no subscription was live have no events to replay, so
            // every start pulls the full document set.
            state.checkpoint = None;
        }

        let mut checkpoint = None;
        loop {
            let batch = self.pull(checkpoint, self.config.batch_size);
            let pulled = batch.documents.len();
            checkpoint = Some(batch.checkpoint);
            self.collection.bulk_insert(batch.documents);
            debug!(pulled, "initial pull batch applied");
            if pulled < self.config.batch_size {
                break;
            }
        }

        *self.stream.lock() = Some(self.adapter.document_stream());
        let mut state = self.state.write();
        state.checkpoint = checkpoint;
        state.mode = ReplicationMode::Live;
        Ok(())
    }

    /// Forwards pending store-side changes into the collection.
    ///
    /// Returns the number of upserted documents.
    pub fn poll_remote_changes(&self) -> ReplicationResult<usize> {
        self.require_live()?;

        let stream = self.stream.lock();
        let Some(stream) = stream.as_ref() else {
            return Ok(0);
        };
        let Some(batch) = stream.poll() else {
            return Ok(0);
        };

        let count = batch.documents.len();
        for doc in batch.documents {
            self.collection.insert_or_update(doc);
        }
        self.state.write().checkpoint = Some(batch.checkpoint);
        debug!(count, "live documents forwarded to collection");
        Ok(count)
    }

    /// Applies pending collection-side local writes to the stores.
    ///
    /// Each document is decomposed and applied sequentially under the sync
    /// guard, then the commit sink runs and the post-push hook fires on
    /// its own thread. Returns the (always empty) conflict list alongside
    /// the push count.
    pub fn push_local_writes(&self) -> ReplicationResult<PushOutcome> {
        self.require_live()?;

        let docs = self.collection.take_local_writes();
        if docs.is_empty() {
            return Ok(PushOutcome {
                pushed: 0,
                conflicts: Vec::new(),
            });
        }

        {
            let _permit = self.guard.acquire();
            for doc in &docs {
                self.adapter.apply(doc)?;
            }
        }

        if let Some(sink) = &self.commit_sink {
            sink.commit().map_err(ReplicationError::Commit)?;
        }

        if let Some(hook) = &self.push_hook {
            // Fire and forget: the push returns before the hook finishes.
            let hook = Arc::clone(hook);
            std::thread::spawn(move || hook.after_push());
        }

        debug!(pushed = docs.len(), "local writes applied and committed");
        Ok(PushOutcome {
            pushed: docs.len(),
            conflicts: Vec::new(),
        })
    }

    /// Stops live forwarding, releasing the document-stream subscription.
    ///
    /// In-flight pushes are allowed to complete; subsequent polls and
    /// pushes are rejected until the bridge is started again.
    pub fn stop(&self) {
        if let Some(stream) = self.stream.lock().take() {
            stream.cancel();
        }
        self.state.write().mode = ReplicationMode::Stopped;
    }

    /// The checkpoint-aware pull source.
    ///
    /// Absent checkpoint means full resync: every document is returned.
    /// With a checkpoint, everything before it is already known and live
    /// changes flow through the document stream instead, so the batch is
    /// empty.
    fn pull(
        &self,
        checkpoint: Option<Checkpoint>,
        _batch_size: usize,
    ) -> lingodb_compose::DocumentBatch<P, C> {
        let documents = match checkpoint {
            None => self.adapter.read_all(),
            Some(_) => Vec::new(),
        };
        lingodb_compose::DocumentBatch {
            documents,
            checkpoint: Checkpoint::now(),
        }
    }

    fn require_live(&self) -> ReplicationResult<()> {
        let mode = self.state.read().mode;
        if mode != ReplicationMode::Live {
            return Err(self.invalid_state("Live", mode));
        }
        Ok(())
    }

    fn invalid_state(&self, expected: &'static str, found: ReplicationMode) -> ReplicationError {
        ReplicationError::InvalidState {
            expected,
            found: format!("{found:?}"),
        }
    }
}

impl<P, C, K> std::fmt::Debug for ReplicationBridge<P, C, K>
where
    P: SlotRecord,
    C: ChildRecord,
    K: ReactiveCollection<CompositeDocument<P, C>>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplicationBridge")
            .field("state", &*self.state.read())
            .finish_non_exhaustive()
    }
}
