//! Document-level change stream over the two record stores.

use crate::adapter::CompositeAdapter;
use crate::checkpoint::Checkpoint;
use crate::document::{ChildRecord, CompositeDocument};
use lingodb_codec::SlotRecord;
use lingodb_store::{RecordChange, RecordsChanged, SlotStore, Subscription};
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// A batch of re-joined documents, keyed by the checkpoint at which they
/// were observed.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentBatch<P, C> {
    /// The changed documents, fully re-joined.
    pub documents: Vec<CompositeDocument<P, C>>,
    /// Checkpoint for resuming the pull protocol after this batch.
    pub checkpoint: Checkpoint,
}

/// A pull-based stream of document changes.
///
/// Subscribes to the change feeds of both underlying stores and, on each
/// [`poll`](Self::poll), re-joins every parent whose content (or whose
/// children) changed since the previous poll.
///
/// Dropping the stream (or calling [`cancel`](Self::cancel)) releases both
/// feed subscriptions.
pub struct DocumentStream<P: SlotRecord, C: ChildRecord> {
    parents: Arc<SlotStore<P>>,
    children: Arc<SlotStore<C>>,
    parent_events: Subscription<RecordsChanged<P>>,
    child_events: Subscription<RecordsChanged<C>>,
    /// child id -> parent id, needed to attribute child deletions (their
    /// change event carries only the child id).
    child_index: Mutex<HashMap<String, String>>,
}

impl<P: SlotRecord, C: ChildRecord> DocumentStream<P, C> {
    pub(crate) fn new(parents: Arc<SlotStore<P>>, children: Arc<SlotStore<C>>) -> Self {
        let parent_events = parents.subscribe();
        let child_events = children.subscribe();
        let child_index = children
            .read_all()
            .into_iter()
            .map(|c| (c.id().to_string(), c.parent_id().to_string()))
            .collect();
        Self {
            parents,
            children,
            parent_events,
            child_events,
            child_index: Mutex::new(child_index),
        }
    }

    /// Drains pending store events and returns the affected documents,
    /// re-joined, or `None` when nothing changed.
    ///
    /// Parents that were deleted outright are not re-joined (there is
    /// nothing left to join); consumers pick deletions up on the next full
    /// resync.
    pub fn poll(&self) -> Option<DocumentBatch<P, C>> {
        let mut changed_parents: BTreeSet<String> = BTreeSet::new();

        for batch in self.parent_events.drain() {
            for entry in batch.entries {
                if let RecordChange::Upserted(parent) = entry {
                    changed_parents.insert(parent.id().to_string());
                }
            }
        }

        {
            let mut index = self.child_index.lock();
            for batch in self.child_events.drain() {
                for entry in batch.entries {
                    match entry {
                        RecordChange::Upserted(child) => {
                            changed_parents.insert(child.parent_id().to_string());
                            index.insert(child.id().to_string(), child.parent_id().to_string());
                        }
                        RecordChange::Deleted { id } => {
                            if let Some(parent_id) = index.remove(&id) {
                                changed_parents.insert(parent_id);
                            }
                        }
                    }
                }
            }
        }

        if changed_parents.is_empty() {
            return None;
        }

        let ids: Vec<String> = changed_parents.into_iter().collect();
        let parents = self.parents.find_documents_by_id(&ids);
        let wanted: BTreeSet<&str> = parents.iter().map(|p| p.id()).collect();
        let children = self
            .children
            .read_all()
            .into_iter()
            .filter(|c| wanted.contains(c.parent_id()))
            .collect();

        Some(DocumentBatch {
            documents: CompositeAdapter::combine(parents, children)
                .into_values()
                .collect(),
            checkpoint: Checkpoint::now(),
        })
    }

    /// Cancels the stream, releasing both store subscriptions.
    pub fn cancel(self) {
        // Dropping the subscriptions unregisters them.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lingodb_model::{Bundle, Message};
    use lingodb_store::SlotStoreConfig;
    use tempfile::tempdir;

    fn setup() -> (
        CompositeAdapter<Bundle, Message>,
        DocumentStream<Bundle, Message>,
        tempfile::TempDir,
    ) {
        let dir = tempdir().unwrap();
        let parents = Arc::new(SlotStore::new(SlotStoreConfig::new()).unwrap());
        let children = Arc::new(SlotStore::new(SlotStoreConfig::new()).unwrap());
        parents.connect(&dir.path().join("bundles")).unwrap();
        children.connect(&dir.path().join("messages")).unwrap();
        let adapter = CompositeAdapter::new(parents, children);
        let stream = adapter.document_stream();
        (adapter, stream, dir)
    }

    #[test]
    fn quiet_stream_polls_none() {
        let (_adapter, stream, _dir) = setup();
        assert!(stream.poll().is_none());
    }

    #[test]
    fn child_insert_rejoins_its_parent() {
        let (adapter, stream, _dir) = setup();

        adapter.parent_store().insert(Bundle::new("b1")).unwrap();
        stream.poll();

        adapter
            .child_store()
            .insert(Message::new("m1", "b1", "en"))
            .unwrap();

        let batch = stream.poll().unwrap();
        assert_eq!(batch.documents.len(), 1);
        assert_eq!(batch.documents[0].id(), "b1");
        assert_eq!(batch.documents[0].children.len(), 1);
    }

    #[test]
    fn child_delete_is_attributed_to_its_parent() {
        let (adapter, _ignored, _dir) = setup();

        adapter.parent_store().insert(Bundle::new("b1")).unwrap();
        adapter
            .child_store()
            .insert(Message::new("m1", "b1", "en"))
            .unwrap();
        adapter
            .child_store()
            .insert(Message::new("m2", "b1", "de"))
            .unwrap();

        // Open a second stream after the setup writes; its child index is
        // seeded from the store state.
        let stream = adapter.document_stream();
        adapter.child_store().delete("m2").unwrap();

        let batch = stream.poll().unwrap();
        assert_eq!(batch.documents.len(), 1);
        assert_eq!(batch.documents[0].children.len(), 1);
        assert_eq!(batch.documents[0].children[0].id, "m1");
    }

    #[test]
    fn checkpoints_advance_across_batches() {
        let (adapter, stream, _dir) = setup();

        adapter.parent_store().insert(Bundle::new("b1")).unwrap();
        let first = stream.poll().unwrap();

        adapter.parent_store().update(Bundle::new("b1")).unwrap();
        // An unchanged body still counts as a store-level upsert event.
        let second = stream.poll().unwrap();

        assert!(second.checkpoint > first.checkpoint);
    }

    #[test]
    fn deleted_parent_is_not_rejoined() {
        let (adapter, stream, _dir) = setup();

        adapter.parent_store().insert(Bundle::new("b1")).unwrap();
        stream.poll();

        adapter.parent_store().delete("b1").unwrap();
        assert!(stream.poll().is_none());
    }
}
