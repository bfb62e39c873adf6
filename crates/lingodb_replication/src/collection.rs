//! The reactive-collection seam and an in-memory implementation.

use lingodb_codec::SlotRecord;
use lingodb_compose::{ChildRecord, CompositeDocument};
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;

/// A document that can live in a reactive collection.
pub trait ReplicatedDocument: Clone + Send + Sync + 'static {
    /// Returns the document's unique id.
    fn doc_id(&self) -> &str;
}

impl<P: SlotRecord, C: ChildRecord> ReplicatedDocument for CompositeDocument<P, C> {
    fn doc_id(&self) -> &str {
        self.id()
    }
}

/// The reactive collection the application queries.
///
/// This is the external collaborator of the replication bridge: the bridge
/// pushes remote-originated documents in via the upsert methods and drains
/// application-originated writes out via
/// [`take_local_writes`](Self::take_local_writes).
pub trait ReactiveCollection<D: ReplicatedDocument>: Send + Sync {
    /// Upserts a single document.
    fn insert_or_update(&self, doc: D);

    /// Upserts a batch of documents (initial pull).
    fn bulk_insert(&self, docs: Vec<D>);

    /// Drains the queue of local writes awaiting replication.
    ///
    /// Returns an empty vector when nothing is pending.
    fn take_local_writes(&self) -> Vec<D>;
}

/// An in-memory reactive collection.
///
/// Used in tests and by embedders that do not bring their own collection.
/// Application writes go through [`write_local`](Self::write_local), which
/// updates the visible state optimistically and queues the document for
/// the bridge's next push.
pub struct MemoryCollection<D: ReplicatedDocument> {
    docs: RwLock<BTreeMap<String, D>>,
    local_writes: Mutex<Vec<D>>,
}

impl<D: ReplicatedDocument> MemoryCollection<D> {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self {
            docs: RwLock::new(BTreeMap::new()),
            local_writes: Mutex::new(Vec::new()),
        }
    }

    /// Writes a document locally: visible immediately, replicated on the
    /// bridge's next push.
    pub fn write_local(&self, doc: D) {
        self.docs
            .write()
            .insert(doc.doc_id().to_string(), doc.clone());
        self.local_writes.lock().push(doc);
    }

    /// Returns a document by id.
    pub fn get(&self, id: &str) -> Option<D> {
        self.docs.read().get(id).cloned()
    }

    /// Returns all documents.
    pub fn all(&self) -> Vec<D> {
        self.docs.read().values().cloned().collect()
    }

    /// Returns the number of documents.
    pub fn len(&self) -> usize {
        self.docs.read().len()
    }

    /// Returns true if the collection holds no documents.
    pub fn is_empty(&self) -> bool {
        self.docs.read().is_empty()
    }
}

impl<D: ReplicatedDocument> Default for MemoryCollection<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: ReplicatedDocument> ReactiveCollection<D> for MemoryCollection<D> {
    fn insert_or_update(&self, doc: D) {
        self.docs.write().insert(doc.doc_id().to_string(), doc);
    }

    fn bulk_insert(&self, docs: Vec<D>) {
        let mut map = self.docs.write();
        for doc in docs {
            map.insert(doc.doc_id().to_string(), doc);
        }
    }

    fn take_local_writes(&self) -> Vec<D> {
        std::mem::take(&mut *self.local_writes.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Doc(String);

    impl ReplicatedDocument for Doc {
        fn doc_id(&self) -> &str {
            &self.0
        }
    }

    #[test]
    fn upsert_replaces_by_id() {
        let collection = MemoryCollection::new();
        collection.insert_or_update(Doc("a".into()));
        collection.insert_or_update(Doc("a".into()));
        assert_eq!(collection.len(), 1);
    }

    #[test]
    fn local_write_is_visible_and_queued() {
        let collection = MemoryCollection::new();
        collection.write_local(Doc("a".into()));

        assert!(collection.get("a").is_some());
        assert_eq!(collection.take_local_writes().len(), 1);
        // The queue drains.
        assert!(collection.take_local_writes().is_empty());
    }

    #[test]
    fn bulk_insert_inserts_all() {
        let collection = MemoryCollection::new();
        collection.bulk_insert(vec![Doc("a".into()), Doc("b".into())]);
        assert_eq!(collection.len(), 2);
    }
}
