//! The composite adapter: join on read, decompose on write.

use crate::document::{ChildRecord, CompositeDocument};
use crate::stream::DocumentStream;
use lingodb_codec::SlotRecord;
use lingodb_store::{SlotStore, StoreResult};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::debug;

/// A decomposed document write: one parent write plus the child upserts
/// and deletes that make the child store match the incoming document.
#[derive(Debug, Clone, PartialEq)]
pub struct DecomposedWrite<P, C> {
    /// The parent record to write.
    pub parent: P,
    /// Children present in the incoming document (insert or update each).
    pub child_upserts: Vec<C>,
    /// Ids of children that were previously attached to the parent but are
    /// absent from the incoming document.
    pub child_deletes: Vec<String>,
}

/// Joins a parent store and a child store into composite documents and
/// inverts document writes back into the two stores.
///
/// The adapter is the only writer-of-record for the pair: it never issues
/// concurrent writes to the same parent id, which is what makes the
/// store-level last-write-wins semantics safe here.
pub struct CompositeAdapter<P: SlotRecord, C: ChildRecord> {
    parents: Arc<SlotStore<P>>,
    children: Arc<SlotStore<C>>,
}

impl<P: SlotRecord, C: ChildRecord> CompositeAdapter<P, C> {
    /// Creates an adapter over the two stores.
    pub fn new(parents: Arc<SlotStore<P>>, children: Arc<SlotStore<C>>) -> Self {
        Self { parents, children }
    }

    /// Returns the parent store.
    pub fn parent_store(&self) -> &Arc<SlotStore<P>> {
        &self.parents
    }

    /// Returns the child store.
    pub fn child_store(&self) -> &Arc<SlotStore<C>> {
        &self.children
    }

    /// Groups children by their foreign key and attaches each group to its
    /// parent.
    ///
    /// Parents with no children yield a document with an empty child list,
    /// never an omitted document. Children whose parent is not in
    /// `parents` are dropped.
    pub fn combine(parents: Vec<P>, children: Vec<C>) -> BTreeMap<String, CompositeDocument<P, C>> {
        let mut documents: BTreeMap<String, CompositeDocument<P, C>> = parents
            .into_iter()
            .map(|p| (p.id().to_string(), CompositeDocument::new(p, Vec::new())))
            .collect();

        let mut orphans = 0usize;
        for child in children {
            match documents.get_mut(child.parent_id()) {
                Some(doc) => doc.children.push(child),
                None => orphans += 1,
            }
        }
        if orphans > 0 {
            debug!(orphans, "children without a loaded parent were dropped from the join");
        }
        documents
    }

    /// Reads all composite documents from the two stores.
    pub fn read_all(&self) -> Vec<CompositeDocument<P, C>> {
        Self::combine(self.parents.read_all(), self.children.read_all())
            .into_values()
            .collect()
    }

    /// Reads the composite documents for the given parent ids.
    ///
    /// Missing parents are skipped, mirroring the store lookup semantics.
    pub fn documents_by_parent_ids<S: AsRef<str>>(&self, ids: &[S]) -> Vec<CompositeDocument<P, C>> {
        let parents = self.parents.find_documents_by_id(ids);
        let wanted: BTreeSet<&str> = parents.iter().map(|p| p.id()).collect();
        let children = self
            .children
            .read_all()
            .into_iter()
            .filter(|c| wanted.contains(c.parent_id()))
            .collect();
        Self::combine(parents, children).into_values().collect()
    }

    /// Returns the children currently attached to a parent.
    pub fn children_of(&self, parent_id: &str) -> Vec<C> {
        self.children
            .read_all()
            .into_iter()
            .filter(|c| c.parent_id() == parent_id)
            .collect()
    }

    /// Splits a document into a parent write plus child upserts and
    /// deletes.
    ///
    /// Deletes are the set difference between the previously known child
    /// ids for this parent (read from the child store) and the child ids
    /// present in the incoming document.
    pub fn decompose(&self, doc: &CompositeDocument<P, C>) -> DecomposedWrite<P, C> {
        let incoming: BTreeSet<&str> = doc.children.iter().map(|c| c.id()).collect();
        let child_deletes = self
            .children_of(doc.id())
            .into_iter()
            .filter(|prior| !incoming.contains(prior.id()))
            .map(|prior| prior.id().to_string())
            .collect();

        DecomposedWrite {
            parent: doc.parent.clone(),
            child_upserts: doc.children.clone(),
            child_deletes,
        }
    }

    /// Applies a document write: parent first, then child upserts, then
    /// child deletes.
    ///
    /// Not atomic across the two stores; a concurrent reader may observe
    /// the parent with stale children until the child writes land.
    pub fn apply(&self, doc: &CompositeDocument<P, C>) -> StoreResult<()> {
        let write = self.decompose(doc);

        self.upsert_parent(write.parent)?;
        for child in write.child_upserts {
            self.upsert_child(child)?;
        }
        for id in &write.child_deletes {
            self.children.delete(id)?;
        }
        Ok(())
    }

    /// Opens a document-level change stream over both stores.
    pub fn document_stream(&self) -> DocumentStream<P, C> {
        DocumentStream::new(Arc::clone(&self.parents), Arc::clone(&self.children))
    }

    fn upsert_parent(&self, parent: P) -> StoreResult<()> {
        let exists = !self
            .parents
            .find_documents_by_id(&[parent.id()])
            .is_empty();
        if exists {
            self.parents.update(parent)
        } else {
            self.parents.insert(parent)
        }
    }

    fn upsert_child(&self, child: C) -> StoreResult<()> {
        let exists = !self
            .children
            .find_documents_by_id(&[child.id()])
            .is_empty();
        if exists {
            self.children.update(child)
        } else {
            self.children.insert(child)
        }
    }
}

impl<P: SlotRecord, C: ChildRecord> std::fmt::Debug for CompositeAdapter<P, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeAdapter")
            .field("parents", &self.parents.len())
            .field("children", &self.children.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lingodb_model::{Bundle, Message, Variant};
    use lingodb_store::SlotStoreConfig;
    use tempfile::{tempdir, TempDir};

    type Adapter = CompositeAdapter<Bundle, Message>;

    fn adapter() -> (Adapter, TempDir) {
        let dir = tempdir().unwrap();
        let parents = Arc::new(SlotStore::new(SlotStoreConfig::new()).unwrap());
        let children = Arc::new(SlotStore::new(SlotStoreConfig::new()).unwrap());
        parents.connect(&dir.path().join("bundles")).unwrap();
        children.connect(&dir.path().join("messages")).unwrap();
        (CompositeAdapter::new(parents, children), dir)
    }

    fn message(id: &str, bundle_id: &str, locale: &str) -> Message {
        Message::new(id, bundle_id, locale).with_variant(Variant::text("v", "text"))
    }

    #[test]
    fn combine_attaches_children_to_their_parent() {
        let documents = Adapter::combine(
            vec![Bundle::new("b1"), Bundle::new("b2")],
            vec![
                message("m1", "b1", "en"),
                message("m2", "b1", "de"),
                message("m3", "b2", "en"),
            ],
        );

        assert_eq!(documents["b1"].children.len(), 2);
        assert_eq!(documents["b2"].children.len(), 1);
    }

    #[test]
    fn childless_parent_yields_empty_children_not_omission() {
        let documents = Adapter::combine(vec![Bundle::new("lonely")], vec![]);
        assert_eq!(documents.len(), 1);
        assert!(documents["lonely"].children.is_empty());
    }

    #[test]
    fn orphan_children_are_dropped() {
        let documents = Adapter::combine(
            vec![Bundle::new("b1")],
            vec![message("m1", "b1", "en"), message("mx", "unknown", "en")],
        );
        assert_eq!(documents.len(), 1);
        assert_eq!(documents["b1"].children.len(), 1);
    }

    #[test]
    fn decompose_detects_exactly_the_removed_child() {
        let (adapter, _dir) = adapter();

        adapter
            .apply(&CompositeDocument::new(
                Bundle::new("b1"),
                vec![
                    message("a", "b1", "en"),
                    message("b", "b1", "de"),
                    message("c", "b1", "fr"),
                ],
            ))
            .unwrap();

        let write = adapter.decompose(&CompositeDocument::new(
            Bundle::new("b1"),
            vec![message("a", "b1", "en"), message("c", "b1", "fr")],
        ));

        assert_eq!(write.child_deletes, vec!["b".to_string()]);
        assert_eq!(write.child_upserts.len(), 2);
    }

    #[test]
    fn apply_inserts_then_updates() {
        let (adapter, _dir) = adapter();

        let doc = CompositeDocument::new(Bundle::new("b1"), vec![message("m1", "b1", "en")]);
        adapter.apply(&doc).unwrap();
        assert_eq!(adapter.parent_store().len(), 1);
        assert_eq!(adapter.child_store().len(), 1);

        // Second apply with a changed child set: m1 survives, m2 appears.
        let doc = CompositeDocument::new(
            Bundle::new("b1"),
            vec![message("m1", "b1", "en"), message("m2", "b1", "de")],
        );
        adapter.apply(&doc).unwrap();
        assert_eq!(adapter.child_store().len(), 2);
    }

    #[test]
    fn apply_deletes_dropped_children() {
        let (adapter, _dir) = adapter();

        adapter
            .apply(&CompositeDocument::new(
                Bundle::new("b1"),
                vec![message("m1", "b1", "en"), message("m2", "b1", "de")],
            ))
            .unwrap();

        adapter
            .apply(&CompositeDocument::new(
                Bundle::new("b1"),
                vec![message("m1", "b1", "en")],
            ))
            .unwrap();

        let remaining = adapter.children_of("b1");
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, "m1");
    }

    #[test]
    fn read_all_joins_both_stores() {
        let (adapter, _dir) = adapter();

        adapter.parent_store().insert(Bundle::new("b1")).unwrap();
        adapter.parent_store().insert(Bundle::new("b2")).unwrap();
        adapter
            .child_store()
            .insert(message("m1", "b1", "en"))
            .unwrap();

        let documents = adapter.read_all();
        assert_eq!(documents.len(), 2);
        let b1 = documents.iter().find(|d| d.id() == "b1").unwrap();
        let b2 = documents.iter().find(|d| d.id() == "b2").unwrap();
        assert_eq!(b1.children.len(), 1);
        assert!(b2.children.is_empty());
    }

    #[test]
    fn documents_by_parent_ids_skips_missing() {
        let (adapter, _dir) = adapter();
        adapter.parent_store().insert(Bundle::new("b1")).unwrap();

        let documents = adapter.documents_by_parent_ids(&["b1", "missing"]);
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].id(), "b1");
    }
}
