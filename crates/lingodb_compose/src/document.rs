//! Composite documents and the child-record trait.

use lingodb_codec::SlotRecord;
use lingodb_model::Message;

/// A record that references a parent record by foreign id.
pub trait ChildRecord: SlotRecord {
    /// Returns the id of the parent this record belongs to.
    fn parent_id(&self) -> &str;
}

impl ChildRecord for Message {
    fn parent_id(&self) -> &str {
        &self.bundle_id
    }
}

/// A parent record joined with all children referencing it.
///
/// Derived, never separately persisted: constructed on read by
/// [`CompositeAdapter::combine`](crate::CompositeAdapter::combine) and
/// split back into parent and child writes on write.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeDocument<P, C> {
    /// The parent record.
    pub parent: P,
    /// All children referencing the parent. May be empty.
    pub children: Vec<C>,
}

impl<P: SlotRecord, C: ChildRecord> CompositeDocument<P, C> {
    /// Creates a document from a parent and its children.
    pub fn new(parent: P, children: Vec<C>) -> Self {
        Self { parent, children }
    }

    /// Returns the document id, which is the parent id.
    pub fn id(&self) -> &str {
        self.parent.id()
    }

    /// Returns the ids of all children.
    pub fn child_ids(&self) -> Vec<&str> {
        self.children.iter().map(|c| c.id()).collect()
    }
}
