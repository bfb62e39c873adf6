//! Bundle records: the parent type of the bundle/message join.

use lingodb_codec::SlotRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A message bundle: the language-independent identity of one translatable
/// message, shared by all of its per-locale [`Message`](crate::Message)
/// records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bundle {
    /// Unique bundle id, e.g. a human-readable message key.
    pub id: String,
    /// Optional per-tool aliases, keyed by tool name.
    ///
    /// A `BTreeMap` keeps the serialized order stable so repeated writes of
    /// an unchanged bundle do not produce spurious diffs.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub alias: BTreeMap<String, String>,
}

impl Bundle {
    /// Creates a bundle with no aliases.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            alias: BTreeMap::new(),
        }
    }

    /// Adds an alias for the given tool.
    #[must_use]
    pub fn with_alias(mut self, tool: impl Into<String>, alias: impl Into<String>) -> Self {
        self.alias.insert(tool.into(), alias.into());
        self
    }
}

impl SlotRecord for Bundle {
    fn id(&self) -> &str {
        &self.id
    }
}
