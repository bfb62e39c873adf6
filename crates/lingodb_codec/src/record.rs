//! The record trait implemented by everything a slot store can persist.

use serde::de::DeserializeOwned;
use serde::Serialize;

/// A uniquely-identified record that can live in a slot store.
///
/// Records of one logical type share a store. The id is caller-supplied and
/// opaque to the storage layer; it only has to be stable, since the slot
/// address is derived from it.
pub trait SlotRecord:
    Serialize + DeserializeOwned + Clone + PartialEq + Send + Sync + 'static
{
    /// Returns the unique id of this record.
    fn id(&self) -> &str;
}
