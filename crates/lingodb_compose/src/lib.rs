//! # lingodb Compose
//!
//! Joins two independently-stored record types - a parent store and a
//! child store - into one logical document for consumers, and decomposes
//! writes back into the two stores.
//!
//! The canonical instantiation is bundles (parents) joined with their
//! messages (children referencing the bundle by `bundle_id`), but the
//! adapter is generic over any [`SlotRecord`](lingodb_codec::SlotRecord)
//! parent and [`ChildRecord`] child.
//!
//! The adapter is the sole writer-of-record for parent/child consistency:
//! a decomposed write is applied parent-first and is not atomic across the
//! two stores, so readers may briefly observe a parent with stale or
//! missing children. Downstream consumers tolerate that staleness.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod adapter;
mod checkpoint;
mod document;
mod stream;

pub use adapter::{CompositeAdapter, DecomposedWrite};
pub use checkpoint::Checkpoint;
pub use document::{ChildRecord, CompositeDocument};
pub use stream::{DocumentBatch, DocumentStream};
