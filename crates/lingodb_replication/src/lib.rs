//! # lingodb Replication
//!
//! Drives a pull/push protocol between the composite adapter and an
//! external reactive collection.
//!
//! The [`ReplicationBridge`] pulls the full document set into the
//! collection on start, then forwards live store changes as upserts and
//! applies collection-side local writes back through the adapter. All
//! replication state (mode, checkpoint, subscription) is owned by the
//! bridge instance: multiple bridges - one per record type pair, say -
//! are independently constructible and testable.
//!
//! ```text
//! collection local write -> push -> adapter.decompose -> store writes -> commit
//! remote pull -> store reload -> change event -> combine -> pull stream -> upsert
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod bridge;
mod collection;
mod error;

pub use bridge::{
    CommitSink, Conflict, PushHook, PushOutcome, ReplicationBridge, ReplicationConfig,
    ReplicationMode, ReplicationState,
};
pub use collection::{MemoryCollection, ReactiveCollection, ReplicatedDocument};
pub use error::{BoxError, ReplicationError, ReplicationResult};
