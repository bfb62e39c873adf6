//! # lingodb Store
//!
//! The slot-file storage engine: a directory of small, independently
//! addressable files holding one record type, kept mirrored in memory.
//!
//! Every record id maps to a fixed (file, slot) pair via the bucket
//! function in `lingodb_codec`. Unrelated edits therefore never touch
//! unrelated files, which keeps diffs against a version-controlled working
//! copy minimal and mergeable.
//!
//! ## Components
//!
//! - [`SlotFile`] - one on-disk container of up to `slots_per_file` slots,
//!   sparse, line-oriented
//! - [`SlotStore`] - owns a directory of slot files, exposes CRUD plus
//!   [`SlotStore::load_slot_files_from_working_copy`] for picking up
//!   external changes (e.g. after a remote pull)
//! - [`ChangeFeed`] - typed multi-subscriber change notification with
//!   explicit cancellation
//!
//! ## Failure model
//!
//! A corrupt slot (partial write from a crashed process, malformed line) is
//! logged, counted, and treated as empty. It never aborts a scan and never
//! propagates to callers.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod change_feed;
mod config;
mod error;
mod slot_file;
mod store;
mod sync_guard;

pub use change_feed::{ChangeFeed, RecordChange, RecordsChanged, Subscription};
pub use config::SlotStoreConfig;
pub use error::{StoreError, StoreResult};
pub use slot_file::{ScanOutcome, SlotFile, SlotState};
pub use store::{ConnectReport, ReloadReport, SlotStore};
pub use sync_guard::{SyncGuard, SyncPermit};
