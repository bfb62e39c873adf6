//! # lingodb Codec
//!
//! Slot codec and deterministic bucket addressing for lingodb.
//!
//! This crate defines how a single record is serialized into a slot and how
//! a record id is mapped to its slot address. It has no knowledge of slot
//! files or directories - those live in `lingodb_store`.
//!
//! ## Design Principles
//!
//! - Slot bodies are compact JSON: the working copy is tracked by a
//!   version-control remote and text payloads keep diffs mergeable
//! - Addressing is a pure function of the record id and the store geometry;
//!   the same id always lands in the same (file, slot) pair
//! - Malformed slot bytes decode to [`CodecError::CorruptSlot`], never a
//!   panic - partial writes from a crashed process are expected
//!
//! ## Example
//!
//! ```rust
//! use lingodb_codec::{decode, encode, SlotRecord, StoreGeometry};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
//! struct Note { id: String, body: String }
//!
//! impl SlotRecord for Note {
//!     fn id(&self) -> &str { &self.id }
//! }
//!
//! let note = Note { id: "greeting".into(), body: "hello".into() };
//! let bytes = encode(&note).unwrap();
//! assert_eq!(decode::<Note>(&bytes).unwrap(), note);
//!
//! let geometry = StoreGeometry::new(65536, 3).unwrap();
//! let address = geometry.address_of("greeting");
//! assert_eq!(address, geometry.address_of("greeting"));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod address;
mod codec;
mod error;
mod record;

pub use address::{SlotAddress, StoreGeometry};
pub use codec::{decode, encode};
pub use error::{CodecError, CodecResult};
pub use record::SlotRecord;
