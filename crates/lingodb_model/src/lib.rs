//! # lingodb Model
//!
//! The translation record types persisted by lingodb's slot stores.
//!
//! A [`Bundle`] groups every translation of one source message under a
//! shared id. Each [`Message`] is the translation of a bundle into one
//! locale and references its bundle by `bundle_id`; bundles and messages
//! are stored in two independent slot stores and joined on read by the
//! composite adapter.
//!
//! The on-disk JSON field names are camelCase so working-copy diffs match
//! what collaborating editors produce.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod bundle;
mod message;

pub use bundle::Bundle;
pub use message::{Message, PatternPart, Variant};
