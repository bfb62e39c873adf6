//! Encoding and decoding of single records into slot bodies.

use crate::error::{CodecError, CodecResult};
use crate::record::SlotRecord;

/// Encodes a record into the byte payload stored in its slot.
///
/// The payload is compact JSON. Compact (single-line) form matters because
/// a slot file stores one slot per line; pretty-printing would break the
/// line framing.
///
/// # Errors
///
/// Returns [`CodecError::Serialize`] if the record cannot be serialized.
pub fn encode<R: SlotRecord>(record: &R) -> CodecResult<Vec<u8>> {
    serde_json::to_vec(record).map_err(|e| CodecError::Serialize(e.to_string()))
}

/// Decodes a slot body back into a record.
///
/// # Errors
///
/// Returns [`CodecError::CorruptSlot`] on malformed bytes. Callers are
/// expected to treat the slot as empty and continue; a crashed process may
/// leave a partially written slot behind.
pub fn decode<R: SlotRecord>(bytes: &[u8]) -> CodecResult<R> {
    serde_json::from_slice(bytes).map_err(|e| CodecError::corrupt(e.to_string()))
}
