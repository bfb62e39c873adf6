//! Deterministic mapping from record ids to slot addresses.

use crate::error::{CodecError, CodecResult};
use sha2::{Digest, Sha256};
use std::fmt;

/// Number of hex digits taken after the filename prefix to derive the slot
/// index. Eight digits fit exactly in a `u32`.
const SLOT_INDEX_DIGITS: usize = 8;

/// Total hex digits produced by the bucket hash.
const HASH_DIGITS: usize = 64;

/// The address of a record: which slot file it lives in and which slot
/// within that file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SlotAddress {
    /// Fixed-width hex prefix that names the slot file.
    pub file_id: String,
    /// Slot index within the file.
    pub slot_index: u32,
}

impl fmt::Display for SlotAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.file_id, self.slot_index)
    }
}

/// Validated store geometry: how many slots one file holds and how many hex
/// characters of the bucket hash name a file.
///
/// Geometry is fixed for the lifetime of a store. Changing it invalidates
/// every existing address; there is no in-place migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreGeometry {
    slots_per_file: u32,
    file_name_width: usize,
}

impl StoreGeometry {
    /// Creates a validated geometry.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidGeometry`] if `slots_per_file` is zero
    /// or `file_name_width` is zero or too wide to leave room for the slot
    /// index digits within the hash.
    pub fn new(slots_per_file: u32, file_name_width: usize) -> CodecResult<Self> {
        if slots_per_file == 0 {
            return Err(CodecError::InvalidGeometry {
                reason: "slots_per_file must be at least 1".into(),
            });
        }
        if file_name_width == 0 {
            return Err(CodecError::InvalidGeometry {
                reason: "file_name_width must be at least 1".into(),
            });
        }
        if file_name_width + SLOT_INDEX_DIGITS > HASH_DIGITS {
            return Err(CodecError::InvalidGeometry {
                reason: format!(
                    "file_name_width {file_name_width} leaves no room for the slot index"
                ),
            });
        }
        Ok(Self {
            slots_per_file,
            file_name_width,
        })
    }

    /// Returns the number of slots per file.
    #[must_use]
    pub fn slots_per_file(&self) -> u32 {
        self.slots_per_file
    }

    /// Returns the filename prefix width in hex characters.
    #[must_use]
    pub fn file_name_width(&self) -> usize {
        self.file_name_width
    }

    /// Computes the slot address for a record id.
    ///
    /// Pure: the same id always yields the same address for this geometry,
    /// across calls and across process restarts. This determinism is what
    /// keeps version-control diffs small - unrelated edits never perturb
    /// unrelated slots.
    #[must_use]
    pub fn address_of(&self, id: &str) -> SlotAddress {
        let digest = Sha256::digest(id.as_bytes());
        let hex = hex_string(&digest);

        let file_id = hex[..self.file_name_width].to_string();
        let index_digits = &hex[self.file_name_width..self.file_name_width + SLOT_INDEX_DIGITS];
        // Eight hex digits always parse into a u32.
        let raw = u32::from_str_radix(index_digits, 16).unwrap_or(0);

        SlotAddress {
            file_id,
            slot_index: raw % self.slots_per_file,
        }
    }
}

fn hex_string(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        use fmt::Write;
        // Writing to a String never fails.
        let _ = write!(out, "{b:02x}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geometry_rejects_zero_slots() {
        assert!(matches!(
            StoreGeometry::new(0, 3),
            Err(CodecError::InvalidGeometry { .. })
        ));
    }

    #[test]
    fn geometry_rejects_zero_width() {
        assert!(matches!(
            StoreGeometry::new(16, 0),
            Err(CodecError::InvalidGeometry { .. })
        ));
    }

    #[test]
    fn geometry_rejects_excessive_width() {
        assert!(matches!(
            StoreGeometry::new(16, 60),
            Err(CodecError::InvalidGeometry { .. })
        ));
    }

    #[test]
    fn address_is_deterministic() {
        let geometry = StoreGeometry::new(65536, 3).unwrap();
        let a = geometry.address_of("bundle-1");
        let b = geometry.address_of("bundle-1");
        assert_eq!(a, b);
    }

    #[test]
    fn file_id_has_configured_width() {
        let geometry = StoreGeometry::new(65536, 3).unwrap();
        let address = geometry.address_of("any-id");
        assert_eq!(address.file_id.len(), 3);
        assert!(address.file_id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn slot_index_respects_capacity() {
        let geometry = StoreGeometry::new(7, 2).unwrap();
        for i in 0..100 {
            let address = geometry.address_of(&format!("id-{i}"));
            assert!(address.slot_index < 7);
        }
    }

    #[test]
    fn different_geometry_changes_addresses() {
        let narrow = StoreGeometry::new(65536, 3).unwrap();
        let wide = StoreGeometry::new(65536, 4).unwrap();
        let a = narrow.address_of("bundle-1");
        let b = wide.address_of("bundle-1");
        assert_ne!(a.file_id.len(), b.file_id.len());
    }

    #[test]
    fn ids_spread_across_files() {
        let geometry = StoreGeometry::new(65536, 3).unwrap();
        let mut files = std::collections::HashSet::new();
        for i in 0..200 {
            files.insert(geometry.address_of(&format!("id-{i}")).file_id);
        }
        // With a 3-hex-digit prefix, 200 ids virtually never collapse into
        // a handful of files.
        assert!(files.len() > 100);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn deterministic_for_any_id(id in ".{0,64}") {
                let geometry = StoreGeometry::new(65536, 3).unwrap();
                prop_assert_eq!(geometry.address_of(&id), geometry.address_of(&id));
            }

            #[test]
            fn index_always_in_bounds(id in ".{0,64}", slots in 1u32..100_000) {
                let geometry = StoreGeometry::new(slots, 3).unwrap();
                prop_assert!(geometry.address_of(&id).slot_index < slots);
            }
        }
    }
}
