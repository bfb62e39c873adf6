//! Configuration for slot stores.

use lingodb_codec::{CodecResult, StoreGeometry};

/// Configuration for a [`SlotStore`](crate::SlotStore).
///
/// The geometry fields (`slots_per_file`, `file_name_width`) are fixed for
/// the lifetime of the store's directory: changing them changes every slot
/// address, so an existing directory would have to be fully rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotStoreConfig {
    /// Number of slots per slot file.
    pub slots_per_file: u32,
    /// Width of the hex filename prefix in characters.
    pub file_name_width: usize,
    /// File extension for slot files, without the dot.
    pub extension: String,
}

impl SlotStoreConfig {
    /// Creates the default configuration: 16^4 slots per file, 3-character
    /// filenames, `.slot` extension.
    pub fn new() -> Self {
        Self {
            slots_per_file: 16 * 16 * 16 * 16,
            file_name_width: 3,
            extension: "slot".into(),
        }
    }

    /// Sets the number of slots per file.
    #[must_use]
    pub fn with_slots_per_file(mut self, slots: u32) -> Self {
        self.slots_per_file = slots;
        self
    }

    /// Sets the filename prefix width.
    #[must_use]
    pub fn with_file_name_width(mut self, width: usize) -> Self {
        self.file_name_width = width;
        self
    }

    /// Sets the slot file extension.
    #[must_use]
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Validates the geometry fields.
    pub(crate) fn geometry(&self) -> CodecResult<StoreGeometry> {
        StoreGeometry::new(self.slots_per_file, self.file_name_width)
    }
}

impl Default for SlotStoreConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SlotStoreConfig::new();
        assert_eq!(config.slots_per_file, 65536);
        assert_eq!(config.file_name_width, 3);
        assert_eq!(config.extension, "slot");
        assert!(config.geometry().is_ok());
    }

    #[test]
    fn builder() {
        let config = SlotStoreConfig::new()
            .with_slots_per_file(256)
            .with_file_name_width(2)
            .with_extension("msg");
        assert_eq!(config.slots_per_file, 256);
        assert_eq!(config.file_name_width, 2);
        assert_eq!(config.extension, "msg");
    }

    #[test]
    fn invalid_geometry_rejected() {
        let config = SlotStoreConfig::new().with_slots_per_file(0);
        assert!(config.geometry().is_err());
    }
}
