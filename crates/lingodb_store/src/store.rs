//! The slot store: a directory of slot files for one record type,
//! mirrored in memory.

use crate::change_feed::{ChangeFeed, RecordChange, RecordsChanged, Subscription};
use crate::config::SlotStoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::slot_file::{SlotFile, SlotState};
use lingodb_codec::{decode, encode, CodecError, SlotRecord, StoreGeometry};
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

/// Report returned by [`SlotStore::connect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectReport {
    /// Number of records loaded into memory.
    pub records_loaded: usize,
    /// Number of corrupt slots skipped during the scan.
    pub corrupt_slots: usize,
}

/// Report returned by [`SlotStore::load_slot_files_from_working_copy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReloadReport {
    /// True if the scan was skipped because no external change was known.
    pub skipped: bool,
    /// Number of entries whose content changed (added, removed, or body
    /// differs).
    pub changed: usize,
    /// Number of corrupt slots skipped during the scan.
    pub corrupt_slots: usize,
}

impl ReloadReport {
    fn skipped() -> Self {
        Self {
            skipped: true,
            changed: 0,
            corrupt_slots: 0,
        }
    }
}

/// A slot store for one record type.
///
/// The store exclusively owns the slot files under its directory within
/// this process. Opening the same directory from two processes is
/// undefined behavior at the data level (documented limitation; there is
/// no cross-process lock).
///
/// # Consistency
///
/// Immediately after [`connect`](Self::connect) or a successful reload the
/// in-memory state equals the on-disk state. Between a local write and its
/// flush, or between an external pull and the next reload, the two may
/// diverge.
///
/// # Concurrency
///
/// All methods take `&self`. Writes are serialized internally; reads never
/// block behind writers beyond the brief state-map lock. Two callers
/// racing on the same id get call-completion order, last write wins.
pub struct SlotStore<R: SlotRecord> {
    geometry: StoreGeometry,
    extension: String,
    directory: RwLock<Option<PathBuf>>,
    state: RwLock<BTreeMap<String, R>>,
    feed: ChangeFeed<RecordsChanged<R>>,
    externally_modified: AtomicBool,
    /// Serializes disk writes and reload scans.
    write_lock: Mutex<()>,
}

impl<R: SlotRecord> SlotStore<R> {
    /// Creates a store with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured geometry is invalid.
    pub fn new(config: SlotStoreConfig) -> StoreResult<Self> {
        let geometry = config.geometry()?;
        Ok(Self {
            geometry,
            extension: config.extension,
            directory: RwLock::new(None),
            state: RwLock::new(BTreeMap::new()),
            feed: ChangeFeed::new(),
            externally_modified: AtomicBool::new(false),
            write_lock: Mutex::new(()),
        })
    }

    /// Connects the store to a directory, scanning every slot file into
    /// memory.
    ///
    /// Creates the directory if it does not exist. Idempotent: calling
    /// again re-scans and replaces the in-memory state without emitting
    /// change events.
    pub fn connect(&self, directory: &Path) -> StoreResult<ConnectReport> {
        std::fs::create_dir_all(directory)?;

        let _guard = self.write_lock.lock();
        let (records, corrupt_slots) = self.scan(directory)?;
        let records_loaded = records.len();

        *self.directory.write() = Some(directory.to_path_buf());
        *self.state.write() = records;

        debug!(
            directory = %directory.display(),
            records_loaded,
            corrupt_slots,
            "slot store connected"
        );
        Ok(ConnectReport {
            records_loaded,
            corrupt_slots,
        })
    }

    /// Inserts a new record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateId`] if the id already has a
    /// non-empty slot, or [`StoreError::SlotCollision`] if a different id
    /// occupies the slot this id hashes to.
    pub fn insert(&self, record: R) -> StoreResult<()> {
        let _guard = self.write_lock.lock();
        let id = record.id().to_string();
        if self.state.read().contains_key(&id) {
            return Err(StoreError::DuplicateId { id });
        }
        self.write_record(&record)?;
        self.state.write().insert(id, record.clone());
        self.feed.emit(RecordsChanged::new(vec![RecordChange::Upserted(
            record,
        )]));
        Ok(())
    }

    /// Overwrites an existing record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the id has no existing slot.
    pub fn update(&self, record: R) -> StoreResult<()> {
        let _guard = self.write_lock.lock();
        let id = record.id().to_string();
        if !self.state.read().contains_key(&id) {
            return Err(StoreError::NotFound { id });
        }
        self.write_record(&record)?;
        self.state.write().insert(id, record.clone());
        self.feed.emit(RecordsChanged::new(vec![RecordChange::Upserted(
            record,
        )]));
        Ok(())
    }

    /// Deletes a record, writing a tombstone into its slot.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the id has no existing slot.
    pub fn delete(&self, id: &str) -> StoreResult<()> {
        let _guard = self.write_lock.lock();
        if !self.state.read().contains_key(id) {
            return Err(StoreError::NotFound { id: id.to_string() });
        }
        let directory = self.directory_path()?;
        let (file, slot_index) = self.slot_for(&directory, id);
        file.write_tombstone(slot_index)?;
        self.state.write().remove(id);
        self.feed.emit(RecordsChanged::new(vec![RecordChange::Deleted {
            id: id.to_string(),
        }]));
        Ok(())
    }

    /// Looks up records by id against the in-memory state.
    ///
    /// Missing ids are silently skipped; the returned vector holds only
    /// the found subset.
    pub fn find_documents_by_id<S: AsRef<str>>(&self, ids: &[S]) -> Vec<R> {
        let state = self.state.read();
        ids.iter()
            .filter_map(|id| state.get(id.as_ref()).cloned())
            .collect()
    }

    /// Returns a snapshot of all in-memory records.
    ///
    /// Ordering is stable (by id) but not semantically significant.
    pub fn read_all(&self) -> Vec<R> {
        self.state.read().values().cloned().collect()
    }

    /// Returns the number of records currently in memory.
    pub fn len(&self) -> usize {
        self.state.read().len()
    }

    /// Returns true if no records are in memory.
    pub fn is_empty(&self) -> bool {
        self.state.read().is_empty()
    }

    /// Subscribes to this store's change events.
    pub fn subscribe(&self) -> Subscription<RecordsChanged<R>> {
        self.feed.subscribe()
    }

    /// Flags that an external process changed files under the store's
    /// directory (typically called after a remote pull).
    ///
    /// A subsequent `load_slot_files_from_working_copy(false)` will then
    /// actually scan.
    pub fn mark_externally_modified(&self) {
        self.externally_modified.store(true, Ordering::SeqCst);
    }

    /// Re-scans the directory and reconciles in-memory state with it.
    ///
    /// Diffs the scan result against the current state entry by entry and
    /// emits one consolidated change event listing every id whose content
    /// changed (added, removed, or body differs). With `force == false`
    /// the scan is skipped when no external change has been flagged via
    /// [`mark_externally_modified`](Self::mark_externally_modified).
    pub fn load_slot_files_from_working_copy(&self, force: bool) -> StoreResult<ReloadReport> {
        if !force && !self.externally_modified.load(Ordering::SeqCst) {
            return Ok(ReloadReport::skipped());
        }

        let directory = self.directory_path()?;
        let _guard = self.write_lock.lock();
        let (fresh, corrupt_slots) = self.scan(&directory)?;

        let mut entries = Vec::new();
        {
            let current = self.state.read();
            for (id, record) in &fresh {
                if current.get(id) != Some(record) {
                    entries.push(RecordChange::Upserted(record.clone()));
                }
            }
            for id in current.keys() {
                if !fresh.contains_key(id) {
                    entries.push(RecordChange::Deleted { id: id.clone() });
                }
            }
        }

        *self.state.write() = fresh;
        self.externally_modified.store(false, Ordering::SeqCst);

        let changed = entries.len();
        if !entries.is_empty() {
            self.feed.emit(RecordsChanged::new(entries));
        }
        debug!(changed, corrupt_slots, "working copy reloaded");
        Ok(ReloadReport {
            skipped: false,
            changed,
            corrupt_slots,
        })
    }

    /// Encodes and writes one record into its slot.
    ///
    /// Rejects the write if the slot is occupied by a different id: two
    /// ids hashing to the same address must not overwrite each other.
    fn write_record(&self, record: &R) -> StoreResult<()> {
        let directory = self.directory_path()?;
        let bytes = encode(record)?;
        let (file, slot_index) = self.slot_for(&directory, record.id());
        if let SlotState::Occupied(existing) = file.read_slot(slot_index)? {
            // A corrupt resident decodes to an error and is overwritable,
            // matching the scan-side failure model.
            if let Ok(resident) = decode::<R>(&existing) {
                if resident.id() != record.id() {
                    return Err(StoreError::SlotCollision {
                        id: record.id().to_string(),
                        occupied_by: resident.id().to_string(),
                    });
                }
            }
        }
        file.write_slot(slot_index, &bytes)?;
        Ok(())
    }

    /// Resolves the slot file and index for a record id.
    fn slot_for(&self, directory: &Path, id: &str) -> (SlotFile, u32) {
        let address = self.geometry.address_of(id);
        let path = directory.join(format!("{}.{}", address.file_id, self.extension));
        (SlotFile::new(path), address.slot_index)
    }

    fn directory_path(&self) -> StoreResult<PathBuf> {
        self.directory
            .read()
            .clone()
            .ok_or(StoreError::NotConnected)
    }

    /// Scans every slot file in the directory, decoding occupied slots.
    ///
    /// Decode failures are logged and counted; they never abort the scan.
    fn scan(&self, directory: &Path) -> StoreResult<(BTreeMap<String, R>, usize)> {
        let mut records = BTreeMap::new();
        let mut corrupt = 0usize;

        for entry in std::fs::read_dir(directory)? {
            let path = entry?.path();
            if !self.is_slot_file(&path) {
                continue;
            }
            let outcome = SlotFile::new(&path).read_all_occupied()?;

            for (line_number, reason) in &outcome.corrupt_lines {
                corrupt += 1;
                warn!(
                    file = %path.display(),
                    line_number,
                    reason = reason.as_str(),
                    "corrupt slot skipped"
                );
            }

            for (slot_index, bytes) in outcome.occupied {
                match decode::<R>(&bytes) {
                    Ok(record) => {
                        let id = record.id().to_string();
                        if records.insert(id.clone(), record).is_some() {
                            warn!(
                                file = %path.display(),
                                slot_index,
                                id = id.as_str(),
                                "id found in multiple slots, later slot shadows the earlier"
                            );
                        }
                    }
                    Err(CodecError::CorruptSlot { reason }) => {
                        corrupt += 1;
                        warn!(
                            file = %path.display(),
                            slot_index,
                            reason = reason.as_str(),
                            "corrupt slot skipped"
                        );
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }
        Ok((records, corrupt))
    }

    /// Returns true if `path` looks like one of this store's slot files.
    fn is_slot_file(&self, path: &Path) -> bool {
        if !path.is_file() {
            return false;
        }
        if path.extension().and_then(|e| e.to_str()) != Some(self.extension.as_str()) {
            return false;
        }
        match path.file_stem().and_then(|s| s.to_str()) {
            Some(stem) => {
                stem.len() == self.geometry.file_name_width()
                    && stem.chars().all(|c| c.is_ascii_hexdigit())
            }
            None => false,
        }
    }
}

impl<R: SlotRecord> std::fmt::Debug for SlotStore<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotStore")
            .field("directory", &*self.directory.read())
            .field("records", &self.state.read().len())
            .finish_non_exhaustive()
    }
}
