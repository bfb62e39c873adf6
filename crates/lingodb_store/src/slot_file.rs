//! One on-disk slot file.
//!
//! A slot file is a sparse, line-oriented container of up to
//! `slots_per_file` slots. Each occupied slot is one line:
//!
//! ```text
//! <8-hex-digit slot index> TAB <payload>
//! ```
//!
//! where the payload is either the compact JSON body of a record or the
//! tombstone marker `-`. Lines are sorted by slot index and empty slots
//! have no line, so a full scan is O(occupied slots) and a one-slot edit
//! shows up as a one-line diff under version control.
//!
//! An absent file means all of its slots are empty.

use crate::error::{StoreError, StoreResult};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Tombstone payload marking a deleted record's slot.
const TOMBSTONE: &str = "-";

/// Width of the slot index field in hex digits.
const INDEX_DIGITS: usize = 8;

/// The state of one slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotState {
    /// No line exists for this slot.
    Empty,
    /// The slot holds a tombstone.
    Tombstone,
    /// The slot holds a record body.
    Occupied(Vec<u8>),
}

/// The result of scanning a slot file.
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    /// Occupied slots in index order: (slot index, payload bytes).
    pub occupied: Vec<(u32, Vec<u8>)>,
    /// Number of tombstoned slots.
    pub tombstones: usize,
    /// Lines that did not parse, with their 1-based line number and reason.
    pub corrupt_lines: Vec<(usize, String)>,
}

/// A handle to one slot file on disk.
///
/// The handle is stateless: every operation re-reads the file, and writes
/// rewrite it atomically via a temp file + rename. Slot files are small
/// (occupied slots only), so this stays cheap.
#[derive(Debug, Clone)]
pub struct SlotFile {
    path: PathBuf,
}

impl SlotFile {
    /// Creates a handle for the slot file at `path`. The file need not
    /// exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the path of the slot file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the state of a single slot.
    pub fn read_slot(&self, index: u32) -> StoreResult<SlotState> {
        let slots = self.load()?;
        Ok(match slots.get(&index) {
            None => SlotState::Empty,
            Some(payload) if payload == TOMBSTONE => SlotState::Tombstone,
            Some(payload) => SlotState::Occupied(payload.clone().into_bytes()),
        })
    }

    /// Writes a record body into a slot, replacing whatever was there.
    ///
    /// The payload must fit the one-line framing: UTF-8, free of line
    /// breaks and tabs, and not the tombstone marker itself. Compact JSON
    /// bodies always qualify (control characters are escaped);
    /// [`StoreError::UnframablePayload`] rejects anything else.
    pub fn write_slot(&self, index: u32, bytes: &[u8]) -> StoreResult<()> {
        let payload = std::str::from_utf8(bytes).map_err(|_| StoreError::UnframablePayload {
            reason: "payload is not valid UTF-8".into(),
        })?;
        if payload.contains(['\n', '\r', '\t']) {
            return Err(StoreError::UnframablePayload {
                reason: "payload contains line-framing characters".into(),
            });
        }
        if payload == TOMBSTONE {
            return Err(StoreError::UnframablePayload {
                reason: "payload equals the tombstone marker".into(),
            });
        }
        let payload = payload.to_owned();
        self.modify(|slots| {
            slots.insert(index, payload);
        })
    }

    /// Writes the tombstone marker into a slot.
    pub fn write_tombstone(&self, index: u32) -> StoreResult<()> {
        self.modify(|slots| {
            slots.insert(index, TOMBSTONE.into());
        })
    }

    /// Scans the whole file, returning every occupied slot.
    ///
    /// Corrupt lines are collected, not fatal: the rest of the file is
    /// still scanned.
    pub fn read_all_occupied(&self) -> StoreResult<ScanOutcome> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(ScanOutcome::default()),
            Err(e) => return Err(e.into()),
        };

        let mut outcome = ScanOutcome::default();
        for (line_number, line) in content.lines().enumerate() {
            if line.is_empty() {
                continue;
            }
            match parse_line(line) {
                Ok((_, payload)) if payload == TOMBSTONE => outcome.tombstones += 1,
                Ok((index, payload)) => {
                    outcome.occupied.push((index, payload.as_bytes().to_vec()));
                }
                Err(reason) => outcome.corrupt_lines.push((line_number + 1, reason)),
            }
        }
        Ok(outcome)
    }

    /// Loads the slot map, silently skipping corrupt lines.
    fn load(&self) -> StoreResult<BTreeMap<u32, String>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };

        let mut slots = BTreeMap::new();
        for line in content.lines() {
            if line.is_empty() {
                continue;
            }
            if let Ok((index, payload)) = parse_line(line) {
                slots.insert(index, payload.to_string());
            }
        }
        Ok(slots)
    }

    /// Read-modify-write of the slot map, written atomically.
    fn modify(&self, f: impl FnOnce(&mut BTreeMap<u32, String>)) -> StoreResult<()> {
        let mut slots = self.load()?;
        f(&mut slots);

        let mut content = String::new();
        for (index, payload) in &slots {
            // Index field width must stay in sync with INDEX_DIGITS.
            let _ = writeln!(content, "{index:08x}\t{payload}");
        }

        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, content.as_bytes())?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

/// Parses one slot line into (index, payload).
fn parse_line(line: &str) -> Result<(u32, &str), String> {
    let (index_field, payload) = line
        .split_once('\t')
        .ok_or_else(|| "missing field separator".to_string())?;
    if index_field.len() != INDEX_DIGITS {
        return Err(format!(
            "slot index field has width {}, expected {INDEX_DIGITS}",
            index_field.len()
        ));
    }
    let index = u32::from_str_radix(index_field, 16)
        .map_err(|e| format!("invalid slot index {index_field:?}: {e}"))?;
    Ok((index, payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn absent_file_is_all_empty() {
        let dir = tempdir().unwrap();
        let file = SlotFile::new(dir.path().join("abc.slot"));

        assert_eq!(file.read_slot(0).unwrap(), SlotState::Empty);
        assert!(file.read_all_occupied().unwrap().occupied.is_empty());
    }

    #[test]
    fn write_and_read_slot() {
        let dir = tempdir().unwrap();
        let file = SlotFile::new(dir.path().join("abc.slot"));

        file.write_slot(5, br#"{"id":"r1"}"#).unwrap();

        assert_eq!(
            file.read_slot(5).unwrap(),
            SlotState::Occupied(br#"{"id":"r1"}"#.to_vec())
        );
        assert_eq!(file.read_slot(6).unwrap(), SlotState::Empty);
    }

    #[test]
    fn tombstone_state() {
        let dir = tempdir().unwrap();
        let file = SlotFile::new(dir.path().join("abc.slot"));

        file.write_slot(1, b"{}").unwrap();
        file.write_tombstone(1).unwrap();

        assert_eq!(file.read_slot(1).unwrap(), SlotState::Tombstone);
        let outcome = file.read_all_occupied().unwrap();
        assert!(outcome.occupied.is_empty());
        assert_eq!(outcome.tombstones, 1);
    }

    #[test]
    fn lines_stay_sorted_by_index() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("abc.slot");
        let file = SlotFile::new(&path);

        file.write_slot(9, b"nine").unwrap();
        file.write_slot(2, b"two").unwrap();
        file.write_slot(4, b"four").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let indices: Vec<&str> = content
            .lines()
            .map(|l| l.split_once('\t').unwrap().0)
            .collect();
        assert_eq!(indices, vec!["00000002", "00000004", "00000009"]);
    }

    #[test]
    fn rewriting_one_slot_changes_one_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("abc.slot");
        let file = SlotFile::new(&path);

        file.write_slot(1, b"one").unwrap();
        file.write_slot(2, b"two").unwrap();
        let before = std::fs::read_to_string(&path).unwrap();

        file.write_slot(2, b"zwei").unwrap();
        let after = std::fs::read_to_string(&path).unwrap();

        let changed: Vec<_> = before
            .lines()
            .zip(after.lines())
            .filter(|(a, b)| a != b)
            .collect();
        assert_eq!(changed.len(), 1);
    }

    #[test]
    fn unframable_payloads_are_rejected() {
        let dir = tempdir().unwrap();
        let file = SlotFile::new(dir.path().join("abc.slot"));

        for payload in [
            b"line\nbreak".as_slice(),
            b"tab\there",
            b"return\rcarriage",
            b"-",
            &[0xff, 0xfe],
        ] {
            assert!(matches!(
                file.write_slot(0, payload),
                Err(StoreError::UnframablePayload { .. })
            ));
        }
        // None of the rejected writes touched the slot.
        assert_eq!(file.read_slot(0).unwrap(), SlotState::Empty);
    }

    #[test]
    fn corrupt_line_does_not_abort_scan() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("abc.slot");

        std::fs::write(
            &path,
            "00000001\tfirst\ngarbage line without tab\n00000003\tthird\n",
        )
        .unwrap();

        let outcome = SlotFile::new(&path).read_all_occupied().unwrap();
        assert_eq!(outcome.occupied.len(), 2);
        assert_eq!(outcome.corrupt_lines.len(), 1);
        assert_eq!(outcome.corrupt_lines[0].0, 2);
    }

    #[test]
    fn short_index_field_is_corrupt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("abc.slot");

        std::fs::write(&path, "01\tshort index\n").unwrap();

        let outcome = SlotFile::new(&path).read_all_occupied().unwrap();
        assert!(outcome.occupied.is_empty());
        assert_eq!(outcome.corrupt_lines.len(), 1);
    }

    #[test]
    fn occupied_slots_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("abc.slot");

        SlotFile::new(&path).write_slot(7, b"persisted").unwrap();

        let outcome = SlotFile::new(&path).read_all_occupied().unwrap();
        assert_eq!(outcome.occupied, vec![(7, b"persisted".to_vec())]);
    }
}
