//! Append-only journal of applied edits.
//!
//! Each edit appends a small frame instead of rewriting the whole snapshot.
//! A checkpoint saves the full map and truncates the journal.
//!
//! Frame layout: `len: u32 LE | crc32: u32 LE | bincode(EditOp)`.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, debug_span, warn};

use crate::dict_map::{DictMap, SnapshotError};
use crate::edit::EditOp;
use crate::settings::settings;

const FRAME_HEADER: usize = 8;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayReport {
    /// Frames read and applied.
    pub frames: usize,
    /// Frames whose edit hit a malformed entry.
    pub malformed: usize,
}

pub struct EditJournal {
    /// Path to the snapshot file this journal extends.
    snapshot_path: PathBuf,
    journal_path: PathBuf,
    /// Kept open in append mode to avoid repeated open/close per entry.
    file: Option<File>,
    /// Frames written since the last checkpoint.
    entry_count: usize,
}

fn read_u32(data: &[u8], pos: usize) -> u32 {
    u32::from_le_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]])
}

impl EditJournal {
    /// Journal handle for `snapshot_path` (`dict.cdmp` → `dict.cdmp.journal`).
    pub fn new(snapshot_path: &Path) -> Self {
        let mut journal_path = snapshot_path.as_os_str().to_owned();
        journal_path.push(".journal");
        Self {
            snapshot_path: snapshot_path.to_path_buf(),
            journal_path: PathBuf::from(journal_path),
            file: None,
            entry_count: 0,
        }
    }

    /// Replay journal frames into `map`, stopping at the first truncated
    /// or corrupt frame.
    pub fn replay(&mut self, map: &mut DictMap) -> io::Result<ReplayReport> {
        let _span = debug_span!("journal_replay").entered();
        let data = match fs::read(&self.journal_path) {
            Ok(d) => d,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                self.entry_count = 0;
                return Ok(ReplayReport::default());
            }
            Err(e) => return Err(e),
        };

        let mut report = ReplayReport::default();
        let mut pos = 0;
        while pos + FRAME_HEADER <= data.len() {
            let length = read_u32(&data, pos) as usize;
            let expected_crc = read_u32(&data, pos + 4);

            if length == 0 || pos + FRAME_HEADER + length > data.len() {
                warn!(offset = pos, "truncated journal frame");
                break;
            }

            let payload = &data[pos + FRAME_HEADER..pos + FRAME_HEADER + length];
            if crc32fast::hash(payload) != expected_crc {
                warn!(offset = pos, "journal frame checksum mismatch");
                break;
            }

            let Ok(op) = bincode::deserialize::<EditOp>(payload) else {
                warn!(offset = pos, "undecodable journal frame");
                break;
            };
            if map.apply(&op).is_err() {
                report.malformed += 1;
            }
            report.frames += 1;
            pos += FRAME_HEADER + length;
        }

        self.entry_count = report.frames;
        debug!(frames = report.frames, malformed = report.malformed);
        Ok(report)
    }

    /// Append one edit.
    pub fn append(&mut self, op: &EditOp) -> io::Result<()> {
        let payload = bincode::serialize(op).map_err(io::Error::other)?;
        let length = u32::try_from(payload.len()).map_err(io::Error::other)?;
        let crc = crc32fast::hash(&payload);

        let mut frame = Vec::with_capacity(FRAME_HEADER + payload.len());
        frame.extend_from_slice(&length.to_le_bytes());
        frame.extend_from_slice(&crc.to_le_bytes());
        frame.extend_from_slice(&payload);
        self.open_file()?.write_all(&frame)?;

        self.entry_count += 1;
        Ok(())
    }

    /// Apply `op` to `map` and journal it if it changed anything.
    pub fn record(&mut self, map: &mut DictMap, op: &EditOp) -> Result<(), SnapshotError> {
        let outcome = map.apply(op)?;
        if outcome != crate::edit::EditOutcome::Unchanged {
            self.append(op)?;
        }
        Ok(())
    }

    fn open_file(&mut self) -> io::Result<&mut File> {
        let file = match self.file.take() {
            Some(f) => f,
            None => {
                if let Some(parent) = self.journal_path.parent() {
                    fs::create_dir_all(parent)?;
                }
                OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&self.journal_path)?
            }
        };
        Ok(self.file.insert(file))
    }

    /// Whether enough frames have accumulated to warrant a checkpoint.
    pub fn needs_compact(&self) -> bool {
        self.entry_count >= settings().journal.compact_threshold
    }

    /// Save `map` as the new snapshot, then empty the journal.
    pub fn checkpoint(&mut self, map: &DictMap) -> Result<(), SnapshotError> {
        map.save(&self.snapshot_path)?;
        self.truncate()?;
        Ok(())
    }

    /// Truncate the journal file and reset the frame count.
    pub fn truncate(&mut self) -> io::Result<()> {
        self.file = None;
        File::create(&self.journal_path)?;
        self.entry_count = 0;
        Ok(())
    }

    pub fn entry_count(&self) -> usize {
        self.entry_count
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    pub fn journal_path(&self) -> &Path {
        &self.journal_path
    }
}

/// Open snapshot + replay its journal in one call.
pub fn open_with_journal(snapshot_path: &Path) -> Result<(DictMap, EditJournal), SnapshotError> {
    let mut map = DictMap::open(snapshot_path)?;
    let mut journal = EditJournal::new(snapshot_path);
    journal.replay(&mut map)?;
    Ok((map, journal))
}
