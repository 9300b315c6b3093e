//! Reconciles a [`DictMap`] with the persistent store and with exchange files.
//!
//! Rows enter through a [`TripleSource`] and frequency updates leave through
//! a [`FrequencySink`]; [`WordStore`] implements both. Per-entry decode
//! failures are counted in each pass's report and never abort the pass.


use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use tracing::{debug, debug_span, warn};

use crate::dict_map::DictMap;
use crate::edit::EditOp;
use crate::exchange::{format_counts_line, format_words_line, parse_counts_line};
use crate::item::{Entry, Triple};
use crate::reorder::reorder;
use crate::settings::settings;
use crate::store::{EditCommitReport, StoreError, WordStore};

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Supplies `(code, word, frequency)` rows, in any order.
pub trait TripleSource {
    fn triples(&mut self) -> Result<Vec<Triple>, StoreError>;
}

/// Accepts positional `(code, word) -> frequency` updates as one unit.
pub trait FrequencySink {
    /// All-or-nothing write; returns the number of rows changed.
    fn write_frequencies(&mut self, rows: &[Triple]) -> Result<usize, StoreError>;
}

impl TripleSource for WordStore {
    fn triples(&mut self) -> Result<Vec<Triple>, StoreError> {
        self.scan()
    }
}

impl FrequencySink for WordStore {
    fn write_frequencies(&mut self, rows: &[Triple]) -> Result<usize, StoreError> {
        WordStore::write_frequencies(self, rows)
    }
}

impl TripleSource for Vec<Triple> {
    fn triples(&mut self) -> Result<Vec<Triple>, StoreError> {
        Ok(self.clone())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub rows: usize,
    pub entries: usize,
    /// Rows whose code is not purely alphabetic with a lowercase first letter.
    pub rejected: usize,
    /// Repeated `(code, word)` rows; the first occurrence wins.
    pub duplicates: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub applied: usize,
    pub unknown_codes: usize,
    pub malformed: usize,
    /// Non-comment lines that are not `code count...`.
    pub invalid_lines: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    /// Source codes folded into an already-present normalized code.
    pub merged: usize,
    /// Source codes with no letters left after normalization.
    pub dropped: usize,
    pub malformed: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistReport {
    pub lines: usize,
    pub malformed: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrequencySyncReport {
    pub rows: usize,
    pub updated: usize,
    pub malformed: usize,
}

fn is_loadable_code(code: &str) -> bool {
    code.chars().next().is_some_and(char::is_lowercase) && code.chars().all(char::is_alphabetic)
}

/// Build a map from every row of `source`.
///
/// Within a code, words are ranked by frequency descending (ties keep
/// source order) and then passed once through the reorder engine.
pub fn load(source: &mut impl TripleSource) -> Result<(DictMap, LoadReport), SyncError> {
    let _span = debug_span!("load").entered();
    let rows = source.triples()?;
    let mut report = LoadReport {
        rows: rows.len(),
        ..Default::default()
    };

    let mut grouped: BTreeMap<String, Vec<(String, u64)>> = BTreeMap::new();
    for row in rows {
        if !is_loadable_code(&row.code) {
            report.rejected += 1;
            continue;
        }
        let words = grouped.entry(row.code).or_default();
        if words.iter().any(|(w, _)| *w == row.word) {
            report.duplicates += 1;
            continue;
        }
        words.push((row.word, row.frequency));
    }

    let mut map = DictMap::new();
    for (code, mut words) in grouped {
        words.sort_by(|a, b| b.1.cmp(&a.1));
        let (words, counts) = words.into_iter().unzip();
        let entry = Entry {
            code,
            words,
            counts,
        };
        map.put(&entry.code, &reorder(&entry));
        report.entries += 1;
    }

    debug!(
        rows = report.rows,
        entries = report.entries,
        rejected = report.rejected,
        duplicates = report.duplicates,
    );
    Ok((map, report))
}

/// Apply `code count1 count2 ...` lines positionally onto existing entries.
///
/// Only the provided positions are overridden; the entry is then reordered.
/// Lines for unknown codes are ignored.
pub fn merge_overrides(map: &mut DictMap, reader: impl BufRead) -> Result<MergeReport, SyncError> {
    let _span = debug_span!("merge_overrides").entered();
    let mut report = MergeReport::default();
    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let Some((code, counts)) = parse_counts_line(trimmed) else {
            report.invalid_lines += 1;
            continue;
        };
        let mut entry = match map.get(&code) {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                report.unknown_codes += 1;
                continue;
            }
            Err(e) => {
                warn!(%code, "skipping count override: {e}");
                report.malformed += 1;
                continue;
            }
        };
        for (slot, count) in entry.counts.iter_mut().zip(counts) {
            *slot = count;
        }
        map.put(&code, &reorder(&entry));
        report.applied += 1;
    }
    debug!(
        applied = report.applied,
        unknown_codes = report.unknown_codes,
        malformed = report.malformed,
        invalid_lines = report.invalid_lines,
    );
    Ok(report)
}

/// [`merge_overrides`] from a file; a missing file is not an error.
pub fn merge_overrides_file(map: &mut DictMap, path: &Path) -> Result<MergeReport, SyncError> {
    match File::open(path) {
        Ok(file) => merge_overrides(map, BufReader::new(file)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(MergeReport::default()),
        Err(e) => Err(e.into()),
    }
}

/// Rebuild the map with every code reduced to its `a-z` letters.
///
/// Codes that collide are unioned: words already present keep their place,
/// newly introduced words are appended with count 0. Each resulting entry
/// is reordered once.
pub fn normalize(map: &DictMap) -> (DictMap, NormalizeReport) {
    let _span = debug_span!("normalize").entered();
    let mut report = NormalizeReport::default();
    let mut merged: BTreeMap<String, Entry> = BTreeMap::new();

    for (code, decoded) in map.entries() {
        let entry = match decoded {
            Ok(entry) => entry,
            Err(e) => {
                warn!(%code, "skipping entry during normalize: {e}");
                report.malformed += 1;
                continue;
            }
        };
        let normalized: String = code.chars().filter(char::is_ascii_lowercase).collect();
        if normalized.is_empty() {
            report.dropped += 1;
            continue;
        }
        match merged.get_mut(&normalized) {
            Some(existing) => {
                for word in entry.words {
                    if !existing.contains(&word) {
                        existing.push(word, 0);
                    }
                }
                report.merged += 1;
            }
            None => {
                merged.insert(
                    normalized.clone(),
                    Entry {
                        code: normalized,
                        words: entry.words,
                        counts: entry.counts,
                    },
                );
            }
        }
    }

    let mut out = DictMap::new();
    for (code, entry) in merged {
        out.put(&code, &reorder(&entry));
    }
    debug!(
        entries = out.len(),
        merged = report.merged,
        dropped = report.dropped,
        malformed = report.malformed,
    );
    (out, report)
}

fn write_lines(
    map: &DictMap,
    mut writer: impl Write,
    format: impl Fn(&Entry) -> Option<String>,
) -> Result<PersistReport, SyncError> {
    let line_buffer = settings().persist.line_buffer;
    let mut report = PersistReport::default();
    let mut pending: Vec<String> = Vec::with_capacity(line_buffer);

    for (code, decoded) in map.entries() {
        let entry = match decoded {
            Ok(entry) => entry,
            Err(e) => {
                warn!(%code, "skipping entry during persist: {e}");
                report.malformed += 1;
                continue;
            }
        };
        if let Some(line) = format(&entry) {
            pending.push(line);
            report.lines += 1;
        }
        if pending.len() >= line_buffer {
            flush_lines(&mut writer, &mut pending)?;
        }
    }
    flush_lines(&mut writer, &mut pending)?;
    writer.flush()?;
    Ok(report)
}

fn flush_lines(writer: &mut impl Write, pending: &mut Vec<String>) -> io::Result<()> {
    for line in pending.drain(..) {
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
    }
    Ok(())
}

/// Write `code word1 word2 ...` lines sorted by code; frequencies are dropped.
pub fn write_words(map: &DictMap, writer: impl Write) -> Result<PersistReport, SyncError> {
    let _span = debug_span!("persist_words").entered();
    write_lines(map, writer, |entry| Some(format_words_line(entry)))
}

/// Write `code count1 count2 ...` lines sorted by code, trailing zeros
/// omitted and all-zero entries skipped.
pub fn write_counts(map: &DictMap, writer: impl Write) -> Result<PersistReport, SyncError> {
    let _span = debug_span!("persist_counts").entered();
    write_lines(map, writer, format_counts_line)
}

fn write_atomic(
    path: &Path,
    write: impl FnOnce(&mut BufWriter<File>) -> Result<PersistReport, SyncError>,
) -> Result<PersistReport, SyncError> {
    let tmp = path.with_extension("tmp");
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(&tmp)?);
    let report = write(&mut writer)?;
    writer.into_inner().map_err(io::IntoInnerError::into_error)?;
    fs::rename(&tmp, path)?;
    Ok(report)
}

/// Atomically write the words file and, if given, the counts file.
pub fn save_exchange(
    map: &DictMap,
    words_path: &Path,
    counts_path: Option<&Path>,
) -> Result<PersistReport, SyncError> {
    let report = write_atomic(words_path, |w| write_words(map, w))?;
    if let Some(counts_path) = counts_path {
        save_counts(map, counts_path)?;
    }
    debug!(lines = report.lines, malformed = report.malformed, "exchange saved");
    Ok(report)
}

/// Atomically write only the counts file.
pub fn save_counts(map: &DictMap, counts_path: &Path) -> Result<PersistReport, SyncError> {
    write_atomic(counts_path, |w| write_counts(map, w))
}

/// Every `(code, word, count)` in the map, plus the number of entries that
/// failed to decode and were left out.
pub fn frequency_rows(map: &DictMap) -> (Vec<Triple>, usize) {
    let mut rows = Vec::new();
    let mut malformed = 0;
    for (code, decoded) in map.entries() {
        let entry = match decoded {
            Ok(entry) => entry,
            Err(e) => {
                warn!(%code, "skipping entry during frequency sync: {e}");
                malformed += 1;
                continue;
            }
        };
        for (word, count) in entry.pairs() {
            rows.push(Triple::new(code, word, count));
        }
    }
    (rows, malformed)
}

/// Push every in-memory count to `sink` as one all-or-nothing batch.
pub fn sync_frequencies(
    map: &DictMap,
    sink: &mut impl FrequencySink,
) -> Result<FrequencySyncReport, SyncError> {
    let _span = debug_span!("sync_frequencies").entered();
    let (rows, malformed) = frequency_rows(map);
    let report = FrequencySyncReport {
        rows: rows.len(),
        updated: sink.write_frequencies(&rows)?,
        malformed,
    };
    debug!(rows = report.rows, updated = report.updated, malformed = report.malformed);
    Ok(report)
}

/// Write the row changes of `ops` and every count in `map` to `store` in a
/// single transaction. `map` must already have `ops` applied.
pub fn commit_edits(
    map: &DictMap,
    ops: &[EditOp],
    store: &mut WordStore,
) -> Result<EditCommitReport, SyncError> {
    let _span = debug_span!("commit_edits").entered();
    let (rows, _) = frequency_rows(map);
    let report = store.commit_edits(ops, &rows)?;
    if report.updated.is_none() {
        warn!("store has no frequency column; counts were not written");
    }
    Ok(report)
}
