//! Commands that load the store into a dictionary map and act on it.

use std::fs;
use std::path::Path;

use candict_core::edit::EditOp;
use candict_core::store::WordStore;
use candict_core::sync;
use candict_core::DictMap;
use tracing::info;

use super::{validate_code, validate_word, CliError};

fn load_map(store: &mut WordStore, count_overrides: Option<&Path>) -> Result<DictMap, CliError> {
    let (mut map, report) = sync::load(store)?;
    info!(
        entries = report.entries,
        rejected = report.rejected,
        duplicates = report.duplicates,
        "loaded store"
    );
    if let Some(path) = count_overrides {
        let merged = sync::merge_overrides_file(&mut map, path)?;
        info!(applied = merged.applied, malformed = merged.malformed, "merged counts");
    }
    Ok(map)
}

/// Write the store out as an exchange file (plus a counts file if asked).
pub fn export(
    db: &Path,
    output: &Path,
    counts: Option<&Path>,
    count_overrides: Option<&Path>,
) -> Result<(), CliError> {
    let mut store = WordStore::open(db)?;
    let map = load_map(&mut store, count_overrides)?;
    let report = sync::save_exchange(&map, output, counts)?;
    println!("Exported {} codes to {}", report.lines, output.display());
    if report.malformed > 0 {
        println!("Skipped {} malformed entries", report.malformed);
    }
    Ok(())
}

/// Export with every code reduced to its letters and colliding codes merged.
pub fn normalize(db: &Path, output: &Path) -> Result<(), CliError> {
    let mut store = WordStore::open(db)?;
    let map = load_map(&mut store, None)?;
    let (normalized, report) = sync::normalize(&map);
    let persisted = sync::save_exchange(&normalized, output, None)?;
    println!(
        "Normalized {} codes into {} ({} merged, {} dropped)",
        map.len(),
        persisted.lines,
        report.merged,
        report.dropped
    );
    Ok(())
}

/// Parse a JSON-lines edit file, validating codes and words.
pub fn read_edits(path: &Path) -> Result<Vec<EditOp>, CliError> {
    let content = fs::read_to_string(path)?;
    let mut ops = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let op: EditOp = serde_json::from_str(line).map_err(|source| CliError::EditLine {
            path: path.display().to_string(),
            line: idx + 1,
            source,
        })?;
        validate_code(&op.code)?;
        validate_word(&op.word)?;
        ops.push(op);
    }
    Ok(ops)
}

/// Apply an edit file to the store.
///
/// Added and removed rows and every count in the map are written in one
/// transaction, so a failing write leaves the store untouched. A store
/// without a frequency column gets the row changes only.
pub fn edit(db: &Path, edits: &Path, counts: Option<&Path>) -> Result<(), CliError> {
    let ops = read_edits(edits)?;
    let mut store = WordStore::open(db)?;
    let mut map = load_map(&mut store, counts)?;

    let report = map.apply_all(&ops);
    let applied: Vec<EditOp> = ops
        .iter()
        .filter(|op| !report.malformed.contains(&op.code))
        .cloned()
        .collect();
    let committed = sync::commit_edits(&map, &applied, &mut store)?;
    info!(
        inserted = committed.inserted,
        deleted = committed.deleted,
        updated = ?committed.updated,
        "store updated"
    );
    if let Some(counts) = counts {
        sync::save_counts(&map, counts)?;
    }

    println!(
        "Applied {} edits: {} created, {} updated, {} deleted, {} unchanged, {} failed",
        ops.len(),
        report.created,
        report.updated,
        report.deleted,
        report.unchanged,
        report.malformed.len()
    );
    Ok(())
}

/// Print the ranked candidates for `code`, or every code under a prefix.
pub fn lookup(db: &Path, code: &str, prefix: bool) -> Result<(), CliError> {
    let mut store = WordStore::open(db)?;
    let map = load_map(&mut store, None)?;
    let codes: Vec<&str> = if prefix {
        map.with_prefix(code)
    } else {
        vec![code]
    };

    let mut found = 0;
    for code in codes {
        let Some(entry) = map.get(code)? else {
            continue;
        };
        found += 1;
        for (rank, (word, count)) in entry.pairs().enumerate() {
            println!("{code}\t{}\t{word}\t{count}", rank + 1);
        }
    }
    if found == 0 {
        println!("Not found: {code}");
    }
    Ok(())
}
