//! Offline editing against a binary snapshot plus its edit journal.
//!
//! `snapshot` captures the store into a snapshot file; `record` appends
//! edits to the snapshot's journal without touching the store, and folds
//! the journal into the snapshot once it grows past `journal.compact_threshold`.

use std::path::Path;

use candict_core::dict_map::SnapshotError;
use candict_core::journal::{open_with_journal, EditJournal};
use candict_core::store::WordStore;
use candict_core::sync;
use tracing::{info, warn};

use super::dict_ops::read_edits;
use super::CliError;

/// Load the store and write it out as a fresh snapshot with an empty journal.
pub fn snapshot(db: &Path, snapshot: &Path) -> Result<(), CliError> {
    let mut store = WordStore::open(db)?;
    let (map, report) = sync::load(&mut store)?;
    info!(entries = report.entries, rejected = report.rejected, "loaded store");

    let mut journal = EditJournal::new(snapshot);
    journal.checkpoint(&map)?;
    println!("Saved {} codes to {}", map.len(), snapshot.display());
    Ok(())
}

/// Apply an edit file to a snapshot, journaling each change.
pub fn record(snapshot: &Path, edits: &Path) -> Result<(), CliError> {
    let ops = read_edits(edits)?;
    let (mut map, mut journal) = open_with_journal(snapshot)?;
    let replayed = journal.entry_count();

    let mut failed = 0;
    for op in &ops {
        match journal.record(&mut map, op) {
            Ok(()) => {}
            Err(SnapshotError::Codec(e)) => {
                warn!(code = %op.code, "skipping edit: {e}");
                failed += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    let compacted = journal.needs_compact();
    if compacted {
        journal.checkpoint(&map)?;
    }
    info!(replayed, pending = journal.entry_count(), compacted, "journal updated");
    println!(
        "Recorded {} edits ({} failed); {} pending in {}",
        ops.len() - failed,
        failed,
        journal.entry_count(),
        journal.journal_path().display()
    );
    Ok(())
}
