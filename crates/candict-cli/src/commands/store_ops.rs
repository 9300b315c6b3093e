//! Commands that act on the store's rows directly, without loading a map.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use candict_core::exchange;
use candict_core::store::WordStore;
use tracing::warn;

use super::{validate_code, validate_word, CliError};

/// Insert exchange-file rows the store does not have yet.
pub fn import(txt: &Path, db: &Path) -> Result<(), CliError> {
    let triples = exchange::read_triples(BufReader::new(File::open(txt)?))?;
    let total = triples.len();
    let valid: Vec<_> = triples
        .into_iter()
        .filter(|t| match validate_code(&t.code).and_then(|_| validate_word(&t.word)) {
            Ok(()) => true,
            Err(e) => {
                warn!("skipping row: {e}");
                false
            }
        })
        .collect();
    let invalid = total - valid.len();

    let mut store = WordStore::open_or_create(db)?;
    let report = store.import_new(&valid)?;
    println!(
        "Imported {} new rows ({} already present, {} invalid); store now holds {}",
        report.inserted,
        report.skipped,
        invalid,
        store.count()?
    );
    Ok(())
}

pub fn add(db: &Path, code: &str, word: &str) -> Result<(), CliError> {
    validate_code(code)?;
    validate_word(word)?;
    let store = WordStore::open_or_create(db)?;
    if store.insert_word(code, word)? {
        println!("Added: {code} → {word}");
    } else {
        println!("Already exists: {code} → {word}");
    }
    Ok(())
}

/// Delete words under every code; `fuzzy` matches any word containing them.
pub fn remove(db: &Path, words: &[String], fuzzy: bool) -> Result<(), CliError> {
    let mut store = WordStore::open(db)?;
    let removed = store.remove_words(words, fuzzy)?;
    let summary: Vec<String> = removed
        .iter()
        .map(|(word, n)| format!("{word}({n})"))
        .collect();
    println!("Removed: {}", summary.join(" "));
    Ok(())
}

pub fn bump(db: &Path, code: &str, word: &str, by: u64) -> Result<(), CliError> {
    validate_code(code)?;
    validate_word(word)?;
    let mut store = WordStore::open(db)?;
    let frequency = store.bump_frequency(code, word, by)?;
    println!("{code} {word} frequency={frequency}");
    Ok(())
}
