//! SQLite-backed persistent word store.
//!
//! One table of `(key, word, frequency)` rows keyed by `(key, word)`; `key`
//! holds the input code. Bulk writes run inside a single transaction, so a
//! failing pass leaves the table as it was.


use std::io;
use std::path::Path;

use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use tracing::{debug, debug_span};

use crate::edit::{EditAction, EditOp};
use crate::item::Triple;
use crate::settings::settings;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(#[from] rusqlite::Error),

    #[error("table {table} has no {column} column")]
    SchemaMismatch { table: String, column: &'static str },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub inserted: usize,
    /// Rows whose `(key, word)` already existed.
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EditCommitReport {
    pub inserted: usize,
    pub deleted: usize,
    /// Frequency rows changed; `None` when the table has no frequency column.
    pub updated: Option<usize>,
}

pub struct WordStore {
    conn: Connection,
    table: String,
}

fn to_sql_frequency(frequency: u64) -> i64 {
    i64::try_from(frequency).unwrap_or(i64::MAX)
}

fn from_sql_frequency(frequency: Option<i64>) -> u64 {
    frequency.map_or(0, |f| u64::try_from(f).unwrap_or(0))
}

/// `LIKE` pattern matching any word containing `needle` literally.
fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

impl WordStore {
    /// Open an existing database. Errors if the file doesn't exist.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Self::with_connection(conn)
    }

    /// Open or create a database file with the words table in place.
    pub fn open_or_create(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let store = Self::with_connection(Connection::open(path)?)?;
        store.ensure_schema()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let store = Self::with_connection(Connection::open_in_memory()?)?;
        store.ensure_schema()?;
        Ok(store)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        let store = Self {
            conn,
            table: settings().store.table.clone(),
        };
        store.apply_pragmas()?;
        Ok(store)
    }

    fn apply_pragmas(&self) -> Result<(), StoreError> {
        self.conn.pragma_update(None, "synchronous", "NORMAL")?;
        let cache_size = -i64::from(settings().store.cache_size_kib);
        self.conn.pragma_update(None, "cache_size", cache_size)?;
        Ok(())
    }

    /// Create the words table and its indexes if absent.
    pub fn ensure_schema(&self) -> Result<(), StoreError> {
        let t = &self.table;
        self.conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS \"{t}\" (
                key TEXT NOT NULL,
                word TEXT NOT NULL,
                frequency INTEGER DEFAULT 0,
                PRIMARY KEY (key, word)
            );
            CREATE INDEX IF NOT EXISTS idx_key ON \"{t}\"(key);
            CREATE INDEX IF NOT EXISTS idx_word ON \"{t}\"(word);"
        ))?;
        Ok(())
    }

    /// Borrow the underlying connection (for callers that need raw SQL).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn columns(&self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(&format!("PRAGMA table_info(\"{}\")", self.table))?;
        let columns = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(columns)
    }

    pub fn has_frequency_column(&self) -> Result<bool, StoreError> {
        Ok(self.columns()?.iter().any(|c| c == "frequency"))
    }

    fn require_columns(&self, required: &[&'static str]) -> Result<Vec<String>, StoreError> {
        let columns = self.columns()?;
        for &column in required {
            if !columns.iter().any(|c| c == column) {
                return Err(StoreError::SchemaMismatch {
                    table: self.table.clone(),
                    column,
                });
            }
        }
        Ok(columns)
    }

    /// Every row ordered by `(key, word)`. Frequencies read as 0 when the
    /// table predates the frequency column.
    pub fn scan(&self) -> Result<Vec<Triple>, StoreError> {
        let _span = debug_span!("store_scan").entered();
        let columns = self.require_columns(&["key", "word"])?;
        let t = &self.table;
        let sql = if columns.iter().any(|c| c == "frequency") {
            format!("SELECT key, word, frequency FROM \"{t}\" ORDER BY key, word")
        } else {
            format!("SELECT key, word, NULL FROM \"{t}\" ORDER BY key, word")
        };
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Triple {
                    code: row.get(0)?,
                    word: row.get(1)?,
                    frequency: from_sql_frequency(row.get(2)?),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        debug!(rows = rows.len());
        Ok(rows)
    }

    pub fn count(&self) -> Result<usize, StoreError> {
        let n: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM \"{}\"", self.table),
            [],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(n).unwrap_or(0))
    }

    pub fn frequency(&self, code: &str, word: &str) -> Result<Option<u64>, StoreError> {
        self.require_columns(&["frequency"])?;
        let mut stmt = self.conn.prepare_cached(&format!(
            "SELECT frequency FROM \"{}\" WHERE key = ?1 AND word = ?2",
            self.table
        ))?;
        let frequency = stmt
            .query_row(params![code, word], |row| row.get::<_, Option<i64>>(0))
            .optional()?;
        Ok(frequency.map(from_sql_frequency))
    }

    /// Update the frequency of every existing `(code, word)` row in one
    /// transaction. Rows missing from the table are ignored.
    ///
    /// Fails with `SchemaMismatch` before writing anything if the table has
    /// no frequency column. Returns the number of rows updated.
    pub fn write_frequencies(&mut self, rows: &[Triple]) -> Result<usize, StoreError> {
        let _span = debug_span!("store_write_frequencies").entered();
        self.require_columns(&["key", "word", "frequency"])?;

        let tx = self.conn.transaction()?;
        let mut updated = 0;
        {
            let mut stmt = tx.prepare_cached(&format!(
                "UPDATE \"{}\" SET frequency = ?1 WHERE key = ?2 AND word = ?3",
                self.table
            ))?;
            for row in rows {
                updated += stmt.execute(params![
                    to_sql_frequency(row.frequency),
                    row.code,
                    row.word
                ])?;
            }
        }
        tx.commit()?;
        debug!(rows = rows.len(), updated);
        Ok(updated)
    }

    /// Insert `(code, word)` with frequency 0. Returns `false` if it already existed.
    pub fn insert_word(&self, code: &str, word: &str) -> Result<bool, StoreError> {
        let changed = self.conn.execute(
            &format!(
                "INSERT OR IGNORE INTO \"{}\" (key, word) VALUES (?1, ?2)",
                self.table
            ),
            params![code, word],
        )?;
        Ok(changed > 0)
    }

    /// Delete every row whose word equals each of `words` (or, with
    /// `fuzzy`, contains it). Returns deleted row counts per input word.
    pub fn remove_words(
        &mut self,
        words: &[String],
        fuzzy: bool,
    ) -> Result<Vec<(String, usize)>, StoreError> {
        let t = self.table.clone();
        let tx = self.conn.transaction()?;
        let mut removed = Vec::with_capacity(words.len());
        {
            let mut exact = tx.prepare_cached(&format!("DELETE FROM \"{t}\" WHERE word = ?1"))?;
            let mut like = tx.prepare_cached(&format!(
                "DELETE FROM \"{t}\" WHERE word LIKE ?1 ESCAPE '\\'"
            ))?;
            for word in words {
                let n = if fuzzy {
                    like.execute(params![contains_pattern(word)])?
                } else {
                    exact.execute(params![word])?
                };
                removed.push((word.clone(), n));
            }
        }
        tx.commit()?;
        Ok(removed)
    }

    /// Add `increment` to a word's frequency, inserting the row if absent.
    /// The result is capped at `store.frequency_cap`.
    pub fn bump_frequency(
        &mut self,
        code: &str,
        word: &str,
        increment: u64,
    ) -> Result<u64, StoreError> {
        self.require_columns(&["frequency"])?;
        let cap = settings().store.frequency_cap;
        let t = self.table.clone();

        let tx = self.conn.transaction()?;
        let current: Option<Option<i64>> = tx
            .query_row(
                &format!("SELECT frequency FROM \"{t}\" WHERE key = ?1 AND word = ?2"),
                params![code, word],
                |row| row.get(0),
            )
            .optional()?;
        let value = match current {
            Some(freq) => {
                let value = from_sql_frequency(freq).saturating_add(increment).min(cap);
                tx.execute(
                    &format!("UPDATE \"{t}\" SET frequency = ?1 WHERE key = ?2 AND word = ?3"),
                    params![to_sql_frequency(value), code, word],
                )?;
                value
            }
            None => {
                let value = increment.min(cap);
                tx.execute(
                    &format!("INSERT INTO \"{t}\" (key, word, frequency) VALUES (?1, ?2, ?3)"),
                    params![code, word, to_sql_frequency(value)],
                )?;
                value
            }
        };
        tx.commit()?;
        Ok(value)
    }

    /// Insert rows whose `(code, word)` is not yet present; existing rows
    /// are left untouched. One transaction for the whole batch.
    pub fn import_new(&mut self, triples: &[Triple]) -> Result<ImportReport, StoreError> {
        let _span = debug_span!("store_import").entered();
        let with_frequency = self.has_frequency_column()?;
        let t = self.table.clone();

        let tx = self.conn.transaction()?;
        let mut report = ImportReport::default();
        {
            let mut stmt = if with_frequency {
                tx.prepare_cached(&format!(
                    "INSERT OR IGNORE INTO \"{t}\" (key, word, frequency) VALUES (?1, ?2, ?3)"
                ))?
            } else {
                tx.prepare_cached(&format!(
                    "INSERT OR IGNORE INTO \"{t}\" (key, word) VALUES (?1, ?2)"
                ))?
            };
            for triple in triples {
                let changed = if with_frequency {
                    stmt.execute(params![
                        triple.code,
                        triple.word,
                        to_sql_frequency(triple.frequency)
                    ])?
                } else {
                    stmt.execute(params![triple.code, triple.word])?
                };
                if changed > 0 {
                    report.inserted += 1;
                } else {
                    report.skipped += 1;
                }
            }
        }
        tx.commit()?;
        debug!(inserted = report.inserted, skipped = report.skipped);
        Ok(report)
    }

    /// Replay the row-level effect of `ops` in order, then write `frequencies`,
    /// all inside one transaction.
    ///
    /// `add` inserts a missing `(code, word)` row, `remove` deletes it and
    /// `reorder` only changes counts. The column check runs before any write;
    /// without a frequency column the frequency batch is skipped. If any
    /// statement fails nothing is committed.
    pub fn commit_edits(
        &mut self,
        ops: &[EditOp],
        frequencies: &[Triple],
    ) -> Result<EditCommitReport, StoreError> {
        let _span = debug_span!("store_commit_edits").entered();
        let columns = self.require_columns(&["key", "word"])?;
        let with_frequency = columns.iter().any(|c| c == "frequency");
        let t = self.table.clone();

        let tx = self.conn.transaction()?;
        let mut report = EditCommitReport::default();
        {
            let mut insert =
                tx.prepare_cached(&format!("INSERT OR IGNORE INTO \"{t}\" (key, word) VALUES (?1, ?2)"))?;
            let mut delete =
                tx.prepare_cached(&format!("DELETE FROM \"{t}\" WHERE key = ?1 AND word = ?2"))?;
            for op in ops {
                match op.action {
                    EditAction::Add => report.inserted += insert.execute(params![op.code, op.word])?,
                    EditAction::Remove => report.deleted += delete.execute(params![op.code, op.word])?,
                    EditAction::Reorder => {}
                }
            }

            if with_frequency {
                let mut update = tx.prepare_cached(&format!(
                    "UPDATE \"{t}\" SET frequency = ?1 WHERE key = ?2 AND word = ?3"
                ))?;
                let mut updated = 0;
                for row in frequencies {
                    updated += update.execute(params![
                        to_sql_frequency(row.frequency),
                        row.code,
                        row.word
                    ])?;
                }
                report.updated = Some(updated);
            }
        }
        tx.commit()?;
        debug!(
            inserted = report.inserted,
            deleted = report.deleted,
            updated = ?report.updated,
        );
        Ok(report)
    }
}
