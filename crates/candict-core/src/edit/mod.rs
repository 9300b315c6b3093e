//! Incremental add/remove/promote edits applied to a [`DictMap`].
//!
//! Each operation decodes one entry, rewrites it and stores the re-encoded
//! token. If the stored token does not decode, the operation fails and the
//! map is left untouched for that code.

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span, warn};

use crate::dict_map::DictMap;
use crate::item::{CodecError, Entry};
use crate::reorder::reorder;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditAction {
    Add,
    Remove,
    /// Promote a word the user explicitly picked.
    Reorder,
}

/// One edit, e.g. `{"action":"add","code":"ceshi","word":"测试"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditOp {
    pub action: EditAction,
    pub code: String,
    pub word: String,
}

impl EditOp {
    pub fn add(code: impl Into<String>, word: impl Into<String>) -> Self {
        Self::new(EditAction::Add, code, word)
    }

    pub fn remove(code: impl Into<String>, word: impl Into<String>) -> Self {
        Self::new(EditAction::Remove, code, word)
    }

    pub fn reorder(code: impl Into<String>, word: impl Into<String>) -> Self {
        Self::new(EditAction::Reorder, code, word)
    }

    fn new(action: EditAction, code: impl Into<String>, word: impl Into<String>) -> Self {
        Self {
            action,
            code: code.into(),
            word: word.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// A new entry was created for a previously unseen code.
    Created,
    Updated,
    /// The last word was removed and the entry deleted.
    Deleted,
    /// Missing code or word; nothing changed.
    Unchanged,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub unchanged: usize,
    /// Codes whose stored token failed to decode.
    pub malformed: Vec<String>,
}

impl ApplyReport {
    fn record(&mut self, outcome: EditOutcome) {
        match outcome {
            EditOutcome::Created => self.created += 1,
            EditOutcome::Updated => self.updated += 1,
            EditOutcome::Deleted => self.deleted += 1,
            EditOutcome::Unchanged => self.unchanged += 1,
        }
    }
}

impl DictMap {
    /// Apply one edit.
    pub fn apply(&mut self, op: &EditOp) -> Result<EditOutcome, CodecError> {
        let outcome = match op.action {
            EditAction::Add => self.apply_add(&op.code, &op.word)?,
            EditAction::Remove => self.apply_remove(&op.code, &op.word)?,
            EditAction::Reorder => self.apply_reorder(&op.code, &op.word)?,
        };
        debug!(action = ?op.action, code = %op.code, ?outcome, "edit applied");
        Ok(outcome)
    }

    /// Apply edits in order. A malformed entry aborts only its own edit.
    pub fn apply_all<'a>(&mut self, ops: impl IntoIterator<Item = &'a EditOp>) -> ApplyReport {
        let _span = debug_span!("apply_all").entered();
        let mut report = ApplyReport::default();
        for op in ops {
            match self.apply(op) {
                Ok(outcome) => report.record(outcome),
                Err(e) => {
                    warn!(code = %op.code, "skipping edit: {e}");
                    report.malformed.push(op.code.clone());
                }
            }
        }
        debug!(
            created = report.created,
            updated = report.updated,
            deleted = report.deleted,
            unchanged = report.unchanged,
            malformed = report.malformed.len(),
        );
        report
    }

    fn apply_add(&mut self, code: &str, word: &str) -> Result<EditOutcome, CodecError> {
        let Some(mut entry) = self.get(code)? else {
            if code.is_empty() {
                return Ok(EditOutcome::Unchanged);
            }
            self.put(code, &Entry::single(code, word, 1));
            return Ok(EditOutcome::Created);
        };
        match entry.position(word) {
            Some(i) => entry.counts[i] = entry.counts[i].saturating_add(1),
            None => entry.push(word, 1),
        }
        self.put(code, &reorder(&entry));
        Ok(EditOutcome::Updated)
    }

    fn apply_remove(&mut self, code: &str, word: &str) -> Result<EditOutcome, CodecError> {
        let Some(mut entry) = self.get(code)? else {
            return Ok(EditOutcome::Unchanged);
        };
        let Some(i) = entry.position(word) else {
            return Ok(EditOutcome::Unchanged);
        };
        entry.remove_at(i);
        if entry.is_empty() {
            self.delete(code);
            return Ok(EditOutcome::Deleted);
        }
        self.put(code, &entry);
        Ok(EditOutcome::Updated)
    }

    /// Set the picked word's count to half of the other words' total, then reorder.
    fn apply_reorder(&mut self, code: &str, word: &str) -> Result<EditOutcome, CodecError> {
        let Some(mut entry) = self.get(code)? else {
            return Ok(EditOutcome::Unchanged);
        };
        let Some(i) = entry.position(word) else {
            return Ok(EditOutcome::Unchanged);
        };
        entry.counts[i] = 0;
        entry.counts[i] = entry.total() / 2;
        self.put(code, &reorder(&entry));
        Ok(EditOutcome::Updated)
    }
}
