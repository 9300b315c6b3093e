//! Encoded entries keyed by full code.
//!
//! Values are stored in their encoded token form. The map is a `BTreeMap`,
//! so iteration (and therefore every persisted file) is sorted by code.

mod persistence;
#[cfg(test)]
mod tests;

use std::collections::BTreeMap;
use std::io;
use std::ops::Bound;

use crate::item::{self, CodecError, Entry};

pub use persistence::{MAGIC, VERSION};

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid header (too short)")]
    InvalidHeader,

    #[error("invalid magic bytes (expected CDMP)")]
    InvalidMagic,

    #[error("unsupported version: {0}")]
    UnsupportedVersion(u8),

    #[error("serialization error: {0}")]
    Serialize(bincode::Error),

    #[error("deserialization error: {0}")]
    Deserialize(bincode::Error),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DictMap {
    entries: BTreeMap<String, String>,
}

impl DictMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_encoded(&self, code: &str) -> Option<&str> {
        self.entries.get(code).map(String::as_str)
    }

    /// Decoded entry for `code`, or `None` if absent.
    pub fn get(&self, code: &str) -> Result<Option<Entry>, CodecError> {
        self.get_encoded(code).map(item::decode).transpose()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.entries.contains_key(code)
    }

    /// Encode and store `entry` under `code`, replacing any previous value.
    ///
    /// An empty code is ignored.
    pub fn put(&mut self, code: &str, entry: &Entry) {
        self.put_encoded(code, item::encode(entry));
    }

    pub fn put_encoded(&mut self, code: &str, token: String) {
        if code.is_empty() {
            return;
        }
        self.entries.insert(code.to_string(), token);
    }

    /// Remove `code`, returning its token.
    pub fn delete(&mut self, code: &str) -> Option<String> {
        self.entries.remove(code)
    }

    /// `(code, token)` pairs sorted by code.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Decoded entries sorted by code; decode failures are yielded in place.
    pub fn entries(&self) -> impl Iterator<Item = (&str, Result<Entry, CodecError>)> + '_ {
        self.iter().map(|(code, token)| (code, item::decode(token)))
    }

    /// Codes starting with `prefix`, sorted.
    pub fn with_prefix<'a>(&'a self, prefix: &'a str) -> Vec<&'a str> {
        self.entries
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .map(|(code, _)| code.as_str())
            .take_while(|code| code.starts_with(prefix))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
