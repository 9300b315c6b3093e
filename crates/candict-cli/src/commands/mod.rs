pub mod config_ops;
pub mod dict_ops;
pub mod snapshot_ops;
pub mod store_ops;


use std::io;

use candict_core::dict_map::SnapshotError;
use candict_core::settings::SettingsError;
use candict_core::CodecError;
use candict_core::store::StoreError;
use candict_core::sync::SyncError;

const MAX_CODE_LEN: usize = 20;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("invalid code {0:?}: expected 1-20 lowercase letters or digits")]
    InvalidCode(String),

    #[error("invalid word {0:?}")]
    InvalidWord(String),

    #[error("{path}:{line}: {source}")]
    EditLine {
        path: String,
        line: usize,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub fn validate_code(code: &str) -> Result<(), CliError> {
    let valid = (1..=MAX_CODE_LEN).contains(&code.len())
        && code
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit());
    if valid {
        Ok(())
    } else {
        Err(CliError::InvalidCode(code.to_string()))
    }
}

pub fn validate_word(word: &str) -> Result<(), CliError> {
    if word.trim().is_empty() || word.contains(['\n', '\r']) {
        return Err(CliError::InvalidWord(word.to_string()));
    }
    Ok(())
}
