//! Global settings loaded from TOML.
//!
//! - `init_custom(toml_content)` sets a custom TOML before first `settings()` call
//! - `settings()` returns `&'static Settings` (lazy-init singleton)
//! - Default values are embedded via `include_str!("default_settings.toml")`

use std::sync::OnceLock;

use serde::Deserialize;

pub const DEFAULT_SETTINGS_TOML: &str = include_str!("default_settings.toml");

static CUSTOM_TOML: OnceLock<String> = OnceLock::new();

/// Set custom TOML before first `settings()` call.
pub fn init_custom(toml_content: String) -> Result<(), SettingsError> {
    parse_settings_toml(&toml_content)?;
    CUSTOM_TOML
        .set(toml_content)
        .map_err(|_| SettingsError::AlreadyInitialized)
}

/// Get or initialize the global settings singleton.
pub fn settings() -> &'static Settings {
    static INSTANCE: OnceLock<Settings> = OnceLock::new();
    INSTANCE.get_or_init(|| {
        let toml_str = CUSTOM_TOML
            .get()
            .map(|s| s.as_str())
            .unwrap_or(DEFAULT_SETTINGS_TOML);
        // Custom TOML is validated in init_custom; the default is covered by tests.
        parse_settings_toml(toml_str)
            .or_else(|_| parse_settings_toml(DEFAULT_SETTINGS_TOML))
            .unwrap_or_default()
    })
}

/// Returns the embedded default settings TOML content.
pub fn default_toml() -> &'static str {
    DEFAULT_SETTINGS_TOML
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("TOML parse error: {0}")]
    Parse(String),
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
    #[error("settings already initialized")]
    AlreadyInitialized,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    pub reorder: ReorderSettings,
    pub store: StoreSettings,
    pub persist: PersistSettings,
    pub journal: JournalSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReorderSettings {
    pub threshold: u64,
}

impl Default for ReorderSettings {
    fn default() -> Self {
        Self { threshold: 1 }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreSettings {
    pub table: String,
    pub cache_size_kib: u32,
    pub frequency_cap: u64,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            table: "words".to_string(),
            cache_size_kib: 64000,
            frequency_cap: 1_000_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PersistSettings {
    pub line_buffer: usize,
}

impl Default for PersistSettings {
    fn default() -> Self {
        Self { line_buffer: 2000 }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JournalSettings {
    pub compact_threshold: usize,
}

impl Default for JournalSettings {
    fn default() -> Self {
        Self {
            compact_threshold: 1000,
        }
    }
}

pub fn parse_settings_toml(toml_str: &str) -> Result<Settings, SettingsError> {
    let s: Settings = toml::from_str(toml_str).map_err(|e| SettingsError::Parse(e.to_string()))?;
    validate(&s)?;
    Ok(s)
}

fn validate(s: &Settings) -> Result<(), SettingsError> {
    macro_rules! check_positive {
        ($section:ident . $field:ident) => {
            if s.$section.$field == 0 {
                return Err(SettingsError::InvalidValue {
                    field: concat!(stringify!($section), ".", stringify!($field)).to_string(),
                    reason: "must be positive".to_string(),
                });
            }
        };
    }

    check_positive!(store.cache_size_kib);
    check_positive!(store.frequency_cap);
    check_positive!(persist.line_buffer);
    check_positive!(journal.compact_threshold);

    let table = &s.store.table;
    if table.is_empty()
        || !table
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(SettingsError::InvalidValue {
            field: "store.table".to_string(),
            reason: "must be a non-empty identifier of [A-Za-z0-9_]".to_string(),
        });
    }

    Ok(())
}
