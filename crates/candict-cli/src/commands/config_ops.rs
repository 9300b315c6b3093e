use std::fs;

use candict_core::settings;

use super::CliError;

pub fn settings_export() {
    print!("{}", settings::default_toml());
}

pub fn settings_validate(file: &str) -> Result<(), CliError> {
    let content = fs::read_to_string(file)?;
    let s = settings::parse_settings_toml(&content)?;
    println!(
        "OK: reorder.threshold={}, store.table={}, persist.line_buffer={}",
        s.reorder.threshold, s.store.table, s.persist.line_buffer
    );
    Ok(())
}

/// Install a custom settings file before any command touches `settings()`.
pub fn load_settings(file: &str) -> Result<(), CliError> {
    let content = fs::read_to_string(file)?;
    settings::init_custom(content)?;
    Ok(())
}
