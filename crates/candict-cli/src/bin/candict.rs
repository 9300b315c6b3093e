use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use candict_cli::commands::{config_ops, dict_ops, snapshot_ops, store_ops};
use candict_cli::trace_init::init_tracing;

macro_rules! die {
    ($result:expr, $($arg:tt)*) => {
        $result.unwrap_or_else(|e| {
            eprintln!($($arg)*, e);
            process::exit(1);
        })
    };
}

#[derive(Parser)]
#[command(name = "candict", about = "Candidate dictionary maintenance tool")]
struct Cli {
    /// Custom settings TOML (see `settings-export`)
    #[arg(long, global = true)]
    settings: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Export the store as `code word1 word2 ...` lines
    Export {
        /// SQLite database
        db: PathBuf,
        /// Output text file
        output: PathBuf,
        /// Also write `code count1 count2 ...` lines here
        #[arg(long)]
        counts: Option<PathBuf>,
        /// Count lines to apply on top of the store before exporting
        #[arg(long)]
        count_overrides: Option<PathBuf>,
    },
    /// Insert rows from a text file that the store does not have yet
    Import {
        /// Input text file
        input: PathBuf,
        /// SQLite database (created if missing)
        db: PathBuf,
    },
    /// Export with codes reduced to a-z and colliding codes merged
    Normalize {
        /// SQLite database
        db: PathBuf,
        /// Output text file
        output: PathBuf,
    },
    /// Apply a JSON-lines edit file and sync frequencies back
    Edit {
        /// SQLite database
        db: PathBuf,
        /// One `{"action":"add|remove|reorder","code":...,"word":...}` per line
        edits: PathBuf,
        /// Count file read before and rewritten after the edits
        #[arg(long)]
        counts: Option<PathBuf>,
    },
    /// Save the store as a binary snapshot and reset its journal
    Snapshot {
        /// SQLite database
        db: PathBuf,
        /// Snapshot file (its journal sits next to it as `<file>.journal`)
        snapshot: PathBuf,
    },
    /// Journal a JSON-lines edit file against a snapshot, without the store
    Record {
        /// Snapshot file written by `snapshot`
        snapshot: PathBuf,
        /// Same format as `edit`
        edits: PathBuf,
    },
    /// Add a word to the store
    Add {
        db: PathBuf,
        code: String,
        word: String,
    },
    /// Remove words from the store under every code
    Remove {
        db: PathBuf,
        #[arg(required = true)]
        words: Vec<String>,
        /// Remove every word containing the given text
        #[arg(short, long)]
        fuzzy: bool,
    },
    /// Increase a word's stored frequency
    Bump {
        db: PathBuf,
        code: String,
        word: String,
        #[arg(long, default_value = "1")]
        by: u64,
    },
    /// Show ranked candidates for a code
    Lookup {
        db: PathBuf,
        code: String,
        /// List every code starting with `code`
        #[arg(short, long)]
        prefix: bool,
    },
    /// Export default settings as TOML
    SettingsExport,
    /// Validate a custom settings TOML file
    SettingsValidate {
        /// Path to the TOML file
        file: String,
    },
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Some(file) = &cli.settings {
        die!(config_ops::load_settings(file), "Error loading settings: {}");
    }

    let result = match cli.command {
        Command::Export {
            db,
            output,
            counts,
            count_overrides,
        } => dict_ops::export(&db, &output, counts.as_deref(), count_overrides.as_deref()),
        Command::Import { input, db } => store_ops::import(&input, &db),
        Command::Normalize { db, output } => dict_ops::normalize(&db, &output),
        Command::Edit { db, edits, counts } => dict_ops::edit(&db, &edits, counts.as_deref()),
        Command::Snapshot { db, snapshot } => snapshot_ops::snapshot(&db, &snapshot),
        Command::Record { snapshot, edits } => snapshot_ops::record(&snapshot, &edits),
        Command::Add { db, code, word } => store_ops::add(&db, &code, &word),
        Command::Remove { db, words, fuzzy } => store_ops::remove(&db, &words, fuzzy),
        Command::Bump { db, code, word, by } => store_ops::bump(&db, &code, &word, by),
        Command::Lookup { db, code, prefix } => dict_ops::lookup(&db, &code, prefix),
        Command::SettingsExport => {
            config_ops::settings_export();
            Ok(())
        }
        Command::SettingsValidate { file } => config_ops::settings_validate(&file),
    };
    die!(result, "Error: {}");
}
