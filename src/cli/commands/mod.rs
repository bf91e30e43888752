//! Command implementations.
//!
//! Each command returns the text to print; `main` does the printing.

mod cache;
mod config;
mod queue;
mod session;
mod sync;

use std::io::Read;
use std::path::Path;

use serde_json::Value;

pub use cache::cache;
pub use config::config;
pub use queue::queue;
pub use session::session;
pub use sync::sync;

use crate::cli::args::OutputFormat;
use crate::config::{Config, Paths};
use crate::error::StewardError;
use crate::storage::Database;

/// Everything a command needs: resolved paths, config and an open database.
pub struct Context {
    /// Resolved data paths
    pub paths: Paths,
    /// Loaded configuration
    pub config: Config,
    /// Open database
    pub db: Database,
    /// Output format for this invocation
    pub format: OutputFormat,
}

impl Context {
    /// Open the database under `paths`.
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the database cannot be opened.
    pub fn open(paths: Paths, config: Config, format: OutputFormat) -> Result<Self, StewardError> {
        let db = Database::open(&paths)?;
        Ok(Self {
            paths,
            config,
            db,
            format,
        })
    }
}

/// Read a JSON argument: `-` for stdin, an existing file path, or inline JSON.
pub(crate) fn read_json_arg(arg: &str) -> Result<Value, StewardError> {
    let text = if arg == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else if Path::new(arg).is_file() {
        std::fs::read_to_string(arg)?
    } else {
        arg.to_string()
    };

    Ok(serde_json::from_str(&text)?)
}
