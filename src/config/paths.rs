//! Path resolution for steward configuration and data files.
//!
//! All steward data is stored in `~/.steward/` unless `STEWARD_HOME` or
//! `--home` points elsewhere:
//! - `config.yaml` - Main configuration file
//! - `steward.db` - SQLite database for queues, cache and session

use std::path::PathBuf;

use crate::error::StewardError;

/// Environment variable overriding the data directory.
pub const HOME_ENV: &str = "STEWARD_HOME";

/// Paths to steward configuration and data files.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Root directory: `~/.steward/`
    pub root: PathBuf,
    /// Config file: `~/.steward/config.yaml`
    pub config_file: PathBuf,
    /// Database file: `~/.steward/steward.db`
    pub database: PathBuf,
}

impl Paths {
    /// Create paths based on the user's home directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self, StewardError> {
        if let Ok(root) = std::env::var(HOME_ENV) {
            return Ok(Self::with_root(PathBuf::from(root)));
        }

        let home = std::env::var("HOME").map_err(|_| {
            StewardError::Config("Could not determine home directory".to_string())
        })?;

        Ok(Self::with_root(PathBuf::from(home).join(".steward")))
    }

    /// Resolve paths, preferring an explicit root over the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if no root is given and the home directory cannot be
    /// determined.
    pub fn resolve(root: Option<PathBuf>) -> Result<Self, StewardError> {
        root.map_or_else(Self::new, |root| Ok(Self::with_root(root)))
    }

    /// Create paths with a custom root directory.
    #[must_use]
    pub fn with_root(root: PathBuf) -> Self {
        Self {
            config_file: root.join("config.yaml"),
            database: root.join("steward.db"),
            root,
        }
    }

    /// Ensure the data directory exists.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation fails.
    pub fn ensure_dirs(&self) -> Result<(), StewardError> {
        if !self.root.exists() {
            std::fs::create_dir_all(&self.root).map_err(|e| {
                StewardError::Config(format!(
                    "Failed to create directory {}: {e}",
                    self.root.display()
                ))
            })?;
        }

        Ok(())
    }
}
