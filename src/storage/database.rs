//! `SQLite` database connection.
//!
//! The database is stored at `~/.steward/steward.db` and contains tables for:
//! - One pending-record table per logical queue
//! - Reference list snapshots
//! - User data (session token, user object)

use std::path::Path;

use rusqlite::Connection;

use crate::config::Paths;
use crate::error::StewardError;

use super::migrations;

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrations fail.
    pub fn open(paths: &Paths) -> Result<Self, StewardError> {
        paths.ensure_dirs()?;
        Self::open_at(&paths.database)
    }

    /// Open the database at a specific path.
    ///
    /// Creates the database file and runs migrations if necessary.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrations fail.
    pub fn open_at(path: &Path) -> Result<Self, StewardError> {
        let conn = Connection::open(path).map_err(|e| {
            StewardError::storage(&format!("Failed to open database {}", path.display()), &e)
        })?;

        // Another steward process may hold the write lock briefly.
        conn.busy_timeout(std::time::Duration::from_secs(5))
            .map_err(|e| StewardError::storage("Failed to set busy timeout", &e))?;

        tracing::debug!(path = %path.display(), "opened database");
        Self::init(conn)
    }

    /// Open an in-memory database (useful for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrations fail.
    pub fn open_in_memory() -> Result<Self, StewardError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StewardError::storage("Failed to open in-memory database", &e))?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, StewardError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| StewardError::storage("Failed to enable foreign keys", &e))?;

        migrations::run(&conn)?;
        Ok(Self { conn })
    }

    /// Get the current schema version.
    ///
    /// # Errors
    ///
    /// Returns an error if the version cannot be read.
    pub fn schema_version(&self) -> Result<i32, StewardError> {
        migrations::get_version(&self.conn)
    }

    /// Get a reference to the underlying connection.
    #[must_use]
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }
}
