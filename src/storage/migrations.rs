//! Database migrations for steward.
//!
//! Each migration is a function that upgrades the schema by one version.
//! Migrations are run automatically when the database is opened.

use rusqlite::Connection;

use crate::error::StewardError;

/// Current schema version.
const CURRENT_VERSION: i32 = 2;

/// Get the current schema version from the database.
///
/// Returns 0 if no version has been set (new database).
pub fn get_version(conn: &Connection) -> Result<i32, StewardError> {
    conn.query_row("PRAGMA user_version", [], |row| row.get(0))
        .map_err(|e| StewardError::storage("Failed to get schema version", &e))
}

/// Set the schema version in the database.
fn set_version(conn: &Connection, version: i32) -> Result<(), StewardError> {
    conn.execute_batch(&format!("PRAGMA user_version = {version};"))
        .map_err(|e| StewardError::storage("Failed to set schema version", &e))
}

/// Run all pending migrations.
pub fn run(conn: &Connection) -> Result<(), StewardError> {
    let current = get_version(conn)?;

    if current >= CURRENT_VERSION {
        return Ok(());
    }

    for version in (current + 1)..=CURRENT_VERSION {
        tracing::debug!(version, "applying schema migration");
        run_migration(conn, version)?;
        set_version(conn, version)?;
    }

    Ok(())
}

fn run_migration(conn: &Connection, version: i32) -> Result<(), StewardError> {
    match version {
        1 => migrate_v1(conn),
        2 => migrate_v2(conn),
        _ => Err(StewardError::StorageUnavailable(format!(
            "Unknown migration version: {version}"
        ))),
    }
}

/// Pending-record table for one logical queue.
///
/// `AUTOINCREMENT` keeps ids from being reused after `clear_synced`.
fn queue_table_sql(table: &str) -> String {
    format!(
        r"
        CREATE TABLE IF NOT EXISTS {table} (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            payload TEXT NOT NULL,
            entry_date TEXT,
            state TEXT NOT NULL DEFAULT 'pending',
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_{table}_state ON {table}(state);
        CREATE INDEX IF NOT EXISTS idx_{table}_date ON {table}(entry_date);
        "
    )
}

/// Migration v1: queues, reference cache and user data.
fn migrate_v1(conn: &Connection) -> Result<(), StewardError> {
    let mut sql = String::new();
    for table in ["pending_inventory", "pending_sales", "pending_receipts"] {
        sql.push_str(&queue_table_sql(table));
    }
    sql.push_str(
        r"
        -- Full-replacement reference snapshots (flavor catalog, ...)
        CREATE TABLE IF NOT EXISTS reference_cache (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            list TEXT NOT NULL,
            item_id TEXT NOT NULL,
            data TEXT NOT NULL,
            UNIQUE (list, item_id)
        );

        -- Session token and cached user object
        CREATE TABLE IF NOT EXISTS user_data (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );
        ",
    );

    conn.execute_batch(&sql)
        .map_err(|e| StewardError::storage("Migration v1 failed", &e))
}

/// Migration v2: delivery bookkeeping for the sync runner.
fn migrate_v2(conn: &Connection) -> Result<(), StewardError> {
    let mut sql = String::new();
    for table in ["pending_inventory", "pending_sales", "pending_receipts"] {
        sql.push_str(&format!(
            r"
            ALTER TABLE {table} ADD COLUMN attempts INTEGER NOT NULL DEFAULT 0;
            ALTER TABLE {table} ADD COLUMN last_attempt TEXT;
            ALTER TABLE {table} ADD COLUMN last_error TEXT;
            "
        ));
    }

    conn.execute_batch(&sql)
        .map_err(|e| StewardError::storage("Migration v2 failed", &e))
}
