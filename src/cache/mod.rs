//! Read-through cache of small reference lists.
//!
//! A list (the flavor catalog, for example) is a full snapshot keyed by each
//! item's remote `id`. Refreshing replaces the whole snapshot; there is no
//! merging, versioning or expiry.

use std::collections::HashSet;

use rusqlite::params;
use serde_json::Value;

use crate::error::StewardError;
use crate::storage::Database;

/// Name of the flavor catalog list.
pub const FLAVORS: &str = "flavors";

/// Snapshot of one named reference list.
pub struct ReferenceCache<'a> {
    db: &'a Database,
    list: String,
}

impl<'a> ReferenceCache<'a> {
    /// Open the cache for a named list.
    #[must_use]
    pub fn new(db: &'a Database, list: impl Into<String>) -> Self {
        Self {
            db,
            list: list.into(),
        }
    }

    /// Cache for the flavor catalog.
    #[must_use]
    pub fn flavors(db: &'a Database) -> Self {
        Self::new(db, FLAVORS)
    }

    /// Name of the list.
    #[must_use]
    pub fn list(&self) -> &str {
        &self.list
    }

    /// Replace the snapshot with `items`. Returns the number stored.
    ///
    /// An empty slice empties the list. The call is all-or-nothing: if any
    /// item lacks an `id` or repeats one, the previous snapshot is kept.
    ///
    /// # Errors
    ///
    /// Returns `InvalidItem` for an unkeyable item and `StorageUnavailable`
    /// if the transaction fails.
    pub fn replace_all(&self, items: &[Value]) -> Result<usize, StewardError> {
        let mut seen = HashSet::with_capacity(items.len());
        let mut keyed = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let key = item_key(item).ok_or_else(|| {
                StewardError::InvalidItem(format!("item {index} in '{}' has no id", self.list))
            })?;
            if !seen.insert(key.clone()) {
                return Err(StewardError::InvalidItem(format!(
                    "duplicate id '{key}' in '{}'",
                    self.list
                )));
            }
            keyed.push((key, serde_json::to_string(item)?));
        }

        let tx = self
            .db
            .connection()
            .unchecked_transaction()
            .map_err(|e| StewardError::storage("Failed to begin transaction", &e))?;

        tx.execute("DELETE FROM reference_cache WHERE list = ?1", [&self.list])
            .map_err(|e| StewardError::storage("Failed to clear reference list", &e))?;

        {
            let mut stmt = tx
                .prepare("INSERT INTO reference_cache (list, item_id, data) VALUES (?1, ?2, ?3)")
                .map_err(|e| StewardError::storage("Failed to prepare insert", &e))?;
            for (key, data) in &keyed {
                stmt.execute(params![self.list, key, data])
                    .map_err(|e| StewardError::storage("Failed to cache item", &e))?;
            }
        }

        tx.commit()
            .map_err(|e| StewardError::storage("Failed to commit reference list", &e))?;

        tracing::debug!(list = %self.list, items = keyed.len(), "replaced reference list");
        Ok(keyed.len())
    }

    /// Current snapshot in insertion order; empty if never populated.
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the query fails.
    pub fn get_all(&self) -> Result<Vec<Value>, StewardError> {
        let conn = self.db.connection();

        let mut stmt = conn
            .prepare("SELECT data FROM reference_cache WHERE list = ?1 ORDER BY seq ASC")
            .map_err(|e| StewardError::storage("Failed to prepare query", &e))?;

        let rows = stmt
            .query_map([&self.list], |row| row.get::<_, String>(0))
            .map_err(|e| StewardError::storage("Failed to query reference list", &e))?;

        let mut items = Vec::new();
        for row in rows {
            let data = row.map_err(|e| StewardError::storage("Failed to read item", &e))?;
            items.push(serde_json::from_str(&data)?);
        }

        Ok(items)
    }

    /// Number of cached items.
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the query fails.
    pub fn len(&self) -> Result<usize, StewardError> {
        let count: i64 = self
            .db
            .connection()
            .query_row(
                "SELECT COUNT(*) FROM reference_cache WHERE list = ?1",
                [&self.list],
                |row| row.get(0),
            )
            .map_err(|e| StewardError::storage("Failed to count reference list", &e))?;

        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Whether the list has never been populated or was emptied.
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the query fails.
    pub fn is_empty(&self) -> Result<bool, StewardError> {
        Ok(self.len()? == 0)
    }
}

/// Key of a reference item: the JSON text of its `id`, so `1` and `"1"`
/// stay distinct.
fn item_key(item: &Value) -> Option<String> {
    match item.get("id")? {
        id @ (Value::String(_) | Value::Number(_)) => serde_json::to_string(id).ok(),
        _ => None,
    }
}
