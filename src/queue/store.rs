//! Offline queue storage and management.
//!
//! Provides persistence and querying of deferred writes. Every storage
//! failure surfaces as [`StewardError::StorageUnavailable`]; nothing here
//! retries.

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Row};
use serde::Serialize;
use serde_json::Value;

use super::record::{entry_date, QueueName, QueueRecord, SyncState};
use crate::error::StewardError;
use crate::storage::Database;

const RECORD_COLUMNS: &str =
    "id, payload, state, created_at, entry_date, attempts, last_attempt, last_error";

/// Unsynced record counts across all queues.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PendingCounts {
    /// Pending inventory entries
    pub inventory: u64,
    /// Pending sales entries
    pub sales: u64,
    /// Pending tub receipts
    pub receipts: u64,
    /// Sum of the above
    pub total: u64,
}

impl PendingCounts {
    /// Count for a single queue.
    #[must_use]
    pub const fn get(&self, queue: QueueName) -> u64 {
        match queue {
            QueueName::Inventory => self.inventory,
            QueueName::Sales => self.sales,
            QueueName::Receipts => self.receipts,
        }
    }
}

/// Offline write queues backed by the local database.
pub struct OfflineQueue<'a> {
    db: &'a Database,
}

impl<'a> OfflineQueue<'a> {
    /// Create a queue handle over an open database.
    #[must_use]
    pub const fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Append a payload to a queue and return its id.
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the record cannot be saved.
    pub fn enqueue(&self, queue: QueueName, payload: &Value) -> Result<i64, StewardError> {
        let conn = self.db.connection();
        let body = serde_json::to_string(payload)?;

        conn.execute(
            &format!(
                "INSERT INTO {} (payload, entry_date, state, created_at) VALUES (?1, ?2, ?3, ?4)",
                queue.table()
            ),
            params![
                body,
                entry_date(payload),
                SyncState::Pending.as_str(),
                Utc::now().to_rfc3339(),
            ],
        )
        .map_err(|e| StewardError::storage("Failed to enqueue record", &e))?;

        let id = conn.last_insert_rowid();
        tracing::debug!(%queue, id, "enqueued record");
        Ok(id)
    }

    /// Snapshot of every unsynced record in a queue.
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the query fails.
    pub fn list_unsynced(&self, queue: QueueName) -> Result<Vec<QueueRecord>, StewardError> {
        self.query_records(
            queue,
            &format!(
                "SELECT {RECORD_COLUMNS} FROM {} WHERE state = ?1 ORDER BY id ASC",
                queue.table()
            ),
            &[&SyncState::Pending.as_str()],
        )
    }

    /// Every record, synced or not, whose payload carries the given date.
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the query fails.
    pub fn list_by_date(
        &self,
        queue: QueueName,
        date: &str,
    ) -> Result<Vec<QueueRecord>, StewardError> {
        self.query_records(
            queue,
            &format!(
                "SELECT {RECORD_COLUMNS} FROM {} WHERE entry_date = ?1 ORDER BY id ASC",
                queue.table()
            ),
            &[&date],
        )
    }

    /// Get a specific record by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the query fails.
    pub fn get(&self, queue: QueueName, id: i64) -> Result<Option<QueueRecord>, StewardError> {
        let conn = self.db.connection();

        conn.query_row(
            &format!("SELECT {RECORD_COLUMNS} FROM {} WHERE id = ?1", queue.table()),
            [id],
            |row| row_to_record(queue, row),
        )
        .optional()
        .map_err(|e| StewardError::storage("Failed to load record", &e))
    }

    /// Mark a record as synced.
    ///
    /// A missing or already-synced id is a no-op. Returns whether the
    /// record changed state.
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the update fails.
    pub fn mark_synced(&self, queue: QueueName, id: i64) -> Result<bool, StewardError> {
        let conn = self.db.connection();

        let rows = conn
            .execute(
                &format!("UPDATE {} SET state = ?1 WHERE id = ?2 AND state = ?3", queue.table()),
                params![SyncState::Synced.as_str(), id, SyncState::Pending.as_str()],
            )
            .map_err(|e| StewardError::storage("Failed to mark record synced", &e))?;

        tracing::debug!(%queue, id, changed = rows > 0, "mark synced");
        Ok(rows > 0)
    }

    /// Delete every synced record in a queue. Returns the number removed.
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the delete fails.
    pub fn clear_synced(&self, queue: QueueName) -> Result<usize, StewardError> {
        let conn = self.db.connection();

        let rows = conn
            .execute(
                &format!("DELETE FROM {} WHERE state = ?1", queue.table()),
                [SyncState::Synced.as_str()],
            )
            .map_err(|e| StewardError::storage("Failed to clear synced records", &e))?;

        tracing::debug!(%queue, removed = rows, "cleared synced records");
        Ok(rows)
    }

    /// Unsynced counts per queue, read in a single transaction.
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the query fails.
    pub fn count_unsynced(&self) -> Result<PendingCounts, StewardError> {
        let tx = self
            .db
            .connection()
            .unchecked_transaction()
            .map_err(|e| StewardError::storage("Failed to begin transaction", &e))?;

        let mut counts = PendingCounts::default();
        for queue in QueueName::ALL {
            let count: i64 = tx
                .query_row(
                    &format!("SELECT COUNT(*) FROM {} WHERE state = ?1", queue.table()),
                    [SyncState::Pending.as_str()],
                    |row| row.get(0),
                )
                .map_err(|e| StewardError::storage("Failed to count unsynced records", &e))?;
            let count = u64::try_from(count).unwrap_or(0);

            match queue {
                QueueName::Inventory => counts.inventory = count,
                QueueName::Sales => counts.sales = count,
                QueueName::Receipts => counts.receipts = count,
            }
            counts.total += count;
        }

        tx.commit()
            .map_err(|e| StewardError::storage("Failed to finish transaction", &e))?;
        Ok(counts)
    }

    /// Record a failed submission attempt.
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the update fails.
    pub fn record_attempt(
        &self,
        queue: QueueName,
        id: i64,
        error: Option<&str>,
    ) -> Result<(), StewardError> {
        self.record_attempt_at(queue, id, error, Utc::now())
    }

    pub(crate) fn record_attempt_at(
        &self,
        queue: QueueName,
        id: i64,
        error: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<(), StewardError> {
        let conn = self.db.connection();

        conn.execute(
            &format!(
                r"UPDATE {} SET
                  last_attempt = ?1,
                  last_error = ?2,
                  attempts = attempts + 1
                  WHERE id = ?3",
                queue.table()
            ),
            params![at.to_rfc3339(), error, id],
        )
        .map_err(|e| StewardError::storage("Failed to record attempt", &e))?;

        Ok(())
    }

    /// Clear delivery bookkeeping so records are retried immediately.
    ///
    /// With `id` only that record is reset, otherwise every pending record in
    /// the queue. Returns the number of records reset.
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the update fails.
    pub fn reset_attempts(&self, queue: QueueName, id: Option<i64>) -> Result<usize, StewardError> {
        let conn = self.db.connection();
        let base = format!(
            "UPDATE {} SET attempts = 0, last_attempt = NULL, last_error = NULL WHERE state = ?1",
            queue.table()
        );

        let rows = match id {
            Some(id) => conn.execute(
                &format!("{base} AND id = ?2"),
                params![SyncState::Pending.as_str(), id],
            ),
            None => conn.execute(&base, [SyncState::Pending.as_str()]),
        }
        .map_err(|e| StewardError::storage("Failed to reset attempts", &e))?;

        Ok(rows)
    }

    /// Delete every record in a queue, synced or not.
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the delete fails.
    pub fn purge(&self, queue: QueueName) -> Result<usize, StewardError> {
        let conn = self.db.connection();

        let rows = conn
            .execute(&format!("DELETE FROM {}", queue.table()), [])
            .map_err(|e| StewardError::storage("Failed to purge queue", &e))?;

        tracing::info!(%queue, removed = rows, "purged queue");
        Ok(rows)
    }

    fn query_records(
        &self,
        queue: QueueName,
        sql: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<QueueRecord>, StewardError> {
        let conn = self.db.connection();

        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| StewardError::storage("Failed to prepare query", &e))?;

        let rows = stmt
            .query_map(params, |row| row_to_record(queue, row))
            .map_err(|e| StewardError::storage("Failed to query records", &e))?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row.map_err(|e| StewardError::storage("Failed to read record", &e))?);
        }

        Ok(records)
    }
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .ok()
}

fn row_to_record(queue: QueueName, row: &Row<'_>) -> Result<QueueRecord, rusqlite::Error> {
    let id: i64 = row.get(0)?;
    let payload_str: String = row.get(1)?;
    let state_str: String = row.get(2)?;
    let created_at_str: String = row.get(3)?;
    let entry_date: Option<String> = row.get(4)?;
    let attempts: i64 = row.get(5)?;
    let last_attempt_str: Option<String> = row.get(6)?;
    let last_error: Option<String> = row.get(7)?;

    let payload = serde_json::from_str(&payload_str)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?;
    let created_at = DateTime::parse_from_rfc3339(&created_at_str)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?
        .with_timezone(&Utc);

    Ok(QueueRecord {
        id,
        queue,
        payload,
        state: SyncState::from_column(&state_str),
        created_at,
        entry_date,
        attempts: u32::try_from(attempts).unwrap_or(0),
        last_attempt: last_attempt_str.as_deref().and_then(parse_timestamp),
        last_error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ids(records: &[QueueRecord]) -> Vec<i64> {
        records.iter().map(|r| r.id).collect()
    }

    #[test]
    fn test_enqueue_then_list_unsynced() {
        let db = Database::open_in_memory().unwrap();
        let queue = OfflineQueue::new(&db);

        let payloads = [
            json!({"branch_id": 4, "date": "2024-06-01", "items": [{"flavor_id": 1, "tubs": 2.5}]}),
            json!("plain string"),
            json!(null),
            json!([1, 2, 3]),
        ];

        for payload in &payloads {
            let id = queue.enqueue(QueueName::Inventory, payload).unwrap();
            let pending = queue.list_unsynced(QueueName::Inventory).unwrap();
            let record = pending.iter().find(|r| r.id == id).unwrap();
            assert_eq!(&record.payload, payload);
            assert_eq!(record.state, SyncState::Pending);
            assert_eq!(record.attempts, 0);
        }
    }

    #[test]
    fn test_enqueue_extracts_entry_date() {
        let db = Database::open_in_memory().unwrap();
        let queue = OfflineQueue::new(&db);

        let id = queue
            .enqueue(QueueName::Sales, &json!({"date": "2024-06-01", "total": 120}))
            .unwrap();
        let record = queue.get(QueueName::Sales, id).unwrap().unwrap();
        assert_eq!(record.entry_date.as_deref(), Some("2024-06-01"));
    }

    #[test]
    fn test_mark_synced_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        let queue = OfflineQueue::new(&db);

        let id = queue.enqueue(QueueName::Sales, &json!({"total": 1})).unwrap();

        assert!(queue.mark_synced(QueueName::Sales, id).unwrap());
        let once = queue.get(QueueName::Sales, id).unwrap();

        assert!(!queue.mark_synced(QueueName::Sales, id).unwrap());
        let twice = queue.get(QueueName::Sales, id).unwrap();

        assert_eq!(once, twice);
        assert_eq!(twice.unwrap().state, SyncState::Synced);
    }

    #[test]
    fn test_mark_synced_missing_id_is_noop() {
        let db = Database::open_in_memory().unwrap();
        let queue = OfflineQueue::new(&db);

        assert!(!queue.mark_synced(QueueName::Receipts, 999).unwrap());
        assert!(queue.list_unsynced(QueueName::Receipts).unwrap().is_empty());
    }

    #[test]
    fn test_marked_record_leaves_unsynced_list() {
        let db = Database::open_in_memory().unwrap();
        let queue = OfflineQueue::new(&db);

        let id = queue.enqueue(QueueName::Inventory, &json!({})).unwrap();
        queue.mark_synced(QueueName::Inventory, id).unwrap();

        let pending = queue.list_unsynced(QueueName::Inventory).unwrap();
        assert!(!ids(&pending).contains(&id));
    }

    #[test]
    fn test_sales_scenario() {
        let db = Database::open_in_memory().unwrap();
        let queue = OfflineQueue::new(&db);

        for total in [10, 20, 30] {
            queue.enqueue(QueueName::Sales, &json!({"total": total})).unwrap();
        }

        queue.mark_synced(QueueName::Sales, 2).unwrap();
        assert_eq!(ids(&queue.list_unsynced(QueueName::Sales).unwrap()), vec![1, 3]);

        assert_eq!(queue.clear_synced(QueueName::Sales).unwrap(), 1);
        assert!(queue.get(QueueName::Sales, 2).unwrap().is_none());

        let remaining = queue.list_unsynced(QueueName::Sales).unwrap();
        assert_eq!(ids(&remaining), vec![1, 3]);
        assert!(remaining.iter().all(QueueRecord::is_pending));
    }

    #[test]
    fn test_clear_synced_removes_exactly_synced() {
        let mixtures: [&[bool]; 4] = [
            &[],
            &[true, true, true],
            &[false, false],
            &[true, false, true, false, false, true],
        ];

        for mixture in mixtures {
            let db = Database::open_in_memory().unwrap();
            let queue = OfflineQueue::new(&db);

            let mut expected_left = Vec::new();
            for (i, synced) in mixture.iter().enumerate() {
                let id = queue.enqueue(QueueName::Receipts, &json!({"n": i})).unwrap();
                if *synced {
                    queue.mark_synced(QueueName::Receipts, id).unwrap();
                } else {
                    expected_left.push(id);
                }
            }

            let removed = queue.clear_synced(QueueName::Receipts).unwrap();
            assert_eq!(removed, mixture.iter().filter(|s| **s).count());
            assert_eq!(ids(&queue.list_unsynced(QueueName::Receipts).unwrap()), expected_left);
        }
    }

    #[test]
    fn test_ids_not_reused_after_clear() {
        let db = Database::open_in_memory().unwrap();
        let queue = OfflineQueue::new(&db);

        let first = queue.enqueue(QueueName::Sales, &json!({})).unwrap();
        queue.mark_synced(QueueName::Sales, first).unwrap();
        queue.clear_synced(QueueName::Sales).unwrap();

        let second = queue.enqueue(QueueName::Sales, &json!({})).unwrap();
        assert!(second > first);
    }

    #[test]
    fn test_queue_isolation() {
        let db = Database::open_in_memory().unwrap();
        let queue = OfflineQueue::new(&db);

        queue.enqueue(QueueName::Sales, &json!({"total": 5})).unwrap();
        let before_sales = queue.list_unsynced(QueueName::Sales).unwrap();

        let id = queue.enqueue(QueueName::Inventory, &json!({"tubs": 3})).unwrap();
        queue.mark_synced(QueueName::Inventory, id).unwrap();
        queue.enqueue(QueueName::Inventory, &json!({"tubs": 4})).unwrap();
        queue.clear_synced(QueueName::Inventory).unwrap();

        assert_eq!(queue.list_unsynced(QueueName::Sales).unwrap(), before_sales);
        assert!(queue.list_unsynced(QueueName::Receipts).unwrap().is_empty());
    }

    #[test]
    fn test_ids_are_per_queue() {
        let db = Database::open_in_memory().unwrap();
        let queue = OfflineQueue::new(&db);

        assert_eq!(queue.enqueue(QueueName::Inventory, &json!({})).unwrap(), 1);
        assert_eq!(queue.enqueue(QueueName::Sales, &json!({})).unwrap(), 1);
        queue.mark_synced(QueueName::Sales, 1).unwrap();

        let inventory = queue.get(QueueName::Inventory, 1).unwrap().unwrap();
        assert_eq!(inventory.state, SyncState::Pending);
    }

    #[test]
    fn test_count_unsynced_total_is_sum() {
        let db = Database::open_in_memory().unwrap();
        let queue = OfflineQueue::new(&db);

        for _ in 0..3 {
            queue.enqueue(QueueName::Inventory, &json!({})).unwrap();
        }
        let synced = queue.enqueue(QueueName::Sales, &json!({})).unwrap();
        queue.enqueue(QueueName::Sales, &json!({})).unwrap();
        queue.mark_synced(QueueName::Sales, synced).unwrap();
        queue.enqueue(QueueName::Receipts, &json!({})).unwrap();

        let counts = queue.count_unsynced().unwrap();
        assert_eq!(counts.inventory, 3);
        assert_eq!(counts.sales, 1);
        assert_eq!(counts.receipts, 1);
        assert_eq!(counts.total, counts.inventory + counts.sales + counts.receipts);
        assert_eq!(counts.get(QueueName::Sales), 1);
    }

    #[test]
    fn test_count_unsynced_empty() {
        let db = Database::open_in_memory().unwrap();
        let queue = OfflineQueue::new(&db);
        assert_eq!(queue.count_unsynced().unwrap(), PendingCounts::default());
    }

    #[test]
    fn test_list_by_date_includes_synced() {
        let db = Database::open_in_memory().unwrap();
        let queue = OfflineQueue::new(&db);

        let a = queue
            .enqueue(QueueName::Inventory, &json!({"date": "2024-06-01"}))
            .unwrap();
        let b = queue
            .enqueue(QueueName::Inventory, &json!({"date": "2024-06-01"}))
            .unwrap();
        queue
            .enqueue(QueueName::Inventory, &json!({"date": "2024-06-02"}))
            .unwrap();
        queue.mark_synced(QueueName::Inventory, b).unwrap();

        let records = queue.list_by_date(QueueName::Inventory, "2024-06-01").unwrap();
        assert_eq!(ids(&records), vec![a, b]);
    }

    #[test]
    fn test_record_and_reset_attempts() {
        let db = Database::open_in_memory().unwrap();
        let queue = OfflineQueue::new(&db);

        let id = queue.enqueue(QueueName::Sales, &json!({})).unwrap();
        queue.record_attempt(QueueName::Sales, id, Some("timeout")).unwrap();
        queue.record_attempt(QueueName::Sales, id, Some("502")).unwrap();

        let record = queue.get(QueueName::Sales, id).unwrap().unwrap();
        assert_eq!(record.attempts, 2);
        assert_eq!(record.last_error.as_deref(), Some("502"));
        assert!(record.last_attempt.is_some());
        assert_eq!(record.state, SyncState::Pending);

        assert_eq!(queue.reset_attempts(QueueName::Sales, Some(id)).unwrap(), 1);
        let record = queue.get(QueueName::Sales, id).unwrap().unwrap();
        assert_eq!(record.attempts, 0);
        assert!(record.last_error.is_none());
    }

    #[test]
    fn test_reset_attempts_skips_synced() {
        let db = Database::open_in_memory().unwrap();
        let queue = OfflineQueue::new(&db);

        let id = queue.enqueue(QueueName::Sales, &json!({})).unwrap();
        queue.record_attempt(QueueName::Sales, id, Some("timeout")).unwrap();
        queue.mark_synced(QueueName::Sales, id).unwrap();

        assert_eq!(queue.reset_attempts(QueueName::Sales, None).unwrap(), 0);
    }

    #[test]
    fn test_purge() {
        let db = Database::open_in_memory().unwrap();
        let queue = OfflineQueue::new(&db);

        queue.enqueue(QueueName::Receipts, &json!({})).unwrap();
        let id = queue.enqueue(QueueName::Receipts, &json!({})).unwrap();
        queue.mark_synced(QueueName::Receipts, id).unwrap();

        assert_eq!(queue.purge(QueueName::Receipts).unwrap(), 2);
        assert_eq!(queue.count_unsynced().unwrap().receipts, 0);
    }

    #[test]
    fn test_operations_fail_when_store_breaks() {
        let db = Database::open_in_memory().unwrap();
        let queue = OfflineQueue::new(&db);
        let id = queue.enqueue(QueueName::Sales, &json!({"total": 1})).unwrap();

        db.connection()
            .execute_batch("DROP TABLE pending_sales")
            .unwrap();

        assert!(matches!(
            queue.enqueue(QueueName::Sales, &json!({})),
            Err(StewardError::StorageUnavailable(_))
        ));
        assert!(matches!(
            queue.list_unsynced(QueueName::Sales),
            Err(StewardError::StorageUnavailable(_))
        ));
        assert!(matches!(
            queue.mark_synced(QueueName::Sales, id),
            Err(StewardError::StorageUnavailable(_))
        ));
        assert!(matches!(
            queue.clear_synced(QueueName::Sales),
            Err(StewardError::StorageUnavailable(_))
        ));
        assert!(matches!(
            queue.count_unsynced(),
            Err(StewardError::StorageUnavailable(_))
        ));

        // Other queues are unaffected.
        assert!(queue.enqueue(QueueName::Inventory, &json!({})).is_ok());
    }

    #[test]
    fn test_corrupt_created_at_is_an_error() {
        let db = Database::open_in_memory().unwrap();
        let queue = OfflineQueue::new(&db);

        db.connection()
            .execute(
                "INSERT INTO pending_receipts (payload, entry_date, created_at) VALUES ('{}', NULL, 'yesterday')",
                [],
            )
            .unwrap();

        assert!(matches!(
            queue.list_unsynced(QueueName::Receipts),
            Err(StewardError::StorageUnavailable(_))
        ));
    }
}
