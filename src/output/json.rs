//! JSON output formatting for steward.

use serde::Serialize;
use serde_json::{json, Value};

use crate::error::StewardError;
use crate::queue::{PendingCounts, QueueName, QueueRecord};

/// Format queue records as JSON
///
/// # Errors
///
/// Returns `StewardError::Parse` if JSON serialization fails.
pub fn format_records_json(records: &[QueueRecord], queue: QueueName) -> Result<String, StewardError> {
    let output = json!({
        "queue": queue,
        "count": records.len(),
        "items": records
    });
    Ok(serde_json::to_string_pretty(&output)?)
}

/// Format unsynced counts as JSON
///
/// # Errors
///
/// Returns `StewardError::Parse` if JSON serialization fails.
pub fn format_counts_json(counts: &PendingCounts) -> Result<String, StewardError> {
    Ok(serde_json::to_string_pretty(counts)?)
}

/// Format cached reference items as JSON
///
/// # Errors
///
/// Returns `StewardError::Parse` if JSON serialization fails.
pub fn format_items_json(items: &[Value], list: &str) -> Result<String, StewardError> {
    let output = json!({
        "list": list,
        "count": items.len(),
        "items": items
    });
    Ok(serde_json::to_string_pretty(&output)?)
}

/// Generic JSON formatter for any serializable type
///
/// # Errors
///
/// Returns `StewardError::Parse` if JSON serialization fails.
pub fn to_json<T: Serialize>(value: &T) -> Result<String, StewardError> {
    Ok(serde_json::to_string_pretty(value)?)
}
