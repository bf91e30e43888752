//! Record types for the offline write queues.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StewardError;

/// One of the three independent logical queues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueName {
    /// Opening/closing inventory entries
    Inventory,
    /// Daily sales entries
    Sales,
    /// Tub receipts
    Receipts,
}

impl QueueName {
    /// All queues, in display order.
    pub const ALL: [Self; 3] = [Self::Inventory, Self::Sales, Self::Receipts];

    /// Backing table for this queue.
    #[must_use]
    pub const fn table(self) -> &'static str {
        match self {
            Self::Inventory => "pending_inventory",
            Self::Sales => "pending_sales",
            Self::Receipts => "pending_receipts",
        }
    }

    /// Name used on the command line and in JSON output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inventory => "inventory",
            Self::Sales => "sales",
            Self::Receipts => "receipts",
        }
    }

    /// Human-readable name.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Inventory => "Inventory",
            Self::Sales => "Sales",
            Self::Receipts => "Tub Receipts",
        }
    }
}

impl fmt::Display for QueueName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueueName {
    type Err = StewardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "inventory" => Ok(Self::Inventory),
            "sales" => Ok(Self::Sales),
            "receipts" | "receipt" | "tub-receipts" => Ok(Self::Receipts),
            other => Err(StewardError::InvalidQueue(other.to_string())),
        }
    }
}

/// Delivery state of a queued record.
///
/// Only ever moves from `Pending` to `Synced`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    /// Not yet confirmed by the remote API
    Pending,
    /// Confirmed by the caller
    Synced,
}

impl SyncState {
    /// Column value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Synced => "synced",
        }
    }

    /// Parse a column value. Unknown values read as pending so they get
    /// resubmitted rather than dropped.
    #[must_use]
    pub fn from_column(s: &str) -> Self {
        if s == "synced" {
            Self::Synced
        } else {
            Self::Pending
        }
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A deferred write with its delivery bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueRecord {
    /// Local surrogate key, unique within the queue
    pub id: i64,
    /// Queue the record belongs to
    pub queue: QueueName,
    /// Request body as queued
    pub payload: Value,
    /// Delivery state
    pub state: SyncState,
    /// When the record was enqueued
    pub created_at: DateTime<Utc>,
    /// The payload's `date` field, if any
    pub entry_date: Option<String>,
    /// Failed submission attempts
    pub attempts: u32,
    /// Last submission attempt
    pub last_attempt: Option<DateTime<Utc>>,
    /// Last submission error
    pub last_error: Option<String>,
}

impl QueueRecord {
    /// Whether the record still needs to be submitted.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.state == SyncState::Pending
    }
}

/// Top-level `date` field of a payload, used for the date index.
#[must_use]
pub fn entry_date(payload: &Value) -> Option<String> {
    payload
        .get("date")
        .and_then(Value::as_str)
        .map(ToString::to_string)
}
