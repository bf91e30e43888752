//! Output formatting for steward.
//!
//! This module provides formatters for displaying queue and cache data in
//! various formats.

mod json;
mod pretty;

use serde_json::Value;

use crate::cli::args::OutputFormat;
use crate::error::StewardError;
use crate::queue::{PendingCounts, QueueName, QueueRecord};

pub use json::*;
pub use pretty::*;

/// Format queue records based on output format
///
/// # Errors
///
/// Returns `StewardError::Parse` if JSON serialization fails.
pub fn format_records(
    records: &[QueueRecord],
    queue: QueueName,
    format: OutputFormat,
) -> Result<String, StewardError> {
    match format {
        OutputFormat::Pretty => Ok(format_records_pretty(records, queue.display_name())),
        OutputFormat::Json => format_records_json(records, queue),
    }
}

/// Format a single record based on output format
///
/// # Errors
///
/// Returns `StewardError::Parse` if JSON serialization fails.
pub fn format_record(record: &QueueRecord, format: OutputFormat) -> Result<String, StewardError> {
    match format {
        OutputFormat::Pretty => Ok(format_record_pretty(record)),
        OutputFormat::Json => to_json(record),
    }
}

/// Format unsynced counts based on output format
///
/// # Errors
///
/// Returns `StewardError::Parse` if JSON serialization fails.
pub fn format_counts(counts: &PendingCounts, format: OutputFormat) -> Result<String, StewardError> {
    match format {
        OutputFormat::Pretty => Ok(format_counts_pretty(counts)),
        OutputFormat::Json => format_counts_json(counts),
    }
}

/// Format cached reference items based on output format
///
/// # Errors
///
/// Returns `StewardError::Parse` if JSON serialization fails.
pub fn format_items(items: &[Value], list: &str, format: OutputFormat) -> Result<String, StewardError> {
    match format {
        OutputFormat::Pretty => Ok(format_items_pretty(items, list)),
        OutputFormat::Json => format_items_json(items, list),
    }
}
