//! Queue command implementation.

use colored::Colorize;
use serde_json::json;

use super::{read_json_arg, Context};
use crate::cli::args::{OutputFormat, QueueCommands};
use crate::error::StewardError;
use crate::output::{format_counts, format_record, format_records, format_records_pretty, to_json};
use crate::queue::{OfflineQueue, QueueName};

/// Execute queue subcommands.
pub fn queue(ctx: &Context, cmd: QueueCommands) -> Result<String, StewardError> {
    let store = OfflineQueue::new(&ctx.db);
    let format = ctx.format;

    match cmd {
        QueueCommands::Add { queue, payload } => {
            let payload = read_json_arg(&payload)?;
            let id = store.enqueue(queue, &payload)?;
            match format {
                OutputFormat::Json => to_json(&json!({"queue": queue, "id": id})),
                OutputFormat::Pretty => Ok(format!(
                    "Queued {} record (ID: {id})",
                    queue.display_name().to_lowercase()
                )),
            }
        },
        QueueCommands::List { queue, date } => match date {
            Some(date) => {
                let records = store.list_by_date(queue, &date)?;
                match format {
                    OutputFormat::Json => format_records(&records, queue, format),
                    OutputFormat::Pretty => Ok(format_records_pretty(
                        &records,
                        &format!("{} on {date}", queue.display_name()),
                    )),
                }
            },
            None => format_records(&store.list_unsynced(queue)?, queue, format),
        },
        QueueCommands::Show { queue, id } => {
            let record = store
                .get(queue, id)?
                .ok_or_else(|| StewardError::NotFound(format!("{queue} record {id}")))?;
            format_record(&record, format)
        },
        QueueCommands::MarkSynced { queue, ids } => {
            let mut changed = 0;
            for id in &ids {
                if store.mark_synced(queue, *id)? {
                    changed += 1;
                }
            }
            match format {
                OutputFormat::Json => to_json(&json!({"queue": queue, "marked": changed})),
                OutputFormat::Pretty => Ok(format!(
                    "Marked {changed} of {} {queue} records synced",
                    ids.len()
                )),
            }
        },
        QueueCommands::ClearSynced { queue } => {
            let queues = queue.map_or_else(|| QueueName::ALL.to_vec(), |q| vec![q]);
            let mut cleared = 0;
            for q in queues {
                cleared += store.clear_synced(q)?;
            }
            match format {
                OutputFormat::Json => to_json(&json!({"cleared": cleared})),
                OutputFormat::Pretty => Ok(format!("Cleared {cleared} synced records")),
            }
        },
        QueueCommands::Status => format_counts(&store.count_unsynced()?, format),
        QueueCommands::Retry { queue, id } => {
            let reset = store.reset_attempts(queue, id)?;
            if let (Some(id), 0) = (id, reset) {
                return Err(StewardError::NotFound(format!("pending {queue} record {id}")));
            }
            match format {
                OutputFormat::Json => to_json(&json!({"queue": queue, "reset": reset})),
                OutputFormat::Pretty => Ok(format!("Reset {reset} {queue} records for retry")),
            }
        },
        QueueCommands::Purge { queue, force } => {
            if !force {
                return Err(StewardError::Config(
                    "Use --force to delete every record in the queue".to_string(),
                ));
            }
            let removed = store.purge(queue)?;
            match format {
                OutputFormat::Json => to_json(&json!({"queue": queue, "purged": removed})),
                OutputFormat::Pretty => Ok(format!(
                    "{} {removed} records from {queue}",
                    "Purged".red().bold()
                )),
            }
        },
    }
}
