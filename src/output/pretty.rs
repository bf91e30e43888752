use colored::Colorize;
use serde_json::Value;

use crate::queue::{PendingCounts, QueueName, QueueRecord, SyncState};
use crate::session::Session;

/// Format queue records as a pretty table
pub fn format_records_pretty(records: &[QueueRecord], title: &str) -> String {
    if records.is_empty() {
        return format!("{title} (0 records)\n  Nothing queued");
    }

    let mut output = format!("{} ({} records)\n", title, records.len());
    output.push_str(&"─".repeat(60));
    output.push('\n');
    output.push_str(&format!(
        "{:<6} {:<18} {:<12} {:<8} {}\n",
        "ID", "Queued", "Date", "Tries", "State"
    ));

    for record in records {
        let state = match record.state {
            SyncState::Pending => "pending".yellow(),
            SyncState::Synced => "synced".green(),
        };

        output.push_str(&format!(
            "{:<6} {:<18} {:<12} {:<8} {}\n",
            record.id,
            record.created_at.format("%Y-%m-%d %H:%M"),
            record.entry_date.as_deref().unwrap_or("-"),
            record.attempts,
            state
        ));

        if let Some(error) = &record.last_error {
            let short_error: String = if error.chars().count() > 50 {
                format!("{}...", error.chars().take(47).collect::<String>())
            } else {
                error.clone()
            };
            output.push_str(&format!("       {}\n", short_error.red()));
        }
    }

    output
}

/// Format a single record with its payload
pub fn format_record_pretty(record: &QueueRecord) -> String {
    let mut lines = vec![format!(
        "{} #{}  {}",
        record.queue.display_name().bold(),
        record.id,
        match record.state {
            SyncState::Pending => "pending".yellow(),
            SyncState::Synced => "synced".green(),
        }
    )];

    lines.push(format!(
        "  Queued:   {}",
        record.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    if let Some(date) = &record.entry_date {
        lines.push(format!("  Date:     {date}"));
    }
    if record.attempts > 0 {
        lines.push(format!("  Attempts: {}", record.attempts));
    }
    if let Some(last) = record.last_attempt {
        lines.push(format!("  Last try: {}", last.format("%Y-%m-%d %H:%M:%S UTC")));
    }
    if let Some(error) = &record.last_error {
        lines.push(format!("  Error:    {}", error.red()));
    }

    lines.push(String::new());
    lines.push(serde_json::to_string_pretty(&record.payload).unwrap_or_default());

    lines.join("\n")
}

/// Format unsynced counts
pub fn format_counts_pretty(counts: &PendingCounts) -> String {
    let mut lines = Vec::new();

    lines.push("Offline Queue Status".bold().to_string());
    lines.push("─".repeat(40));

    for queue in QueueName::ALL {
        let count = counts.get(queue);
        let label = format!("{}:", queue.display_name());
        lines.push(format!(
            "  {label:<14}{} {}",
            count,
            if count > 0 {
                "waiting".dimmed()
            } else {
                "".dimmed()
            }
        ));
    }

    lines.push(format!("  {:<14}{}", "Total:", counts.total.to_string().bold()));

    if counts.total > 0 {
        lines.push(String::new());
        lines.push(
            "Run 'steward sync run' to submit pending records"
                .dimmed()
                .to_string(),
        );
    }

    lines.join("\n")
}

/// Format cached reference items
pub fn format_items_pretty(items: &[Value], list: &str) -> String {
    if items.is_empty() {
        return format!("{list} (0 items)\n  Cache is empty");
    }

    let mut output = format!("{} ({} items)\n", list, items.len());
    output.push_str(&"─".repeat(40));
    output.push('\n');

    for item in items {
        let id = match item.get("id") {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => "?".to_string(),
        };
        let name = item.get("name").and_then(Value::as_str).unwrap_or("");
        let code = item.get("code").and_then(Value::as_str).unwrap_or("");

        output.push_str(&format!("{:<6} {}  {}\n", id, name.bold(), code.dimmed()));
    }

    output
}

/// Format the current session
pub fn format_session_pretty(session: &Session) -> String {
    if !session.is_authenticated() {
        return "Not logged in".dimmed().to_string();
    }

    let mut lines = vec![format!(
        "Logged in as {}",
        session.username().unwrap_or("unknown user").bold()
    )];

    if let Some(role) = session
        .user
        .as_ref()
        .and_then(|u| u.get("role"))
        .and_then(Value::as_str)
    {
        lines.push(format!("  Role: {role}"));
    }

    lines.join("\n")
}
