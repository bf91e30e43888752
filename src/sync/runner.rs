//! Sync runner for draining the offline queues.
//!
//! Submits pending records through a [`Submitter`], marks successes synced
//! and records failures for backoff. The queue itself never retries; this is
//! the caller-side flush pass.

use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::Serialize;
use serde_json::Value;

use super::policy::RetryPolicy;
use crate::error::StewardError;
use crate::queue::{OfflineQueue, QueueName};
use crate::storage::Database;

/// Destination for queued payloads.
#[cfg_attr(test, mockall::automock)]
pub trait Submitter {
    /// Persist one payload remotely.
    ///
    /// # Errors
    ///
    /// `Unauthorized` stops the whole run; any other error counts as a
    /// failed attempt for that record.
    fn submit(&self, queue: QueueName, payload: &Value) -> Result<(), StewardError>;
}

/// Configuration for the sync runner.
#[derive(Debug, Clone, Default)]
pub struct RunnerConfig {
    /// Backoff and max-attempts policy
    pub policy: RetryPolicy,
    /// Report what would be submitted without touching the store
    pub dry_run: bool,
    /// Delete synced records once the pass finishes
    pub clear_after_sync: bool,
}

/// What happened to a single record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Accepted remotely and marked synced
    Submitted,
    /// Rejected or unreachable; attempt recorded
    Failed,
    /// Backoff has not elapsed yet
    Deferred,
    /// Out of attempts; needs a manual retry
    Exhausted,
    /// Dry run: would have been submitted
    WouldSubmit,
}

/// Result of processing a single record.
#[derive(Debug, Clone, Serialize)]
pub struct RecordResult {
    /// Queue of the record
    pub queue: QueueName,
    /// Record id
    pub id: i64,
    /// Outcome
    pub outcome: Outcome,
    /// Error message if the submission failed
    pub error: Option<String>,
}

/// Result of a sync pass.
#[derive(Debug, Default, Serialize)]
pub struct SyncReport {
    /// Records accepted remotely
    pub submitted: usize,
    /// Records whose submission failed
    pub failed: usize,
    /// Records waiting for their backoff
    pub deferred: usize,
    /// Records out of attempts
    pub exhausted: usize,
    /// Records a dry run would have submitted
    pub would_submit: usize,
    /// Synced records removed after the pass
    pub cleared: usize,
    /// Set when the API rejected the session and the pass stopped early
    pub aborted: Option<String>,
    /// Individual results
    pub results: Vec<RecordResult>,
}

impl SyncReport {
    fn add(&mut self, result: RecordResult) {
        match result.outcome {
            Outcome::Submitted => self.submitted += 1,
            Outcome::Failed => self.failed += 1,
            Outcome::Deferred => self.deferred += 1,
            Outcome::Exhausted => self.exhausted += 1,
            Outcome::WouldSubmit => self.would_submit += 1,
        }
        self.results.push(result);
    }

    /// Get total records looked at.
    #[must_use]
    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// Whether nothing failed and the pass ran to completion.
    #[must_use]
    pub const fn all_succeeded(&self) -> bool {
        self.failed == 0 && self.aborted.is_none()
    }
}

/// Drains the offline queues through a [`Submitter`].
pub struct SyncRunner<'a, S: Submitter> {
    queue: OfflineQueue<'a>,
    submitter: &'a S,
    config: RunnerConfig,
}

impl<'a, S: Submitter> SyncRunner<'a, S> {
    /// Create a runner with default config.
    #[must_use]
    pub fn new(db: &'a Database, submitter: &'a S) -> Self {
        Self::with_config(db, submitter, RunnerConfig::default())
    }

    /// Create a runner with custom config.
    #[must_use]
    pub const fn with_config(db: &'a Database, submitter: &'a S, config: RunnerConfig) -> Self {
        Self {
            queue: OfflineQueue::new(db),
            submitter,
            config,
        }
    }

    /// Run one pass over every queue now.
    ///
    /// # Errors
    ///
    /// Returns an error if the local store fails. Remote failures are
    /// reported in the [`SyncReport`].
    pub fn run(&self) -> Result<SyncReport, StewardError> {
        self.run_at(Utc::now())
    }

    /// Run one pass, treating `now` as the current time.
    ///
    /// # Errors
    ///
    /// Returns an error if the local store fails.
    pub fn run_at(&self, now: DateTime<Utc>) -> Result<SyncReport, StewardError> {
        let policy = self.config.policy;
        let mut report = SyncReport::default();

        'queues: for queue in QueueName::ALL {
            for record in self.queue.list_unsynced(queue)? {
                let outcome = if policy.is_exhausted(record.attempts) {
                    Outcome::Exhausted
                } else if !policy.is_due(&record, now) {
                    Outcome::Deferred
                } else if self.config.dry_run {
                    Outcome::WouldSubmit
                } else {
                    match self.submitter.submit(queue, &record.payload) {
                        Ok(()) => {
                            self.queue.mark_synced(queue, record.id)?;
                            Outcome::Submitted
                        },
                        Err(e) if e.is_unauthorized() => {
                            tracing::warn!(%queue, id = record.id, "sync aborted: {e}");
                            report.aborted = Some(e.to_string());
                            break 'queues;
                        },
                        Err(e) => {
                            let message = e.to_string();
                            tracing::debug!(%queue, id = record.id, error = %message, "submission failed");
                            self.queue
                                .record_attempt_at(queue, record.id, Some(&message), now)?;
                            report.add(RecordResult {
                                queue,
                                id: record.id,
                                outcome: Outcome::Failed,
                                error: Some(message),
                            });
                            continue;
                        },
                    }
                };

                report.add(RecordResult {
                    queue,
                    id: record.id,
                    outcome,
                    error: None,
                });
            }
        }

        if self.config.clear_after_sync && !self.config.dry_run {
            for queue in QueueName::ALL {
                report.cleared += self.queue.clear_synced(queue)?;
            }
        }

        tracing::info!(
            submitted = report.submitted,
            failed = report.failed,
            deferred = report.deferred,
            exhausted = report.exhausted,
            "sync pass finished"
        );
        Ok(report)
    }

    /// Earliest time a pending, non-exhausted record becomes due.
    ///
    /// Returns `None` when nothing is left to submit. A value at or before
    /// `now` means a record is due immediately.
    ///
    /// # Errors
    ///
    /// Returns an error if the local store fails.
    pub fn next_due(&self, now: DateTime<Utc>) -> Result<Option<DateTime<Utc>>, StewardError> {
        let policy = self.config.policy;
        let mut earliest: Option<DateTime<Utc>> = None;

        for queue in QueueName::ALL {
            for record in self.queue.list_unsynced(queue)? {
                if policy.is_exhausted(record.attempts) {
                    continue;
                }
                let due = policy.next_attempt_at(&record).unwrap_or(now);
                earliest = Some(earliest.map_or(due, |e| e.min(due)));
            }
        }

        Ok(earliest)
    }
}

/// Format a sync report for display.
#[must_use]
pub fn format_sync_report(report: &SyncReport) -> String {
    let mut lines = Vec::new();

    lines.push(format!("Sync completed: {} records", report.total()));
    lines.push("─".repeat(40));

    if report.submitted > 0 {
        lines.push(format!(
            "  {} {}",
            "✓".green(),
            format!("{} submitted", report.submitted).green()
        ));
    }

    if report.would_submit > 0 {
        lines.push(format!(
            "  {} {}",
            "○".cyan(),
            format!("{} would be submitted (dry run)", report.would_submit).cyan()
        ));
    }

    if report.failed > 0 {
        lines.push(format!(
            "  {} {}",
            "✗".red(),
            format!("{} failed", report.failed).red()
        ));
    }

    if report.deferred > 0 {
        lines.push(format!(
            "  {} {}",
            "○".yellow(),
            format!("{} waiting for retry", report.deferred).yellow()
        ));
    }

    if report.exhausted > 0 {
        lines.push(format!(
            "  {} {}",
            "!".red().bold(),
            format!("{} out of attempts (use 'steward queue retry')", report.exhausted).red()
        ));
    }

    if report.cleared > 0 {
        lines.push(format!("  {}", format!("{} synced records cleared", report.cleared).dimmed()));
    }

    if let Some(reason) = &report.aborted {
        lines.push(String::new());
        lines.push(format!("{} {}", "Stopped:".red().bold(), reason));
        lines.push("Run 'steward session login' and sync again.".dimmed().to_string());
    }

    let errors: Vec<_> = report
        .results
        .iter()
        .filter(|r| r.error.is_some())
        .take(3)
        .collect();

    if !errors.is_empty() {
        lines.push(String::new());
        lines.push("Errors:".to_string());
        for err in errors {
            lines.push(format!(
                "  - {} #{}: {}",
                err.queue,
                err.id,
                err.error.as_deref().unwrap_or("Unknown error")
            ));
        }
    }

    lines.join("\n")
}
