//! Sync pass for the offline queues.
//!
//! Features:
//! - Pluggable [`Submitter`] destination (the HTTP client in production)
//! - Capped exponential backoff per record
//! - Max-attempts cap with manual reset
//! - Optional sweep of synced records after each pass

mod policy;
mod runner;

pub use policy::RetryPolicy;
pub use runner::{
    format_sync_report, Outcome, RecordResult, RunnerConfig, Submitter, SyncReport, SyncRunner,
};
