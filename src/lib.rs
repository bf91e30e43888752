//! steward - offline store for retail field operations
//!
//! This crate buffers writes that could not reach the REST API (inventory
//! entries, sales entries, tub receipts) in a local SQLite database, keeps an
//! offline copy of reference lists such as the flavor catalog, and submits
//! queued records once the API is reachable again.

#![deny(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod queue;
pub mod remote;
pub mod session;
pub mod storage;
pub mod sync;

pub use cache::ReferenceCache;
pub use cli::args::{Cli, Commands, OutputFormat};
pub use error::StewardError;
pub use queue::{OfflineQueue, PendingCounts, QueueName, QueueRecord, SyncState};
pub use remote::ApiClient;
pub use session::{Session, UserDataStore};
pub use storage::Database;
pub use sync::{RetryPolicy, Submitter, SyncReport, SyncRunner};
