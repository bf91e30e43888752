//! Offline write queues.
//!
//! Records that could not be submitted to the API are buffered here, one
//! independent queue per purpose (inventory, sales, tub receipts), until the
//! caller confirms them with [`OfflineQueue::mark_synced`].

mod record;
mod store;

pub use record::{entry_date, QueueName, QueueRecord, SyncState};
pub use store::{OfflineQueue, PendingCounts};
