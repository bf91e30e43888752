//! Storage layer for steward.
//!
//! This module provides SQLite-based persistence for:
//! - The offline write queues (inventory, sales, tub receipts)
//! - Reference list snapshots (flavor catalog)
//! - User data (session)

mod database;
mod migrations;

pub use database::Database;
