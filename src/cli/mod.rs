//! Command-line interface for steward.

pub mod args;
pub mod commands;
