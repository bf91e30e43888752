//! Configuration management for steward.
//!
//! This module handles path resolution and loading `config.yaml`.

mod paths;
mod settings;

pub use paths::{Paths, HOME_ENV};
pub use settings::{ColorSetting, Config, GeneralConfig, RemoteConfig, SyncConfig};
