use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use serde::{Deserialize, Serialize};

use crate::queue::QueueName;

#[derive(Parser)]
#[command(name = "steward")]
#[command(about = "Offline write queue and reference cache for retail field operations")]
#[command(long_about = "steward - offline store for field-operations apps

Buffers inventory entries, sales entries and tub receipts that could not be
submitted to the API, caches the flavor catalog for offline use, and
submits queued records once the API is reachable again.

QUICK START:
  steward queue add sales '{\"date\": \"2024-06-01\", \"total\": 310}'
  steward queue status          Show unsynced counts
  steward sync run              Submit pending records
  steward cache show flavors    Show the cached flavor catalog

OUTPUT FORMATS:
  --output pretty    Human-readable colored output (default)
  --output json      Machine-readable JSON for scripting")]
#[command(version, propagate_version = true)]
pub struct Cli {
    /// Output format for command results
    #[arg(short, long, value_enum, global = true)]
    pub output: Option<OutputFormat>,

    /// Data directory (defaults to ~/.steward)
    #[arg(long, env = "STEWARD_HOME", global = true)]
    pub home: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for command results.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable colored output.
    #[default]
    Pretty,
    /// Machine-readable JSON output.
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage the offline write queues
    ///
    /// # Examples
    ///
    ///   steward queue add inventory payload.json
    ///   steward queue list sales
    ///   steward queue mark-synced sales 1 2
    ///   steward queue clear-synced sales
    #[command(alias = "q")]
    Queue(QueueArgs),

    /// Manage cached reference lists
    Cache(CacheArgs),

    /// Log in, log out, or show the current session
    Session(SessionArgs),

    /// Submit queued records to the API
    Sync(SyncArgs),

    /// Show configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
pub struct QueueArgs {
    #[command(subcommand)]
    pub command: QueueCommands,
}

/// Queue subcommands.
#[derive(Subcommand)]
pub enum QueueCommands {
    /// Queue a payload
    ///
    /// PAYLOAD is inline JSON, a path to a JSON file, or '-' for stdin.
    Add {
        /// Queue name (inventory, sales, receipts)
        queue: QueueName,
        /// JSON payload, file path, or '-'
        #[arg(default_value = "-")]
        payload: String,
    },

    /// List unsynced records
    List {
        /// Queue name (inventory, sales, receipts)
        queue: QueueName,
        /// Show every record for this date instead, synced or not
        #[arg(long, short = 'd')]
        date: Option<String>,
    },

    /// Show one record with its payload
    Show {
        /// Queue name
        queue: QueueName,
        /// Record id
        id: i64,
    },

    /// Mark records as synced
    MarkSynced {
        /// Queue name
        queue: QueueName,
        /// Record ids
        #[arg(required = true)]
        ids: Vec<i64>,
    },

    /// Delete synced records
    ClearSynced {
        /// Queue name; all queues when omitted
        queue: Option<QueueName>,
    },

    /// Show unsynced counts for every queue
    Status,

    /// Reset attempt counters so records are retried immediately
    Retry {
        /// Queue name
        queue: QueueName,
        /// Only this record
        #[arg(long)]
        id: Option<i64>,
    },

    /// Delete every record in a queue, synced or not
    Purge {
        /// Queue name
        queue: QueueName,
        /// Required confirmation
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheCommands,
}

/// Cache subcommands.
#[derive(Subcommand)]
pub enum CacheCommands {
    /// Replace a list with a JSON array
    Set {
        /// List name (e.g. flavors)
        list: String,
        /// JSON array, file path, or '-'
        #[arg(default_value = "-")]
        items: String,
    },

    /// Show a cached list
    Show {
        /// List name
        #[arg(default_value = crate::cache::FLAVORS)]
        list: String,
    },

    /// Fetch the flavor catalog from the API and cache it
    Refresh,
}

#[derive(Args)]
pub struct SessionArgs {
    #[command(subcommand)]
    pub command: SessionCommands,
}

/// Session subcommands.
#[derive(Subcommand)]
pub enum SessionCommands {
    /// Log in to the API
    Login {
        /// Username
        #[arg(long, short = 'u')]
        username: String,
        /// Password
        #[arg(long, short = 'p', env = "STEWARD_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Log out and clear local user data
    Logout,

    /// Show the current session
    Show,
}

#[derive(Args)]
pub struct SyncArgs {
    #[command(subcommand)]
    pub command: SyncCommands,
}

/// Sync subcommands.
#[derive(Subcommand)]
pub enum SyncCommands {
    /// Submit pending records
    Run {
        /// Show what would be submitted
        #[arg(long)]
        dry_run: bool,

        /// Keep retrying until every record is synced or out of attempts
        #[arg(long)]
        watch: bool,

        /// Keep synced records instead of clearing them
        #[arg(long)]
        keep_synced: bool,
    },
}

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Print the data directory, config file and database paths
    Path,
    /// Write a default config file
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
}
