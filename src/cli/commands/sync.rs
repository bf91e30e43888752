//! Sync command implementation.

use std::time::Duration;

use chrono::Utc;

use super::Context;
use crate::cli::args::{OutputFormat, SyncCommands};
use crate::error::StewardError;
use crate::output::to_json;
use crate::remote::ApiClient;
use crate::session::{Session, UserDataStore};
use crate::sync::{format_sync_report, RunnerConfig, SyncReport, SyncRunner};

/// Execute sync subcommands.
pub fn sync(ctx: &Context, cmd: SyncCommands) -> Result<String, StewardError> {
    match cmd {
        SyncCommands::Run {
            dry_run,
            watch,
            keep_synced,
        } => run_sync(ctx, dry_run, watch, keep_synced),
    }
}

fn run_sync(
    ctx: &Context,
    dry_run: bool,
    watch: bool,
    keep_synced: bool,
) -> Result<String, StewardError> {
    let store = UserDataStore::new(&ctx.db);
    let mut session = Session::load(&store)?;
    let client = ApiClient::new(&ctx.config.remote, &session)?;

    let config = RunnerConfig {
        policy: ctx.config.sync.retry_policy(),
        dry_run,
        clear_after_sync: ctx.config.sync.clear_after_sync && !keep_synced,
    };
    let runner = SyncRunner::with_config(&ctx.db, &client, config);

    let mut report = runner.run()?;

    if watch && !dry_run {
        while report.aborted.is_none() {
            let now = Utc::now();
            let Some(due) = runner.next_due(now)? else {
                break;
            };

            if ctx.format == OutputFormat::Pretty {
                eprintln!("{}\n", format_sync_report(&report));
            }

            let wait = (due - now)
                .to_std()
                .unwrap_or_default()
                .max(Duration::from_secs(1));
            tracing::info!(wait_secs = wait.as_secs(), "waiting for next retry");
            std::thread::sleep(wait);

            report = runner.run()?;
        }
    }

    if report.aborted.is_some() {
        session.logout(&store)?;
    }

    render(&report, ctx.format)
}

fn render(report: &SyncReport, format: OutputFormat) -> Result<String, StewardError> {
    match format {
        OutputFormat::Json => to_json(report),
        OutputFormat::Pretty => {
            if report.total() == 0 && report.aborted.is_none() {
                Ok("No pending records to sync.".to_string())
            } else {
                Ok(format_sync_report(report))
            }
        },
    }
}
