//! Config command implementation.

use serde_json::json;

use crate::cli::args::{ConfigCommands, OutputFormat};
use crate::config::{Config, Paths};
use crate::error::StewardError;
use crate::output::to_json;

/// Execute config subcommands. Does not touch the database.
///
/// # Errors
///
/// Returns `Config` if the config file cannot be written or already exists
/// and `--force` was not given.
pub fn config(
    paths: &Paths,
    config: &Config,
    cmd: ConfigCommands,
    format: OutputFormat,
) -> Result<String, StewardError> {
    match cmd {
        ConfigCommands::Show => match format {
            OutputFormat::Json => to_json(config),
            OutputFormat::Pretty => config.to_yaml(),
        },
        ConfigCommands::Path => match format {
            OutputFormat::Json => to_json(&json!({
                "root": paths.root,
                "config_file": paths.config_file,
                "database": paths.database,
            })),
            OutputFormat::Pretty => Ok(format!(
                "Data:     {}\nConfig:   {}\nDatabase: {}",
                paths.root.display(),
                paths.config_file.display(),
                paths.database.display()
            )),
        },
        ConfigCommands::Init { force } => {
            if paths.config_file.exists() && !force {
                return Err(StewardError::Config(format!(
                    "{} already exists (use --force to overwrite)",
                    paths.config_file.display()
                )));
            }
            paths.ensure_dirs()?;
            Config::default().save_to_path(&paths.config_file)?;
            tracing::info!(path = %paths.config_file.display(), "wrote default config");

            match format {
                OutputFormat::Json => to_json(&json!({"config_file": paths.config_file})),
                OutputFormat::Pretty => {
                    Ok(format!("Wrote {}", paths.config_file.display()))
                },
            }
        },
    }
}
