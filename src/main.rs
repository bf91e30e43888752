use anyhow::{Context as _, Result};
use clap::{CommandFactory, Parser};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use steward::cli::args::{Cli, Commands};
use steward::cli::commands::{self, Context};
use steward::config::{ColorSetting, Config, Paths};

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {:#}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool, default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "debug" } else { default_level })
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Completions { shell } = cli.command {
        clap_complete::generate(shell, &mut Cli::command(), "steward", &mut std::io::stdout());
        return Ok(());
    }

    let paths = Paths::resolve(cli.home).context("resolving data directory")?;
    let config = Config::load_from_path(&paths.config_file).context("loading configuration")?;

    init_tracing(cli.verbose, &config.general.log_level);

    match config.general.color {
        ColorSetting::Always => colored::control::set_override(true),
        ColorSetting::Never => colored::control::set_override(false),
        ColorSetting::Auto => {},
    }

    let format = cli.output.unwrap_or(config.general.default_output);
    tracing::debug!(root = %paths.root.display(), "using data directory");

    let output = match cli.command {
        Commands::Config(args) => commands::config(&paths, &config, args.command, format)?,
        Commands::Completions { .. } => String::new(),
        command => {
            let ctx = Context::open(paths, config, format).context("opening local store")?;
            match command {
                Commands::Queue(args) => commands::queue(&ctx, args.command)?,
                Commands::Cache(args) => commands::cache(&ctx, args.command)?,
                Commands::Session(args) => commands::session(&ctx, args.command)?,
                Commands::Sync(args) => commands::sync(&ctx, args.command)?,
                Commands::Config(_) | Commands::Completions { .. } => String::new(),
            }
        },
    };

    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}
