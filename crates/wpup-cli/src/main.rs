mod inspect;
mod offline;
mod online;
mod output;
mod progress;
mod prompt;
mod summary;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use wpup_pm::UpdaterConfig;

use output::{Output, Verbosity};

#[derive(Parser, Debug)]
#[command(name = "wpup")]
#[command(about = "Select, inspect and fetch update packages for Windows Phone devices")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (default: wpup.toml in the working directory or a parent)
    #[arg(short = 'c', long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Only print warnings and errors
    #[arg(short = 'q', long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Download the packages a device needs for a target build
    Online(online::OnlineArgs),

    /// Copy matching packages from a local folder
    Offline(offline::OfflineArgs),

    /// Show the signer and build date of a package
    Inspect(inspect::InspectArgs),
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    // RUST_LOG still wins when set
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn load_config(path: Option<&Path>) -> Result<UpdaterConfig> {
    let mut config = match path {
        Some(path) => UpdaterConfig::load_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => {
            let cwd = std::env::current_dir().context("Failed to read working directory")?;
            UpdaterConfig::load(&cwd)?.unwrap_or_default()
        }
    };
    config.apply_env();
    Ok(config)
}

fn run() -> Result<i32> {
    let args = Args::parse();
    init_logging(args.verbose);

    let output = Output::new(Verbosity::from_flags(args.quiet, args.verbose));
    let config = load_config(args.config.as_deref())?;

    match args.command {
        Commands::Online(online_args) => {
            let rt = tokio::runtime::Runtime::new()
                .map_err(|e| anyhow::anyhow!("Failed to create async runtime: {}", e))?;
            rt.block_on(online::execute(online_args, &config, &output))
        }
        Commands::Offline(offline_args) => offline::execute(offline_args, &config, &output),
        Commands::Inspect(inspect_args) => inspect::execute(inspect_args, &config, &output),
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => ExitCode::from(code as u8),
        Err(e) => {
            eprintln!("Error: {}", e);
            for cause in e.chain().skip(1) {
                eprintln!("  Caused by: {}", cause);
            }
            ExitCode::FAILURE
        }
    }
}
