//! Online command - download the packages a device needs for a target build.

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;
use wpup_pm::http::HttpClient;
use wpup_pm::{
    package_dir, DownloadTarget, FetchedPackage, Fetcher, HttpTransport, Inventory, ManifestStore,
    Matcher, OnlineSession, Transport, TransportMode, UpdaterConfig, WgetTransport,
};

use crate::output::Output;
use crate::progress::{format_bytes, FetchProgress};
use crate::prompt::ConsoleOperator;

#[derive(Args, Debug)]
pub struct OnlineArgs {
    /// Target build; selects the manifest `<build>.txt`
    #[arg(long, value_name = "BUILD")]
    pub build: String,

    /// Device serial; packages are saved to `<out>/<serial>/Packages`
    #[arg(long)]
    pub serial: String,

    /// Output root directory
    #[arg(short = 'o', long, default_value = ".")]
    pub out: PathBuf,

    /// Installed package export (overrides the configured path)
    #[arg(long, value_name = "FILE")]
    pub inventory: Option<PathBuf>,

    /// Download backend
    #[arg(long, value_enum, default_value_t = TransportChoice::Auto)]
    pub transport: TransportChoice,

    /// Download without asking for confirmation
    #[arg(short = 'y', long)]
    pub yes: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportChoice {
    /// Helper for the configured helper builds, built-in client otherwise
    Auto,
    Helper,
    Http,
}

impl TransportChoice {
    pub fn resolve(self, build: &str, helper_builds: &[String]) -> TransportMode {
        match self {
            TransportChoice::Auto => TransportMode::for_build(build, helper_builds),
            TransportChoice::Helper => TransportMode::Helper,
            TransportChoice::Http => TransportMode::Http,
        }
    }
}

pub async fn execute(args: OnlineArgs, config: &UpdaterConfig, output: &Output) -> Result<i32> {
    let inventory_path = args.inventory.as_ref().unwrap_or(&config.inventory.path);
    let inventory = Inventory::load(inventory_path, config.inventory.key_field)
        .context("Failed to read the installed package inventory")?;
    output.verbose(&format!("{} installed components", inventory.len()));

    let store = ManifestStore::new(&config.manifest.dir);
    let matcher = Matcher::new(config.selection.clone());
    let session = OnlineSession::new(&matcher, &inventory);
    let mut operator = ConsoleOperator::new(output.clone(), std::io::stdin().is_terminal(), args.yes);

    let Some(outcome) = session.run(|| store.load(&args.build), &mut operator)? else {
        output.warning("Nothing selected, no packages were downloaded");
        return Ok(1);
    };

    let dest = package_dir(&args.out, &args.serial);
    let targets = DownloadTarget::from_selection(&outcome.selection, &dest)?;
    for target in &targets {
        output.verbose(&format!("  {}", target.url));
    }

    let mode = args.transport.resolve(&args.build, &config.download.helper_builds);
    log::info!("Downloading {} packages with {:?} transport", targets.len(), mode);
    output.info(&format!(
        "Downloading {} packages to {}",
        targets.len(),
        dest.display()
    ));

    let retry_delay = config.download.retry_delay();
    let fetched = match mode {
        TransportMode::Helper => {
            let progress = FetchProgress::new(output.clone(), false);
            let transport = WgetTransport::new(&config.download.helper);
            fetch_with(transport, &targets, retry_delay, &progress).await?
        }
        TransportMode::Http => {
            let progress = FetchProgress::new(output.clone(), output.is_term());
            let client = HttpClient::with_config(config.download.http_client_config())
                .context("Failed to create HTTP client")?;
            fetch_with(HttpTransport::new(client), &targets, retry_delay, &progress).await?
        }
    };

    let total: u64 = fetched.iter().map(|f| f.expected_len).sum();
    output.success(&format!(
        "Downloaded {} packages ({})",
        fetched.len(),
        format_bytes(total)
    ));
    Ok(0)
}

async fn fetch_with<T: Transport>(
    transport: T,
    targets: &[DownloadTarget],
    retry_delay: Duration,
    progress: &FetchProgress,
) -> wpup_pm::Result<Vec<FetchedPackage>> {
    Fetcher::new(transport)
        .with_retry_delay(retry_delay)
        .fetch(targets, progress)
        .await
}
