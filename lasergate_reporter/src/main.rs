//! # LaserGate Whitelist Sync
//!
//! Downloads the credential whitelist from `reporting.whitelist_url` and
//! replaces the local cache the control unit reloads on its own cadence.
//! Intended to run from cron or a systemd timer.

use clap::Parser;
use lasergate_common::config::{ConfigLoader, LasergateConfig};
use lasergate_reporter::ReportClient;
use lasergate_reporter::sync::sync_whitelist;
use std::path::PathBuf;
use std::process;
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;

/// LaserGate Whitelist Sync - refresh the local credential cache
#[derive(Parser, Debug)]
#[command(name = "lasergate_whitelist_sync")]
#[command(version)]
#[command(about = "Download the credential whitelist into the local cache file")]
struct Args {
    /// Path to the LaserGate configuration TOML.
    #[arg(default_value = "config/lasergate.toml")]
    config: PathBuf,

    /// Cache file to write (default: whitelist.path from the config).
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();
    setup_tracing(&args);

    if let Err(e) = run(&args).await {
        error!("FATAL: {e}");
        process::exit(1);
    }
}

async fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = LasergateConfig::load(&args.config)
        .map_err(|e| format!("cannot load {}: {e}", args.config.display()))?;
    config.validate()?;

    let reporting = config
        .reporting
        .ok_or("no [reporting] section in the configuration")?;
    if reporting.whitelist_url.is_none() {
        return Err("reporting.whitelist_url is not configured".into());
    }

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| config.whitelist.path.clone());
    info!(
        "Syncing whitelist for '{}' into {}",
        reporting.asset_id,
        output.display()
    );

    let client = ReportClient::new(reporting)?;
    let count = sync_whitelist(&client, &output).await?;
    info!("Wrote {count} credentials to {}", output.display());
    Ok(())
}

fn setup_tracing(args: &Args) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
