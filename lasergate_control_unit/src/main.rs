//! # LaserGate Control Unit
//!
//! Gates the firing line of a shared laser cutter on RFID badges and meters
//! each cut.
//!
//! Loads the TOML configuration, opens the controller link (serial tty or
//! the in-process simulator with `--simulate`), starts the background usage
//! reporter when `[reporting]` is configured, and enters the poll loop
//! until Ctrl-C. On shutdown the firing line is disabled and queued usage
//! reports are flushed for a bounded time.

use clap::Parser;
use lasergate_common::config::{ConfigLoader, LasergateConfig};
use lasergate_common::usage::{NullSink, UsageSink};
use lasergate_common::whitelist::{FileWhitelist, Whitelist};
use lasergate_control_unit::console;
use lasergate_control_unit::{AuthManager, Controller, ControllerParams, CycleRunner};
use lasergate_hal::{ResourceChannel, transports};
use lasergate_reporter::{ReportClient, UsageReporter};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;

/// Upper bound on delivering queued usage reports after the loop stops.
const REPORT_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// LaserGate Control Unit - RFID authorization and metering for a laser cutter
#[derive(Parser, Debug)]
#[command(name = "lasergate_control_unit")]
#[command(version)]
#[command(about = "RFID authorization and metering controller for a shared laser cutter")]
struct Args {
    /// Path to the LaserGate configuration TOML.
    #[arg(default_value = "config/lasergate.toml")]
    config: PathBuf,

    /// Run against the in-process simulated controller; commands are read
    /// from stdin (scan <badge> | beam on|off | advance <units> | show).
    #[arg(long)]
    simulate: bool,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();
    let config = LasergateConfig::load(&args.config);

    let level = match &config {
        Ok(config) => config.shared.log_level.into(),
        Err(_) => Level::INFO,
    };
    setup_tracing(&args, level);

    info!("LaserGate Control Unit v{} starting...", env!("CARGO_PKG_VERSION"));

    let result = match config {
        Ok(config) => run(&args, config),
        Err(e) => Err(format!("cannot load {}: {e}", args.config.display()).into()),
    };
    if let Err(e) = result {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("LaserGate Control Unit shutdown complete");
}

fn run(args: &Args, config: LasergateConfig) -> Result<(), Box<dyn std::error::Error>> {
    config.validate()?;
    info!(
        "Config OK: service={}, poll={}ms, activity_timeout={}s, debounce={}ms, price={:.2}/min",
        config.shared.service_name,
        config.controller.poll_interval_ms,
        config.controller.activity_timeout_s,
        config.controller.debounce_ms,
        config.controller.unit_price,
    );

    // Reporting runs on its own small runtime; the poll loop stays synchronous.
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("lasergate-report")
        .enable_all()
        .build()?;

    let (sink, reporter_task) = match &config.reporting {
        Some(reporting) => {
            let client = Arc::new(ReportClient::new(reporting.clone())?);
            let (reporter, sender) = UsageReporter::new(client, reporting.queue_capacity);
            let task = runtime.spawn(reporter.run());
            info!(
                "Reporting usage as '{}' (queue capacity {})",
                reporting.asset_id, reporting.queue_capacity
            );
            let sink: Arc<dyn UsageSink> = Arc::new(sender);
            (sink, Some(task))
        }
        None => {
            info!("No [reporting] section, usage reports are discarded");
            let sink: Arc<dyn UsageSink> = Arc::new(NullSink);
            (sink, None)
        }
    };

    let (transport, simulator) = transports::open(&config.device, args.simulate)?;
    if let Some(handle) = simulator {
        std::thread::Builder::new()
            .name("sim-console".to_string())
            .spawn(move || console::run(std::io::stdin().lock(), &handle))?;
        info!("Simulator console on stdin: scan <badge> | beam on|off | advance <units> | show");
    }

    let channel = ResourceChannel::new(transport);
    let auth = AuthManager::new(Whitelist::new(), Arc::clone(&sink));
    let controller = Controller::new(
        channel,
        auth,
        ControllerParams::from(&config.controller),
        sink,
    );
    let whitelist = Box::new(FileWhitelist::new(&config.whitelist.path));

    // Setup signal handler for graceful shutdown.
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    })?;

    let mut runner = CycleRunner::new(controller, whitelist, &config, running);
    let outcome = runner.run();
    let stats = runner.stats().clone();
    // Dropping the runner drops the last report sender and lets the
    // reporter drain its queue.
    drop(runner);

    info!(
        "Cycle stats: ticks={} avg={}µs max={}µs overruns={}",
        stats.tick_count,
        stats.avg_tick_ns() / 1000,
        stats.max_tick_ns / 1000,
        stats.overruns
    );

    if let Some(task) = reporter_task {
        match runtime.block_on(tokio::time::timeout(REPORT_FLUSH_TIMEOUT, task)) {
            Ok(Ok(())) => info!("Usage reports flushed"),
            Ok(Err(e)) => warn!("Usage reporter ended abnormally: {e}"),
            Err(_) => warn!(
                "Usage report flush timed out after {:?}, remaining reports dropped",
                REPORT_FLUSH_TIMEOUT
            ),
        }
    }
    runtime.shutdown_background();

    outcome?;
    Ok(())
}

fn setup_tracing(args: &Args, configured: Level) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        configured
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
