//! # TANWA Control Unit
//!
//! Loads the station configuration, creates the board through the driver
//! registry and runs the station until SIGINT/SIGTERM.

use clap::Parser;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;
use tanwa_common::config::LogLevel;
use tanwa_common::consts::DEFAULT_CONFIG_PATH;
use tanwa_control::config::TanwaConfig;
use tanwa_control::station::Station;
use tanwa_hal::DriverRegistry;
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;

/// TANWA Control Unit: launch sequencing and ground telemetry
#[derive(Parser, Debug)]
#[command(name = "tanwa")]
#[command(version)]
#[command(about = "Ground/flight support control unit for a liquid-fuel rocket")]
struct Args {
    /// Path to the station configuration TOML.
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Board driver name (see --list-boards).
    #[arg(short, long, default_value = "simulation")]
    board: String,

    /// List registered board drivers and exit.
    #[arg(long)]
    list_boards: bool,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();

    let config = match TanwaConfig::load_validated(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("tanwa: {}: {e}", args.config.display());
            process::exit(2);
        }
    };
    setup_tracing(&args, config.shared.log_level);

    info!("TANWA v{} starting...", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&args, &config) {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("TANWA shutdown complete");
}

fn run(args: &Args, config: &TanwaConfig) -> Result<(), Box<dyn std::error::Error>> {
    let registry = DriverRegistry::with_builtin();
    if args.list_boards {
        for name in registry.list_boards() {
            println!("{name}");
        }
        return Ok(());
    }

    let board = registry.create_board(&args.board)?;
    info!(board = board.name, service = %config.shared.service_name, "board ready");

    let station = Station::start(config, board)?;

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    while running.load(Ordering::SeqCst) {
        thread::sleep(Duration::from_millis(100));
    }
    info!("Received shutdown signal");

    station.shutdown();
    Ok(())
}

fn setup_tracing(args: &Args, configured: LogLevel) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        configured.into()
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("tanwa={level},tanwa_control={level}")));

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_thread_names(true)
            .compact()
            .init();
    }
}
