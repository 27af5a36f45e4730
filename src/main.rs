// src/main.rs
//! solana-pulse command-line front end

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use log::{error, info, warn};

use solana_pulse::analytics::AnalyticsEngine;
use solana_pulse::monitoring::report::{render_history, render_snapshot};
use solana_pulse::{
    LedgerDataSource, MonitorEvent, NetworkSnapshot, PulseConfig, PulseResult,
    RpcDataSource, SnapshotMonitor,
};

/// Sample recent Solana network activity and flag anomalies
#[derive(Parser, Debug)]
#[command(name = "solana-pulse", version, about)]
struct Args {
    /// JSON-RPC endpoint (overrides config file and SOLANA_RPC_URL)
    #[arg(long, global = true)]
    rpc_url: Option<String>,

    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit JSON instead of text reports
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Take a single snapshot
    Snapshot {
        /// Number of recent blocks to sample
        #[arg(long)]
        window: Option<usize>,
    },

    /// Take snapshots on a fixed interval until interrupted
    Watch {
        /// Number of recent blocks to sample
        #[arg(long)]
        window: Option<usize>,

        /// Seconds between snapshots
        #[arg(long)]
        interval: Option<u64>,
    },

    /// Show recent transactions touching a program or account
    History {
        /// Program or account identifier
        identifier: String,

        /// Maximum number of transactions
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run(Args::parse()).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> PulseResult<()> {
    let mut config = match &args.config {
        Some(path) => PulseConfig::from_file(path)?,
        None => PulseConfig::default(),
    };
    config.apply_env()?;
    if let Some(url) = &args.rpc_url {
        config.rpc_url = url.clone();
    }
    match &args.command {
        Command::Snapshot { window: Some(window) } => config.block_window = *window,
        Command::Watch { window, interval } => {
            if let Some(window) = window {
                config.block_window = *window;
            }
            if let Some(interval) = interval {
                config.poll_interval_secs = *interval;
            }
        }
        _ => {}
    }
    config.validate()?;

    let source = RpcDataSource::new(config.rpc_config())?;
    info!("Using RPC endpoint {}", source.url());

    match args.command {
        Command::Snapshot { .. } => {
            let mut engine = AnalyticsEngine::with_config(source, config.engine.clone());
            let snapshot = engine.take_snapshot(config.block_window).await?;
            print_snapshot(&snapshot, args.json)
        }
        Command::Watch { .. } => watch(source, &config, args.json).await,
        Command::History { identifier, limit } => {
            let records = source.fetch_transaction_history(&identifier, limit).await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else {
                print!("{}", render_history(&identifier, &records));
            }
            Ok(())
        }
    }
}

async fn watch(source: RpcDataSource, config: &PulseConfig, json: bool) -> PulseResult<()> {
    let engine = AnalyticsEngine::with_config(source, config.engine.clone());
    let (monitor, mut events) = SnapshotMonitor::start(engine, config.monitor_config());
    info!(
        "Watching every {}s over {} blocks, press Ctrl-C to stop",
        config.poll_interval_secs, config.block_window
    );

    let mut outcome = Ok(());
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(MonitorEvent::Snapshot(snapshot)) => {
                    if let Err(e) = print_snapshot(&snapshot, json) {
                        outcome = Err(e);
                        break;
                    }
                }
                Some(MonitorEvent::Failed { error, .. }) => {
                    warn!("Snapshot failed, retrying on next tick: {}", error);
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping");
                break;
            }
        }
    }

    if let Some(engine) = monitor.stop().await {
        info!(
            "Stopped with {} snapshots retained, {} distinct programs seen",
            engine.history().len(),
            engine.known_program_count()
        );
    }
    outcome
}

fn print_snapshot(snapshot: &NetworkSnapshot, json: bool) -> PulseResult<()> {
    if json {
        println!("{}", serde_json::to_string(snapshot)?);
    } else {
        println!("{}", render_snapshot(snapshot));
    }
    Ok(())
}
