//! crier-send - Background daemon for scheduled publishing
//!
//! Polls the schedule queue at a fixed interval and publishes due posts
//! through the configured provider, recording the outcome on each
//! schedule.

use clap::Parser;
use libcrier::{Config, Database, Publisher, Result, Scheduler};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "crier-send")]
#[command(version)]
#[command(about = "Background daemon for scheduled publishing")]
#[command(long_about = "\
crier-send - Background daemon for scheduled publishing

DESCRIPTION:
    crier-send is a long-running daemon that watches the crier schedule
    queue and publishes due posts automatically.

    It polls the database at a fixed interval, claims a bounded batch of
    due schedules, publishes each one through the configured provider,
    and records success or failure on the schedule. A schedule that
    fails stays failed; inspect it with 'crier-queue show'.

USAGE:
    # Run in foreground (logs to stderr)
    crier-send

    # Run with a custom poll interval
    crier-send --poll-interval 30

    # Process due schedules once and exit
    crier-send --once

SIGNALS:
    SIGTERM, SIGINT - Graceful shutdown (finishes the current batch)

CONFIGURATION:
    Configuration file: ~/.config/crier/config.toml (override: CRIER_CONFIG)

    [publisher]
    provider = \"stub\"        # delivery backend

    [scheduler]
    interval_seconds = 5     # seconds between polls
    batch_limit = 10         # max schedules claimed per poll

EXIT CODES:
    0 - Clean shutdown
    1 - Runtime or configuration error
    3 - Invalid input
")]
struct Cli {
    /// Poll interval in seconds (overrides config)
    #[arg(long, value_name = "SECONDS")]
    #[arg(help = "How often to check for due schedules (default: from config)")]
    poll_interval: Option<u64>,

    /// Enable verbose logging to stderr
    #[arg(short, long)]
    #[arg(help = "Enable verbose logging (useful for debugging)")]
    verbose: bool,

    /// Process due schedules once and exit
    #[arg(long)]
    #[arg(help = "Run a single scheduler iteration and exit")]
    once: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    libcrier::logging::init_daemon(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load()?;
    if let Some(seconds) = cli.poll_interval {
        if seconds == 0 {
            return Err(libcrier::CrierError::InvalidInput(
                "Poll interval must be greater than zero".to_string(),
            ));
        }
        config.scheduler.interval_seconds = seconds;
    }

    let db = Database::new(&config.database.path).await?;
    let publisher = Publisher::from_config(&config, db.clone());
    let mut scheduler = Scheduler::new(db, publisher, &config.scheduler);

    info!("crier-send daemon starting");

    if cli.once {
        let processed = scheduler.run_once().await?;
        info!("processed {} due schedule(s), exiting", processed);
        return Ok(());
    }

    info!(
        "poll interval: {}s, batch limit: {}",
        config.scheduler.interval_seconds, config.scheduler.batch_limit
    );

    scheduler.start();
    wait_for_shutdown().await;
    info!("shutdown requested, stopping scheduler");
    scheduler.stop().await;

    info!("crier-send daemon stopped");
    Ok(())
}

/// Block until SIGINT or SIGTERM arrives
#[cfg(unix)]
async fn wait_for_shutdown() {
    use futures::stream::StreamExt;
    use signal_hook::consts::{SIGINT, SIGTERM};

    match signal_hook_tokio::Signals::new([SIGINT, SIGTERM]) {
        Ok(mut signals) => {
            signals.next().await;
        }
        Err(e) => {
            // Without signal delivery the daemon can still be stopped by
            // killing the process; fall back to ctrl-c handling.
            tracing::warn!("failed to install signal handlers: {}", e);
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown() {
    let _ = tokio::signal::ctrl_c().await;
}
