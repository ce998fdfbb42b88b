//! Deadline keeper for peek poker games.
//!
//! Hosts a game registry, advances games whose deadlines have passed, and
//! can run self-playing tables so there is always something to advance.

mod config;
mod keeper;
mod logging;
mod simulate;
mod sink;

use std::{fs::OpenOptions, path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Error};
use ctrlc::set_handler;
use log::info;
use peek_poker::{
    EntropySource, GameRegistry, LogSink, NotificationSink, OsEntropy, SeededEntropy, SystemClock,
};
use pico_args::Arguments;
use tokio::sync::watch;

use config::{KeeperConfig, Overrides};
use keeper::Keeper;
use simulate::Simulator;
use sink::JsonLinesSink;

const HELP: &str = "\
Run the peek poker deadline keeper

USAGE:
  pp_keeper [OPTIONS]

OPTIONS:
  --keeper       ID      Identity the keeper acts as     [default: env KEEPER_ID or keeper]
  --interval-ms  MS      Milliseconds between sweeps     [default: env SWEEP_INTERVAL_MS or 1000]
  --simulate     N       Self-playing tables to run      [default: env SIMULATE_GAMES or 0]
  --events       PATH    Append notifications as JSON    [default: env EVENTS_FILE, else log them]
  --seed         N       Fixed entropy seed              [default: env ENTROPY_SEED, else OS entropy]

FLAGS:
  --private-events       Also write private notifications to the events file
  -h, --help             Print help information

ENVIRONMENT:
  INITIAL_CHIPS, PEEK_FEE, SWAP_FEE, MINIMUM_BET,
  MIN_PLAYERS, MAX_PLAYERS, PEEK_DURATION_SECS,
  BETTING_DURATION_SECS, INBOX_CAPACITY
  (A .env file in the working directory is read first)
";

/// How often simulated players poll their game.
const SIMULATION_POLL: Duration = Duration::from_millis(100);

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let private_events = pargs.contains("--private-events");
    let overrides = Overrides {
        keeper: pargs.opt_value_from_str("--keeper")?,
        sweep_interval_ms: pargs.opt_value_from_str("--interval-ms")?,
        simulate_games: pargs.opt_value_from_str("--simulate")?,
        events_file: pargs.opt_value_from_str::<_, PathBuf>("--events")?,
        entropy_seed: pargs.opt_value_from_str("--seed")?,
    };

    let config = KeeperConfig::from_env(overrides)?;
    config.validate()?;

    logging::init();
    info!(
        "Starting keeper {} (sweep every {}ms)",
        config.keeper, config.sweep_interval_ms
    );

    let sink: Arc<dyn NotificationSink> = match &config.events_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open events file {}", path.display()))?;
            info!("Writing notifications to {}", path.display());
            Arc::new(JsonLinesSink::new(file).with_private(private_events))
        }
        None => Arc::new(LogSink),
    };

    let entropy: Arc<dyn EntropySource> = match config.entropy_seed {
        Some(seed) => {
            log::warn!("Using fixed entropy seed {}; shuffles are reproducible", seed);
            Arc::new(SeededEntropy::new(seed))
        }
        None => Arc::new(OsEntropy),
    };

    let registry = Arc::new(
        GameRegistry::new(config.registry_config())?
            .with_entropy(entropy)
            .with_sink(sink),
    );

    // Catching signals for a clean stop.
    let (stop, shutdown) = watch::channel(false);
    set_handler(move || {
        let _ = stop.send(true);
    })?;

    let tables = Simulator::new(registry.clone(), SIMULATION_POLL)
        .spawn(config.simulate_games, &shutdown);
    if !tables.is_empty() {
        info!("Running {} simulated table(s)", tables.len());
    }

    let keeper = Keeper::new(
        registry.clone(),
        Arc::new(SystemClock),
        Duration::from_millis(config.sweep_interval_ms),
    );
    keeper.run(shutdown).await;

    for table in tables {
        if let Err(e) = table.await {
            log::error!("Simulated table task failed: {}", e);
        }
    }

    registry
        .check_invariants()
        .await
        .context("Registry invariants broken at shutdown")?;

    info!("Keeper shut down");

    Ok(())
}
