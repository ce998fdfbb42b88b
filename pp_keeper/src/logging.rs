//! Structured logging configuration.
//!
//! The engine logs through the `log` facade; the subscriber installed here
//! forwards those records alongside the keeper's own `tracing` events.

use peek_poker::{GameError, GameId};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured logging
///
/// Log levels are configurable via the RUST_LOG env var (default `info`).
pub fn init() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log a deadline transition the keeper performed
pub fn log_transition(game_id: GameId, transition: &str) {
    tracing::info!(game_id = game_id, transition = transition, "Keeper transition");
}

/// Log a transition the keeper attempted and the game refused
pub fn log_transition_failure(game_id: GameId, transition: &str, error: &GameError) {
    tracing::warn!(
        game_id = game_id,
        transition = transition,
        error_kind = ?error.kind(),
        "Keeper transition failed: {}",
        error
    );
}
