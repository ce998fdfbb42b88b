//! Keeper configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use peek_poker::{GameRules, PlayerId, RegistryConfig, registry::DEFAULT_INBOX_CAPACITY};
use std::path::PathBuf;

/// Complete keeper configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct KeeperConfig {
    /// Identity the keeper acts as
    pub keeper: PlayerId,
    /// Milliseconds between deadline sweeps
    pub sweep_interval_ms: u64,
    /// Rules for every game
    pub rules: GameRules,
    /// Game actor inbox capacity
    pub inbox_capacity: usize,
    /// Number of self-playing games to run (0 disables simulation)
    pub simulate_games: usize,
    /// Where to append notifications as JSON lines (logged if unset)
    pub events_file: Option<PathBuf>,
    /// Fixed entropy seed for reproducible runs
    pub entropy_seed: Option<u64>,
}

/// Values given on the command line, which win over the environment
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub keeper: Option<String>,
    pub sweep_interval_ms: Option<u64>,
    pub simulate_games: Option<usize>,
    pub events_file: Option<PathBuf>,
    pub entropy_seed: Option<u64>,
}

impl KeeperConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns error if a variable is present but can't be parsed
    pub fn from_env(overrides: Overrides) -> Result<Self, ConfigError> {
        Self::from_lookup(overrides, |key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source
    pub fn from_lookup<F>(overrides: Overrides, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let keeper = overrides
            .keeper
            .or_else(|| lookup("KEEPER_ID"))
            .unwrap_or_else(|| "keeper".to_string());

        let defaults = GameRules::default();
        let rules = GameRules {
            initial_chips: parse_var_or(&lookup, "INITIAL_CHIPS", defaults.initial_chips)?,
            peek_fee: parse_var_or(&lookup, "PEEK_FEE", defaults.peek_fee)?,
            swap_fee: parse_var_or(&lookup, "SWAP_FEE", defaults.swap_fee)?,
            minimum_bet: parse_var_or(&lookup, "MINIMUM_BET", defaults.minimum_bet)?,
            min_players: parse_var_or(&lookup, "MIN_PLAYERS", defaults.min_players)?,
            max_players: parse_var_or(&lookup, "MAX_PLAYERS", defaults.max_players)?,
            peek_duration_secs: parse_var_or(
                &lookup,
                "PEEK_DURATION_SECS",
                defaults.peek_duration_secs,
            )?,
            betting_duration_secs: parse_var_or(
                &lookup,
                "BETTING_DURATION_SECS",
                defaults.betting_duration_secs,
            )?,
        };

        let sweep_interval_ms = match overrides.sweep_interval_ms {
            Some(ms) => ms,
            None => parse_var_or(&lookup, "SWEEP_INTERVAL_MS", 1_000)?,
        };
        let simulate_games = match overrides.simulate_games {
            Some(n) => n,
            None => parse_var_or(&lookup, "SIMULATE_GAMES", 0)?,
        };
        let entropy_seed = match overrides.entropy_seed {
            Some(seed) => Some(seed),
            None => parse_var(&lookup, "ENTROPY_SEED")?,
        };

        Ok(KeeperConfig {
            keeper: PlayerId::from(keeper),
            sweep_interval_ms,
            rules,
            inbox_capacity: parse_var_or(&lookup, "INBOX_CAPACITY", DEFAULT_INBOX_CAPACITY)?,
            simulate_games,
            events_file: overrides
                .events_file
                .or_else(|| lookup("EVENTS_FILE").map(PathBuf::from)),
            entropy_seed,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.keeper.as_str().trim().is_empty() {
            return Err(ConfigError::Invalid {
                var: "KEEPER_ID".to_string(),
                reason: "Must not be empty".to_string(),
            });
        }

        if self.sweep_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                var: "SWEEP_INTERVAL_MS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.inbox_capacity == 0 {
            return Err(ConfigError::Invalid {
                var: "INBOX_CAPACITY".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        self.rules.validate().map_err(|reason| ConfigError::Invalid {
            var: "game rules".to_string(),
            reason,
        })
    }

    #[must_use]
    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            keeper: self.keeper.clone(),
            rules: self.rules.clone(),
            inbox_capacity: self.inbox_capacity,
        }
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },

    #[error("Could not parse {var}={value:?}")]
    Unparsable { var: String, value: String },
}

/// Parse an optional variable, failing on values that don't parse
fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Unparsable {
                var: key.to_string(),
                value,
            }),
    }
}

/// Helper to parse a variable with default fallback
fn parse_var_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    Ok(parse_var(lookup, key)?.unwrap_or(default))
}
