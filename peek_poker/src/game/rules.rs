//! Game rule configuration.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::{
    constants::{
        DECK_SIZE, DEFAULT_BETTING_DURATION_SECS, DEFAULT_PEEK_DURATION_SECS, INITIAL_CHIPS,
        MAX_PHASE_DURATION_SECS, MAX_PLAYERS, MIN_PLAYERS, MINIMUM_BET, PEEK_FEE, SWAP_FEE,
    },
    entities::Chips,
};

/// Economic and timing parameters shared by every game of a registry.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct GameRules {
    /// Chips each player starts with
    pub initial_chips: Chips,

    /// Fee burned on peeking
    pub peek_fee: Chips,

    /// Fee burned on swapping
    pub swap_fee: Chips,

    /// Smallest legal bet
    pub minimum_bet: Chips,

    /// Players needed to start
    pub min_players: usize,

    /// Seats per game
    pub max_players: usize,

    /// Length of the peek phase
    pub peek_duration_secs: i64,

    /// Length of the betting phase
    pub betting_duration_secs: i64,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            initial_chips: INITIAL_CHIPS,
            peek_fee: PEEK_FEE,
            swap_fee: SWAP_FEE,
            minimum_bet: MINIMUM_BET,
            min_players: MIN_PLAYERS,
            max_players: MAX_PLAYERS,
            peek_duration_secs: DEFAULT_PEEK_DURATION_SECS,
            betting_duration_secs: DEFAULT_BETTING_DURATION_SECS,
        }
    }
}

impl GameRules {
    /// Validate rules
    pub fn validate(&self) -> Result<(), String> {
        if self.min_players < 2 {
            return Err("Min players must be at least 2".to_string());
        }

        if self.max_players < self.min_players || self.max_players > DECK_SIZE {
            return Err(format!(
                "Max players must be between {} and {}",
                self.min_players, DECK_SIZE
            ));
        }

        if self.minimum_bet == 0 {
            return Err("Minimum bet must be greater than 0".to_string());
        }

        if self.initial_chips == 0 {
            return Err("Initial chips must be greater than 0".to_string());
        }

        for secs in [self.peek_duration_secs, self.betting_duration_secs] {
            if !(1..=MAX_PHASE_DURATION_SECS).contains(&secs) {
                return Err(format!(
                    "Phase durations must be between 1 and {MAX_PHASE_DURATION_SECS} seconds"
                ));
            }
        }

        // Every chip in a game can end up on one balance or in the pot.
        let table_chips = u64::from(self.initial_chips) * self.max_players as u64;
        if table_chips > u64::from(Chips::MAX) {
            return Err(format!(
                "Initial chips times max players must not exceed {}",
                Chips::MAX
            ));
        }

        Ok(())
    }

    #[must_use]
    pub fn peek_duration(&self) -> Duration {
        Duration::try_seconds(self.peek_duration_secs).unwrap_or(Duration::MAX)
    }

    #[must_use]
    pub fn betting_duration(&self) -> Duration {
        Duration::try_seconds(self.betting_duration_secs).unwrap_or(Duration::MAX)
    }
}
