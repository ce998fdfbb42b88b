//! Default game parameters.

use super::entities::Chips;

/// Chips every player starts a game with.
pub const INITIAL_CHIPS: Chips = 25;

/// Burned when a player looks at their card.
pub const PEEK_FEE: Chips = 5;

/// Burned when a player trades their card for a random undealt one.
pub const SWAP_FEE: Chips = 7;

pub const MINIMUM_BET: Chips = 5;

pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS: usize = 5;

pub const DECK_SIZE: usize = 52;

pub const DEFAULT_PEEK_DURATION_SECS: i64 = 60;
pub const DEFAULT_BETTING_DURATION_SECS: i64 = 120;

/// Longest a peek or betting phase may run (one week).
pub const MAX_PHASE_DURATION_SECS: i64 = 7 * 24 * 60 * 60;
