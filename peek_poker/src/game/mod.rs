//! Peek poker game engine - per-game state machine and its building blocks.
//!
//! This module provides:
//! - Card, player, and game records
//! - Deck shuffling and the assigned-card bitmap
//! - Chip ledger (fees, bets, pot)
//! - Showdown resolution
//! - The phase state machine that ties them together
//! - Notifications emitted on every state change

pub mod constants;
pub mod deck;
pub mod entities;
pub mod errors;
pub mod events;
pub mod ledger;
pub mod resolver;
pub mod rules;
pub mod state_machine;

pub use deck::{CardBitmap, Deck};
pub use entities::{Card, CardIndex, Chips, Game, GameId, Phase, Player, PlayerId, Suit, Value};
pub use errors::{ErrorKind, GameError, GameResult};
pub use events::{
    ActionKind, ChannelSink, GameEvent, LogSink, MemorySink, Notification, NotificationSink,
    Visibility,
};
pub use ledger::BettingLedger;
pub use rules::GameRules;
pub use state_machine::{GameStateMachine, LeaveOutcome};
