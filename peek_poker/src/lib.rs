//! # Peek Poker
//!
//! An engine for many concurrent games of single-card "peek poker".
//!
//! Every player is dealt one hidden card from a shuffled 52-card deck. During
//! the peek phase a player may pay a fee to look at their own card, and after
//! peeking may pay another fee to swap it for a random undealt card that they
//! never get to see. In the betting phase each player bets once or folds.
//! At showdown the highest card (value first, suit second) takes the pot; if
//! everyone but one player folds, that player takes it immediately.
//!
//! ## Architecture
//!
//! - [`game`]: records, deck, chip ledger, winner resolution, and the
//!   per-game phase state machine
//! - [`registry`]: one tokio actor per game plus the registry that creates
//!   games and enforces one game per participant
//! - [`spectator`]: read-only projections filtered by viewer
//! - [`clock`], [`entropy`]: injectable time and randomness sources
//!
//! Deadline transitions (`end_peek_phase`, `end_betting_phase`, `cleanup`)
//! are never triggered by the engine itself; an external keeper calls them.
//!
//! ## Example
//!
//! ```no_run
//! use peek_poker::{GameRegistry, PlayerId, RegistryConfig};
//!
//! # async fn demo() -> peek_poker::GameResult<()> {
//! let registry = GameRegistry::new(RegistryConfig::new(PlayerId::new("keeper")))?;
//! let game = registry.create_game(&PlayerId::new("alice")).await?;
//! let summary = registry.spectator().game_summary(game).await?;
//! assert_eq!(summary.player_count(), 1);
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod entropy;

/// Core game logic, entities, and state machine.
pub mod game;

/// Per-game actors and the registry that routes to them.
pub mod registry;

pub mod spectator;

pub use clock::{Clock, ManualClock, SystemClock};
pub use entropy::{EntropySource, OsEntropy, SeededEntropy};
pub use game::{
    ActionKind, Card, ChannelSink, Chips, ErrorKind, GameError, GameEvent, GameId, GameResult,
    GameRules, GameStateMachine, LeaveOutcome, LogSink, MemorySink, Notification,
    NotificationSink, Phase, PlayerId, Suit, Visibility, constants,
};
pub use registry::{GameRegistry, RegistryConfig};
pub use spectator::{GameSummary, PlayerView, RevealedCard, SpectatorView};
