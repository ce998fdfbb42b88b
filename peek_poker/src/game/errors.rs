//! Game error types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::entities::{Chips, GameId, Phase, PlayerId};

/// Broad classes of failure. Every [`GameError`] belongs to exactly one.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum ErrorKind {
    /// Unknown game or malformed request.
    Validation,
    /// Caller isn't the creator, the keeper, or a participant.
    Authorization,
    /// Operation isn't valid in the current phase or was already done.
    State,
    /// Deadline not reached yet, or already passed.
    Timing,
    /// Not enough chips, seats, cards, or randomness.
    Resource,
    /// Game has already been cleaned up.
    Exhaustion,
    /// An invariant was broken or a game actor vanished.
    Internal,
}

/// Errors that can occur during game operations. None of them are retried
/// by the engine, and a failed operation never leaves partial effects.
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum GameError {
    #[error("game {0} does not exist")]
    GameNotFound(GameId),
    #[error("invalid rules: {0}")]
    InvalidRules(String),
    #[error("bet of ${amount} is below the minimum bet of ${minimum}")]
    BetBelowMinimum { amount: Chips, minimum: Chips },
    #[error("bet of ${amount} is below the table bet of ${table_bet}")]
    BetBelowTableBet { amount: Chips, table_bet: Chips },

    #[error("only the game creator can do that")]
    NotCreator,
    #[error("only the keeper can do that")]
    NotKeeper,
    #[error("{0} is not playing in this game")]
    NotAParticipant(PlayerId),

    #[error("{0} is already in game {1}")]
    AlreadyInGame(PlayerId, GameId),
    #[error("can't do that during {actual}, need {expected}")]
    WrongPhase { expected: Phase, actual: Phase },
    #[error("need {required}+ players")]
    NotEnoughPlayers { required: usize },
    #[error("the creator can only leave as the last player")]
    CreatorCannotLeave,
    #[error("already peeked")]
    AlreadyPeeked,
    #[error("must peek before swapping")]
    MustPeekFirst,
    #[error("already swapped")]
    AlreadySwapped,
    #[error("already bet this round")]
    AlreadyBet,
    #[error("already folded")]
    AlreadyFolded,

    #[error("deadline {deadline} not reached yet")]
    DeadlineNotReached { deadline: DateTime<Utc> },
    #[error("deadline {deadline} already passed")]
    DeadlinePassed { deadline: DateTime<Utc> },

    #[error("need ${required}, have ${available}")]
    InsufficientChips { required: Chips, available: Chips },
    #[error("chip count would exceed ${}", Chips::MAX)]
    ChipOverflow,
    #[error("game is full ({max_players} players)")]
    GameFull { max_players: usize },
    #[error("no undealt cards left")]
    NoCardsAvailable,
    #[error("randomness source unavailable: {0}")]
    EntropyUnavailable(String),

    #[error("game {0} was cleaned up")]
    GameCleanedUp(GameId),
    #[error("game already cleaned up")]
    AlreadyCleanedUp,

    #[error("no eligible players to resolve a winner")]
    NoEligiblePlayers,
    #[error("invalid game state: {0}")]
    InvariantViolation(String),
    #[error("game {0} is unavailable")]
    GameUnavailable(GameId),
}

impl GameError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::GameNotFound(_)
            | Self::InvalidRules(_)
            | Self::BetBelowMinimum { .. }
            | Self::BetBelowTableBet { .. } => ErrorKind::Validation,
            Self::NotCreator | Self::NotKeeper | Self::NotAParticipant(_) => {
                ErrorKind::Authorization
            }
            Self::AlreadyInGame(..)
            | Self::WrongPhase { .. }
            | Self::NotEnoughPlayers { .. }
            | Self::CreatorCannotLeave
            | Self::AlreadyPeeked
            | Self::MustPeekFirst
            | Self::AlreadySwapped
            | Self::AlreadyBet
            | Self::AlreadyFolded => ErrorKind::State,
            Self::DeadlineNotReached { .. } | Self::DeadlinePassed { .. } => ErrorKind::Timing,
            Self::InsufficientChips { .. }
            | Self::ChipOverflow
            | Self::GameFull { .. }
            | Self::NoCardsAvailable
            | Self::EntropyUnavailable(_) => ErrorKind::Resource,
            Self::GameCleanedUp(_) | Self::AlreadyCleanedUp => ErrorKind::Exhaustion,
            Self::NoEligiblePlayers | Self::InvariantViolation(_) | Self::GameUnavailable(_) => {
                ErrorKind::Internal
            }
        }
    }
}

/// Result type for game operations
pub type GameResult<T> = Result<T, GameError>;
