//! Game actor message types.

use tokio::sync::oneshot;

use crate::{
    game::{
        entities::{Card, Chips, PlayerId},
        errors::GameResult,
        state_machine::LeaveOutcome,
    },
    spectator::{GameSummary, PlayerView, RevealedCard},
};

/// Reply channel for a game operation.
pub type Reply<T> = oneshot::Sender<GameResult<T>>;

/// Messages that can be sent to a [`GameActor`](super::GameActor).
///
/// Every message names the caller explicitly; the actor never infers who is
/// asking.
#[derive(Debug)]
pub enum GameMessage {
    Join {
        player: PlayerId,
        response: Reply<()>,
    },

    Leave {
        player: PlayerId,
        response: Reply<LeaveOutcome>,
    },

    /// Creator-only: shuffle, deal, and open the peek phase
    Start {
        caller: PlayerId,
        response: Reply<()>,
    },

    Peek {
        player: PlayerId,
        response: Reply<Card>,
    },

    Swap {
        player: PlayerId,
        response: Reply<()>,
    },

    /// Keeper-only
    EndPeekPhase {
        caller: PlayerId,
        response: Reply<()>,
    },

    Bet {
        player: PlayerId,
        amount: Chips,
        response: Reply<()>,
    },

    Fold {
        player: PlayerId,
        response: Reply<()>,
    },

    /// Keeper-only
    EndBettingPhase {
        caller: PlayerId,
        response: Reply<()>,
    },

    /// Keeper-only. Replies with the participants to release.
    Cleanup {
        caller: PlayerId,
        response: Reply<Vec<PlayerId>>,
    },

    Summary {
        response: oneshot::Sender<GameSummary>,
    },

    PlayerView {
        player: PlayerId,
        viewer: PlayerId,
        response: Reply<PlayerView>,
    },

    PlayerViews {
        viewer: PlayerId,
        response: oneshot::Sender<Vec<PlayerView>>,
    },

    RevealedCards {
        response: oneshot::Sender<Vec<RevealedCard>>,
    },

    CheckInvariants {
        response: Reply<()>,
    },
}

impl GameMessage {
    /// Short name for logging.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Join { .. } => "join",
            Self::Leave { .. } => "leave",
            Self::Start { .. } => "start",
            Self::Peek { .. } => "peek",
            Self::Swap { .. } => "swap",
            Self::EndPeekPhase { .. } => "end peek phase",
            Self::Bet { .. } => "bet",
            Self::Fold { .. } => "fold",
            Self::EndBettingPhase { .. } => "end betting phase",
            Self::Cleanup { .. } => "cleanup",
            Self::Summary { .. } => "summary",
            Self::PlayerView { .. } => "player view",
            Self::PlayerViews { .. } => "player views",
            Self::RevealedCards { .. } => "revealed cards",
            Self::CheckInvariants { .. } => "check invariants",
        }
    }
}
