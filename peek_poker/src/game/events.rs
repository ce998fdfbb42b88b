//! Notifications emitted on every state change and the sinks that receive
//! them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    sync::{Mutex, PoisonError},
};
use tokio::sync::mpsc;

use super::entities::{Card, Chips, GameId, PlayerId};

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum ActionKind {
    Peek,
    Swap,
    Bet,
    Fold,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Peek => "peek",
            Self::Swap => "swap",
            Self::Bet => "bet",
            Self::Fold => "fold",
        };
        write!(f, "{repr}")
    }
}

/// Events that occur during a game
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum GameEvent {
    GameCreated { creator: PlayerId },
    PlayerJoined { player: PlayerId },
    PlayerLeft { player: PlayerId },
    GameAbandoned,
    CardDealt { player: PlayerId },
    PeekPhaseStarted { deadline: DateTime<Utc> },
    PlayerPeeked { player: PlayerId },
    CardPeeked { player: PlayerId, card: Card },
    CardSwapped { player: PlayerId },
    BettingPhaseStarted { deadline: DateTime<Utc> },
    BetPlaced { player: PlayerId, amount: Chips },
    PlayerFolded { player: PlayerId },
    PlayerAction { player: PlayerId, kind: ActionKind, amount: Chips },
    ShowdownStarted,
    CardRevealed { player: PlayerId, card: Card },
    PotAwarded { player: PlayerId, amount: Chips },
    GameEnded { winner: Option<PlayerId>, by_fold: bool },
    GameCleanedUp,
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::GameCreated { creator } => format!("{creator} created the game"),
            Self::PlayerJoined { player } => format!("{player} joined the game"),
            Self::PlayerLeft { player } => format!("{player} left the game"),
            Self::GameAbandoned => "everyone left, game abandoned".to_string(),
            Self::CardDealt { player } => format!("{player} was dealt a card"),
            Self::PeekPhaseStarted { deadline } => format!("peek phase until {deadline}"),
            Self::PlayerPeeked { player } => format!("{player} peeked"),
            Self::CardPeeked { player, card } => format!("{player} holds {card}"),
            Self::CardSwapped { player } => format!("{player} swapped"),
            Self::BettingPhaseStarted { deadline } => format!("betting until {deadline}"),
            Self::BetPlaced { player, amount } => format!("{player} bet ${amount}"),
            Self::PlayerFolded { player } => format!("{player} folded"),
            Self::PlayerAction {
                player,
                kind,
                amount,
            } => format!("{player} {kind} (${amount})"),
            Self::ShowdownStarted => "showdown".to_string(),
            Self::CardRevealed { player, card } => format!("{player} shows {card}"),
            Self::PotAwarded { player, amount } => format!("{player} won ${amount}"),
            Self::GameEnded {
                winner: Some(winner),
                by_fold: true,
            } => format!("game over, {winner} is the last one standing"),
            Self::GameEnded {
                winner: Some(winner),
                by_fold: false,
            } => format!("game over, {winner} has the high card"),
            Self::GameEnded { winner: None, .. } => "game over".to_string(),
            Self::GameCleanedUp => "game cleaned up".to_string(),
        };
        write!(f, "{repr}")
    }
}

/// Who may see a notification.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Visibility {
    Public,
    /// Only the named player.
    Private(PlayerId),
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Notification {
    pub game_id: GameId,
    pub visibility: Visibility,
    pub event: GameEvent,
}

impl Notification {
    #[must_use]
    pub fn public(game_id: GameId, event: GameEvent) -> Self {
        Self {
            game_id,
            visibility: Visibility::Public,
            event,
        }
    }

    #[must_use]
    pub fn private(game_id: GameId, player: PlayerId, event: GameEvent) -> Self {
        Self {
            game_id,
            visibility: Visibility::Private(player),
            event,
        }
    }

    #[must_use]
    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    #[must_use]
    pub fn is_visible_to(&self, viewer: &PlayerId) -> bool {
        match &self.visibility {
            Visibility::Public => true,
            Visibility::Private(player) => player == viewer,
        }
    }
}

/// Receives every notification a game emits. Implementations must not
/// block; they run inside the game's actor.
pub trait NotificationSink: Send + Sync {
    fn publish(&self, notification: Notification);
}

/// Writes public notifications to the log. Private ones are logged without
/// their payload.
#[derive(Debug, Default)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn publish(&self, notification: Notification) {
        match &notification.visibility {
            Visibility::Public => {
                log::info!("Game {}: {}", notification.game_id, notification.event);
            }
            Visibility::Private(player) => {
                log::debug!(
                    "Game {}: private notification for {}",
                    notification.game_id,
                    player
                );
            }
        }
    }
}

/// Forwards notifications into a bounded channel. A full channel drops the
/// notification rather than stalling the game.
#[derive(Debug)]
pub struct ChannelSink {
    sender: mpsc::Sender<Notification>,
}

impl ChannelSink {
    #[must_use]
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Notification>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self { sender }, receiver)
    }
}

impl NotificationSink for ChannelSink {
    fn publish(&self, notification: Notification) {
        match self.sender.try_send(notification) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(notification)) => {
                log::warn!(
                    "Notification channel full, dropping game {} event: {}",
                    notification.game_id,
                    notification.event
                );
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                log::debug!("Notification channel closed");
            }
        }
    }
}

/// Keeps every notification in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    notifications: Mutex<Vec<Notification>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn snapshot(&self) -> Vec<Notification> {
        self.notifications
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Remove and return everything received so far.
    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(
            &mut *self
                .notifications
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }

    /// What `viewer` would be shown.
    #[must_use]
    pub fn visible_to(&self, viewer: &PlayerId) -> Vec<Notification> {
        self.snapshot()
            .into_iter()
            .filter(|notification| notification.is_visible_to(viewer))
            .collect()
    }
}

impl NotificationSink for MemorySink {
    fn publish(&self, notification: Notification) {
        self.notifications
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification);
    }
}
