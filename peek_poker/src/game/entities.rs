use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{
    deck::{CardBitmap, Deck},
    ledger::BettingLedger,
};

/// Suits in ascending tie-break order.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Suit {
    Heart,
    Diamond,
    Club,
    Spade,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Heart, Suit::Diamond, Suit::Club, Suit::Spade];

    #[must_use]
    pub const fn index(self) -> u8 {
        match self {
            Self::Heart => 0,
            Self::Diamond => 1,
            Self::Club => 2,
            Self::Spade => 3,
        }
    }
}

impl TryFrom<u8> for Suit {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::ALL.get(usize::from(value)).copied().ok_or(value)
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Heart => "♥",
            Self::Diamond => "♦",
            Self::Club => "♣",
            Self::Spade => "♠",
        };
        write!(f, "{repr}")
    }
}

/// Placeholder for card values.
pub type Value = u8;

pub const MIN_VALUE: Value = 2;
pub const MAX_VALUE: Value = 14;

/// A card is a value (two=2u8 ... ace=14u8) and a suit. Cards order by
/// value first and suit second, which is exactly the showdown order.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Card(pub Value, pub Suit);

impl Card {
    #[must_use]
    pub const fn value(&self) -> Value {
        self.0
    }

    #[must_use]
    pub const fn suit(&self) -> Suit {
        self.1
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let value = match self.0 {
            14 => "A",
            11 => "J",
            12 => "Q",
            13 => "K",
            v => &v.to_string(),
        };
        let repr = format!("{value}/{}", self.1);
        write!(f, "{repr:>4}")
    }
}

/// Type alias for whole chips. Balances, fees, bets, and pots are all
/// whole chips.
pub type Chips = u32;

/// Sequential game identifier handed out by the registry.
pub type GameId = u64;

/// Position of a card within a game's shuffled deck.
pub type CardIndex = usize;

/// Opaque participant identity. Authentication happens outside the
/// engine; every operation receives the caller's identity explicitly.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(s: &str) -> Self {
        Self(s.to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for PlayerId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for PlayerId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Game phases in the only order they may occur.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Phase {
    PreGame,
    PeekPhase,
    Betting,
    Showdown,
    Ended,
}

impl Phase {
    /// Whether cards have been dealt in this phase.
    #[must_use]
    pub fn is_dealt(self) -> bool {
        self >= Self::PeekPhase
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::PreGame => "pre-game",
            Self::PeekPhase => "peek phase",
            Self::Betting => "betting",
            Self::Showdown => "showdown",
            Self::Ended => "ended",
        };
        write!(f, "{repr}")
    }
}

/// Per-game player record.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Player {
    pub is_active: bool,
    pub has_peeked: bool,
    pub has_swapped: bool,
    pub has_folded: bool,
    /// Deck position of the player's card. `None` until cards are dealt.
    pub card_index: Option<CardIndex>,
    pub chip_balance: Chips,
    /// Stake committed this round. The chips themselves already sit in
    /// the pot.
    pub current_bet: Chips,
    pub last_action_time: DateTime<Utc>,
    /// Count of accepted actions (peek, swap, bet, fold).
    pub action_nonce: u64,
}

impl Player {
    #[must_use]
    pub fn new(chip_balance: Chips, joined_at: DateTime<Utc>) -> Self {
        Self {
            is_active: true,
            has_peeked: false,
            has_swapped: false,
            has_folded: false,
            card_index: None,
            chip_balance,
            current_bet: 0,
            last_action_time: joined_at,
            action_nonce: 0,
        }
    }

    /// Active players are dealt-in and haven't folded.
    #[must_use]
    pub fn is_contending(&self) -> bool {
        self.is_active && !self.has_folded
    }

    /// Whether the player knows which card they hold. Swapping replaces
    /// the card with one they never get to see.
    #[must_use]
    pub fn knows_own_card(&self) -> bool {
        self.has_peeked && !self.has_swapped
    }

    pub(crate) fn record_action(&mut self, now: DateTime<Utc>) {
        self.last_action_time = now;
        self.action_nonce += 1;
    }
}

/// Per-game record.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Game {
    pub id: GameId,
    pub phase: Phase,
    /// Participants in join order. Position `i` is dealt deck card `i`.
    pub participants: Vec<PlayerId>,
    pub active_player_count: usize,
    pub deck: Deck,
    pub assigned: CardBitmap,
    #[serde(flatten)]
    pub ledger: BettingLedger,
    pub keeper: PlayerId,
    pub creator: PlayerId,
    /// Deadline of the current timed phase.
    pub deadline: Option<DateTime<Utc>>,
    pub is_cleaned_up: bool,
    pub winner: Option<PlayerId>,
    pub ended_by_fold: bool,
    pub created_at: DateTime<Utc>,
}

impl Game {
    #[must_use]
    pub fn new(id: GameId, creator: PlayerId, keeper: PlayerId, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            phase: Phase::PreGame,
            participants: Vec::new(),
            active_player_count: 0,
            deck: Deck::default(),
            assigned: CardBitmap::default(),
            ledger: BettingLedger::default(),
            keeper,
            creator,
            deadline: None,
            is_cleaned_up: false,
            winner: None,
            ended_by_fold: false,
            created_at,
        }
    }

    /// Whether a showdown took place and non-folded cards are public.
    #[must_use]
    pub fn cards_revealed(&self) -> bool {
        self.phase >= Phase::Showdown && !self.ended_by_fold && self.winner.is_some()
    }
}
