//! Deck construction, shuffling, and tracking of which deck positions are
//! held by players.

use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};

use super::{
    constants::DECK_SIZE,
    entities::{Card, CardIndex, MAX_VALUE, MIN_VALUE, Suit},
    errors::{GameError, GameResult},
};

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// Unshuffled deck, suit by suit, twos through aces.
    #[must_use]
    pub fn ordered() -> Self {
        let mut cards = Vec::with_capacity(DECK_SIZE);
        for suit in Suit::ALL {
            for value in MIN_VALUE..=MAX_VALUE {
                cards.push(Card(value, suit));
            }
        }
        Self { cards }
    }

    /// Build a fresh deck and permute it with a Fisher-Yates shuffle
    /// driven by `rng`.
    pub fn build_and_shuffle<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut deck = Self::ordered();
        deck.cards.shuffle(rng);
        deck
    }

    #[must_use]
    pub fn card(&self, idx: CardIndex) -> Option<Card> {
        self.cards.get(idx).copied()
    }

    #[must_use]
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

/// One bit per deck position; a set bit means some player holds that card.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct CardBitmap(u64);

impl CardBitmap {
    const FULL: u64 = (1 << DECK_SIZE) - 1;

    pub fn assign(&mut self, idx: CardIndex) {
        debug_assert!(idx < DECK_SIZE);
        self.0 |= 1 << idx;
    }

    pub fn unassign(&mut self, idx: CardIndex) {
        debug_assert!(idx < DECK_SIZE);
        self.0 &= !(1 << idx);
    }

    #[must_use]
    pub fn is_assigned(&self, idx: CardIndex) -> bool {
        idx < DECK_SIZE && self.0 & (1 << idx) != 0
    }

    pub fn clear(&mut self) {
        self.0 = 0;
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.0.count_ones() as usize
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.0 & Self::FULL == Self::FULL
    }

    /// Pick a position nobody holds, uniformly among all free positions.
    pub fn random_unassigned_index<R: Rng + ?Sized>(&self, rng: &mut R) -> GameResult<CardIndex> {
        let mut free = !self.0 & Self::FULL;
        let n = free.count_ones();
        if n == 0 {
            return Err(GameError::NoCardsAvailable);
        }
        // Skip past the first k free bits.
        let k = rng.random_range(0..n);
        for _ in 0..k {
            free &= free - 1;
        }
        Ok(free.trailing_zeros() as CardIndex)
    }
}
