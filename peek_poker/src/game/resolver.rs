//! Showdown winner resolution.

use super::{
    entities::{Card, PlayerId},
    errors::{GameError, GameResult},
};

/// Highest card wins, value first and suit second.
///
/// `contenders` must be in join order. Only a strictly greater card
/// replaces the current leader, so the earliest of two identical cards
/// would win (a single deck never deals duplicates, so this only matters
/// for callers passing synthetic cards).
pub fn resolve<'a, I>(contenders: I) -> GameResult<(&'a PlayerId, Card)>
where
    I: IntoIterator<Item = (&'a PlayerId, Card)>,
{
    let mut best: Option<(&'a PlayerId, Card)> = None;
    for (player, card) in contenders {
        match best {
            Some((_, leader)) if card <= leader => {}
            _ => best = Some((player, card)),
        }
    }
    best.ok_or(GameError::NoEligiblePlayers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::Suit;

    #[test]
    fn test_higher_value_wins() {
        let alice = PlayerId::new("alice");
        let bob = PlayerId::new("bob");
        let contenders = [(&alice, Card(9, Suit::Spade)), (&bob, Card(10, Suit::Heart))];
        assert_eq!(resolve(contenders), Ok((&bob, Card(10, Suit::Heart))));
    }

    #[test]
    fn test_suit_breaks_value_ties() {
        let alice = PlayerId::new("alice");
        let bob = PlayerId::new("bob");
        let carol = PlayerId::new("carol");
        let contenders = [
            (&alice, Card(12, Suit::Diamond)),
            (&bob, Card(12, Suit::Spade)),
            (&carol, Card(12, Suit::Club)),
        ];
        assert_eq!(resolve(contenders).unwrap().0, &bob);
    }

    #[test]
    fn test_first_seen_wins_exact_tie() {
        let alice = PlayerId::new("alice");
        let bob = PlayerId::new("bob");
        let contenders = [(&alice, Card(7, Suit::Club)), (&bob, Card(7, Suit::Club))];
        assert_eq!(resolve(contenders).unwrap().0, &alice);
    }

    #[test]
    fn test_later_strictly_higher_card_wins() {
        let alice = PlayerId::new("alice");
        let bob = PlayerId::new("bob");
        let carol = PlayerId::new("carol");
        let contenders = [
            (&alice, Card(14, Suit::Heart)),
            (&bob, Card(2, Suit::Spade)),
            (&carol, Card(14, Suit::Diamond)),
        ];
        assert_eq!(resolve(contenders).unwrap().0, &carol);
    }

    #[test]
    fn test_no_contenders() {
        assert_eq!(resolve(Vec::new()), Err(GameError::NoEligiblePlayers));
    }
}
