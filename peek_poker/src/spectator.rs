//! Read-only projections of game state, filtered by who is looking.
//!
//! Nothing here mutates a game. Projections are built inside a game's actor
//! from its current state and handed out as owned values, so a caller never
//! holds a reference into live game state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    game::{
        entities::{Card, Chips, GameId, Phase, PlayerId},
        errors::{GameError, GameResult},
        state_machine::GameStateMachine,
    },
    registry::GameRegistry,
};

/// Public facts about one game.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct GameSummary {
    pub id: GameId,
    pub phase: Phase,
    pub pot: Chips,
    pub table_bet: Chips,
    pub fees_burned: Chips,
    pub deadline: Option<DateTime<Utc>>,
    /// Participants in join order.
    pub participants: Vec<PlayerId>,
    pub active_player_count: usize,
    pub creator: PlayerId,
    pub keeper: PlayerId,
    pub is_cleaned_up: bool,
    pub winner: Option<PlayerId>,
    pub ended_by_fold: bool,
    pub created_at: DateTime<Utc>,
}

impl GameSummary {
    #[must_use]
    pub fn of(machine: &GameStateMachine) -> Self {
        let game = machine.game();
        Self {
            id: game.id,
            phase: game.phase,
            pot: game.ledger.pot(),
            table_bet: game.ledger.table_bet(),
            fees_burned: game.ledger.fees_burned(),
            deadline: game.deadline,
            participants: game.participants.clone(),
            active_player_count: game.active_player_count,
            creator: game.creator.clone(),
            keeper: game.keeper.clone(),
            is_cleaned_up: game.is_cleaned_up,
            winner: game.winner.clone(),
            ended_by_fold: game.ended_by_fold,
            created_at: game.created_at,
        }
    }

    #[must_use]
    pub fn player_count(&self) -> usize {
        self.participants.len()
    }

    /// Whether a timed phase is open and its deadline has passed.
    #[must_use]
    pub fn deadline_elapsed(&self, now: DateTime<Utc>) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }
}

/// One player as seen by `viewer`. Everybody sees status flags, balances
/// and bets. The card is only filled in for its owner while they know it,
/// or for everyone once it has been revealed at showdown.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PlayerView {
    pub player: PlayerId,
    pub is_active: bool,
    pub has_peeked: bool,
    pub has_swapped: bool,
    pub has_folded: bool,
    pub chip_balance: Chips,
    pub current_bet: Chips,
    pub action_nonce: u64,
    pub last_action_time: DateTime<Utc>,
    pub card: Option<Card>,
}

impl PlayerView {
    pub fn of(
        machine: &GameStateMachine,
        player: &PlayerId,
        viewer: &PlayerId,
    ) -> GameResult<Self> {
        let record = machine
            .player(player)
            .ok_or_else(|| GameError::NotAParticipant(player.clone()))?;
        let own_known_card = player == viewer && record.knows_own_card();
        let revealed = machine.game().cards_revealed() && !record.has_folded;
        let card = if own_known_card || revealed {
            machine.card_of(player)
        } else {
            None
        };

        Ok(Self {
            player: player.clone(),
            is_active: record.is_active,
            has_peeked: record.has_peeked,
            has_swapped: record.has_swapped,
            has_folded: record.has_folded,
            chip_balance: record.chip_balance,
            current_bet: record.current_bet,
            action_nonce: record.action_nonce,
            last_action_time: record.last_action_time,
            card,
        })
    }

    /// Every participant in join order.
    #[must_use]
    pub fn all(machine: &GameStateMachine, viewer: &PlayerId) -> Vec<Self> {
        machine
            .players()
            .filter_map(|(player, _)| Self::of(machine, player, viewer).ok())
            .collect()
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RevealedCard {
    pub player: PlayerId,
    pub card: Card,
    pub is_winner: bool,
}

impl RevealedCard {
    /// Cards shown at showdown, in join order. Empty if no showdown took
    /// place (including games won by fold).
    #[must_use]
    pub fn all(machine: &GameStateMachine) -> Vec<Self> {
        let game = machine.game();
        if !game.cards_revealed() {
            return Vec::new();
        }
        machine
            .players()
            .filter(|(_, record)| !record.has_folded)
            .filter_map(|(player, _)| {
                machine.card_of(player).map(|card| Self {
                    player: player.clone(),
                    card,
                    is_winner: game.winner.as_ref() == Some(player),
                })
            })
            .collect()
    }
}

/// Read-only access to every game of a registry.
#[derive(Clone, Copy)]
pub struct SpectatorView<'a> {
    registry: &'a GameRegistry,
}

impl<'a> SpectatorView<'a> {
    #[must_use]
    pub fn new(registry: &'a GameRegistry) -> Self {
        Self { registry }
    }

    /// Games that have not been cleaned up, in id order.
    pub async fn list_active_games(&self) -> Vec<GameId> {
        self.registry.list_active_games().await
    }

    pub async fn game_summary(&self, game_id: GameId) -> GameResult<GameSummary> {
        self.registry.handle(game_id).await?.summary().await
    }

    pub async fn player_view(
        &self,
        game_id: GameId,
        player: &PlayerId,
        viewer: &PlayerId,
    ) -> GameResult<PlayerView> {
        self.registry
            .handle(game_id)
            .await?
            .player_view(player.clone(), viewer.clone())
            .await
    }

    pub async fn player_views(
        &self,
        game_id: GameId,
        viewer: &PlayerId,
    ) -> GameResult<Vec<PlayerView>> {
        self.registry
            .handle(game_id)
            .await?
            .player_views(viewer.clone())
            .await
    }

    pub async fn revealed_cards(&self, game_id: GameId) -> GameResult<Vec<RevealedCard>> {
        self.registry.handle(game_id).await?.revealed_cards().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::rules::GameRules;
    use chrono::Duration;
    use rand::{SeedableRng, rngs::StdRng};

    fn id(name: &str) -> PlayerId {
        PlayerId::new(name)
    }

    fn two_player_game() -> (GameStateMachine, DateTime<Utc>) {
        let now = Utc::now();
        let mut rng = StdRng::seed_from_u64(21);
        let mut machine =
            GameStateMachine::new(3, id("alice"), id("keeper"), GameRules::default(), now);
        machine.join(&id("bob"), now).unwrap();
        machine.start(&id("alice"), now, &mut rng).unwrap();
        (machine, now)
    }

    #[test]
    fn test_summary_reflects_game() {
        let (machine, now) = two_player_game();
        let summary = GameSummary::of(&machine);
        assert_eq!(summary.id, 3);
        assert_eq!(summary.phase, Phase::PeekPhase);
        assert_eq!(summary.player_count(), 2);
        assert_eq!(summary.creator, id("alice"));
        assert!(!summary.deadline_elapsed(now));
        assert!(summary.deadline_elapsed(now + Duration::seconds(60)));
    }

    #[test]
    fn test_card_hidden_until_peeked() {
        let (mut machine, now) = two_player_game();
        let before = PlayerView::of(&machine, &id("alice"), &id("alice")).unwrap();
        assert_eq!(before.card, None);

        let card = machine.peek(&id("alice"), now).unwrap();
        let own = PlayerView::of(&machine, &id("alice"), &id("alice")).unwrap();
        assert_eq!(own.card, Some(card));
        assert_eq!(own.chip_balance, 20);

        let seen_by_bob = PlayerView::of(&machine, &id("alice"), &id("bob")).unwrap();
        assert_eq!(seen_by_bob.card, None);
        assert!(seen_by_bob.has_peeked);
        assert_eq!(seen_by_bob.chip_balance, 20);
    }

    #[test]
    fn test_card_hidden_after_swap() {
        let (mut machine, now) = two_player_game();
        let mut rng = StdRng::seed_from_u64(4);
        machine.peek(&id("alice"), now).unwrap();
        machine.swap(&id("alice"), now, &mut rng).unwrap();
        let own = PlayerView::of(&machine, &id("alice"), &id("alice")).unwrap();
        assert_eq!(own.card, None);
        assert!(own.has_swapped);
    }

    #[test]
    fn test_showdown_reveals_standing_cards() {
        let (mut machine, now) = two_player_game();
        assert!(RevealedCard::all(&machine).is_empty());
        machine
            .end_peek_phase(&id("keeper"), now + Duration::seconds(60))
            .unwrap();
        machine
            .end_betting_phase(&id("keeper"), now + Duration::seconds(180))
            .unwrap();

        let revealed = RevealedCard::all(&machine);
        assert_eq!(revealed.len(), 2);
        assert_eq!(revealed.iter().filter(|card| card.is_winner).count(), 1);
        let views = PlayerView::all(&machine, &id("stranger"));
        assert!(views.iter().all(|view| view.card.is_some()));
    }

    #[test]
    fn test_fold_win_reveals_nothing() {
        let (mut machine, now) = two_player_game();
        machine
            .end_peek_phase(&id("keeper"), now + Duration::seconds(60))
            .unwrap();
        machine
            .fold(&id("bob"), now + Duration::seconds(70))
            .unwrap();
        assert!(RevealedCard::all(&machine).is_empty());
        let views = PlayerView::all(&machine, &id("stranger"));
        assert!(views.iter().all(|view| view.card.is_none()));
    }

    #[test]
    fn test_unknown_player_view() {
        let (machine, _) = two_player_game();
        assert_eq!(
            PlayerView::of(&machine, &id("zed"), &id("zed")),
            Err(GameError::NotAParticipant(id("zed")))
        );
    }
}
