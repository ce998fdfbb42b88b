//! Single-game phase state machine.
//!
//! A [`GameStateMachine`] owns one [`Game`] record and its [`Player`]
//! records. Every operation validates all of its preconditions before it
//! touches anything, so a rejected call leaves the game exactly as it was
//! and emits nothing. Time and randomness come in as arguments; the machine
//! never reads a clock or an entropy source itself.

use chrono::{DateTime, Duration, Utc};
use log::{debug, error, info};
use rand::Rng;
use std::collections::{HashMap, HashSet, VecDeque};

use super::{
    deck::Deck,
    entities::{Card, Chips, Game, GameId, Phase, Player, PlayerId},
    errors::{GameError, GameResult},
    events::{ActionKind, GameEvent, Notification},
    ledger::BettingLedger,
    resolver,
    rules::GameRules,
};

/// What happened to the game when a participant left.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LeaveOutcome {
    Left,
    /// The last participant left, so the game ended without being played.
    Abandoned,
}

#[derive(Debug)]
pub struct GameStateMachine {
    game: Game,
    players: HashMap<PlayerId, Player>,
    rules: GameRules,
    /// Notifications produced since the last drain.
    events: VecDeque<Notification>,
}

impl GameStateMachine {
    /// Create a game in [`Phase::PreGame`] with `creator` already joined.
    #[must_use]
    pub fn new(
        id: GameId,
        creator: PlayerId,
        keeper: PlayerId,
        rules: GameRules,
        now: DateTime<Utc>,
    ) -> Self {
        let mut machine = Self {
            game: Game::new(id, creator.clone(), keeper, now),
            players: HashMap::with_capacity(rules.max_players),
            rules,
            events: VecDeque::new(),
        };
        machine.emit(GameEvent::GameCreated {
            creator: creator.clone(),
        });
        machine.seat(creator, now);
        machine
    }

    #[must_use]
    pub fn id(&self) -> GameId {
        self.game.id
    }

    #[must_use]
    pub fn game(&self) -> &Game {
        &self.game
    }

    #[must_use]
    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    #[must_use]
    pub fn player(&self, player: &PlayerId) -> Option<&Player> {
        self.players.get(player)
    }

    /// Players in join order.
    pub fn players(&self) -> impl Iterator<Item = (&PlayerId, &Player)> {
        self.game
            .participants
            .iter()
            .filter_map(|id| self.players.get(id).map(|player| (id, player)))
    }

    /// The card at a player's deck position, regardless of who may see it.
    #[must_use]
    pub fn card_of(&self, player: &PlayerId) -> Option<Card> {
        self.players
            .get(player)
            .and_then(|player| player.card_index)
            .and_then(|idx| self.game.deck.card(idx))
    }

    #[cfg(test)]
    pub(crate) fn game_mut(&mut self) -> &mut Game {
        &mut self.game
    }

    pub fn drain_events(&mut self) -> VecDeque<Notification> {
        std::mem::take(&mut self.events)
    }

    pub fn join(&mut self, player: &PlayerId, now: DateTime<Utc>) -> GameResult<()> {
        self.ensure_not_cleaned_up()?;
        self.ensure_phase(Phase::PreGame)?;
        if self.players.contains_key(player) {
            return Err(GameError::AlreadyInGame(player.clone(), self.game.id));
        }
        if self.game.participants.len() >= self.rules.max_players {
            return Err(GameError::GameFull {
                max_players: self.rules.max_players,
            });
        }

        self.seat(player.clone(), now);
        Ok(())
    }

    pub fn leave(&mut self, player: &PlayerId) -> GameResult<LeaveOutcome> {
        self.ensure_not_cleaned_up()?;
        self.ensure_phase(Phase::PreGame)?;
        let position = self
            .game
            .participants
            .iter()
            .position(|id| id == player)
            .ok_or_else(|| GameError::NotAParticipant(player.clone()))?;
        if *player == self.game.creator && self.game.participants.len() > 1 {
            return Err(GameError::CreatorCannotLeave);
        }

        self.game.participants.swap_remove(position);
        if let Some(record) = self.players.remove(player)
            && record.is_contending()
        {
            self.game.active_player_count -= 1;
        }
        self.emit(GameEvent::PlayerLeft {
            player: player.clone(),
        });
        debug!("Game {}: {} left", self.game.id, player);

        if self.game.participants.is_empty() {
            self.advance(Phase::Ended);
            self.game.is_cleaned_up = true;
            self.emit(GameEvent::GameAbandoned);
            info!("Game {} abandoned", self.game.id);
            return Ok(LeaveOutcome::Abandoned);
        }
        Ok(LeaveOutcome::Left)
    }

    /// Shuffle, deal position `i` to the `i`th participant, and open the
    /// peek phase.
    pub fn start<R: Rng + ?Sized>(
        &mut self,
        caller: &PlayerId,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> GameResult<()> {
        self.ensure_not_cleaned_up()?;
        if *caller != self.game.creator {
            return Err(GameError::NotCreator);
        }
        self.ensure_phase(Phase::PreGame)?;
        if self.game.participants.len() < self.rules.min_players {
            return Err(GameError::NotEnoughPlayers {
                required: self.rules.min_players,
            });
        }

        let deadline = deadline_after(now, self.rules.peek_duration())?;
        self.game.deck = Deck::build_and_shuffle(rng);
        self.game.assigned.clear();
        for (idx, id) in self.game.participants.iter().enumerate() {
            if let Some(player) = self.players.get_mut(id) {
                player.card_index = Some(idx);
                self.game.assigned.assign(idx);
            }
        }
        let dealt: Vec<PlayerId> = self.game.participants.clone();
        for player in dealt {
            self.emit(GameEvent::CardDealt { player });
        }

        self.advance(Phase::PeekPhase);
        self.game.deadline = Some(deadline);
        self.emit(GameEvent::PeekPhaseStarted { deadline });
        info!(
            "Game {} started with {} players, peeking until {}",
            self.game.id,
            self.game.participants.len(),
            deadline
        );
        Ok(())
    }

    /// Pay the peek fee and learn your own card.
    pub fn peek(&mut self, player: &PlayerId, now: DateTime<Utc>) -> GameResult<Card> {
        self.ensure_not_cleaned_up()?;
        self.ensure_participant(player)?;
        self.ensure_phase(Phase::PeekPhase)?;
        self.ensure_before_deadline(now)?;
        let record = self.participant(player)?;
        if record.has_peeked {
            return Err(GameError::AlreadyPeeked);
        }
        let card = self
            .card_of(player)
            .ok_or_else(|| GameError::InvariantViolation(format!("{player} holds no card")))?;

        let fee = self.rules.peek_fee;
        let record = seat_of(&mut self.players, player)?;
        self.game.ledger.charge_fee(record, fee)?;
        record.has_peeked = true;
        record.record_action(now);

        self.emit(GameEvent::PlayerPeeked {
            player: player.clone(),
        });
        self.emit_private(
            player,
            GameEvent::CardPeeked {
                player: player.clone(),
                card,
            },
        );
        self.emit_action(player, ActionKind::Peek, fee);
        debug!("Game {}: {} peeked", self.game.id, player);
        Ok(card)
    }

    /// Pay the swap fee and trade the held card for a random undealt one.
    /// The new card stays hidden from its holder.
    pub fn swap<R: Rng + ?Sized>(
        &mut self,
        player: &PlayerId,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> GameResult<()> {
        self.ensure_not_cleaned_up()?;
        self.ensure_participant(player)?;
        self.ensure_phase(Phase::PeekPhase)?;
        self.ensure_before_deadline(now)?;
        let record = self.participant(player)?;
        if !record.has_peeked {
            return Err(GameError::MustPeekFirst);
        }
        if record.has_swapped {
            return Err(GameError::AlreadySwapped);
        }
        let fee = self.rules.swap_fee;
        BettingLedger::ensure_affordable(record, fee)?;
        let old_idx = record
            .card_index
            .ok_or_else(|| GameError::InvariantViolation(format!("{player} holds no card")))?;

        let mut assigned = self.game.assigned;
        assigned.unassign(old_idx);
        let new_idx = assigned.random_unassigned_index(rng)?;
        assigned.assign(new_idx);

        let record = seat_of(&mut self.players, player)?;
        self.game.ledger.charge_fee(record, fee)?;
        record.card_index = Some(new_idx);
        record.has_swapped = true;
        record.record_action(now);
        self.game.assigned = assigned;

        self.emit(GameEvent::CardSwapped {
            player: player.clone(),
        });
        self.emit_action(player, ActionKind::Swap, fee);
        debug!("Game {}: {} swapped", self.game.id, player);
        Ok(())
    }

    pub fn end_peek_phase(&mut self, caller: &PlayerId, now: DateTime<Utc>) -> GameResult<()> {
        self.ensure_not_cleaned_up()?;
        self.ensure_keeper(caller)?;
        self.ensure_phase(Phase::PeekPhase)?;
        self.ensure_deadline_elapsed(now)?;

        let deadline = deadline_after(now, self.rules.betting_duration())?;
        self.advance(Phase::Betting);
        self.game.deadline = Some(deadline);
        self.emit(GameEvent::BettingPhaseStarted { deadline });
        info!("Game {} betting until {}", self.game.id, deadline);
        Ok(())
    }

    pub fn bet(&mut self, player: &PlayerId, amount: Chips, now: DateTime<Utc>) -> GameResult<()> {
        self.ensure_not_cleaned_up()?;
        self.ensure_participant(player)?;
        self.ensure_phase(Phase::Betting)?;
        self.ensure_before_deadline(now)?;
        if self.participant(player)?.has_folded {
            return Err(GameError::AlreadyFolded);
        }

        let minimum = self.rules.minimum_bet;
        let record = seat_of(&mut self.players, player)?;
        self.game.ledger.place_bet(record, amount, minimum)?;
        record.record_action(now);

        self.emit(GameEvent::BetPlaced {
            player: player.clone(),
            amount,
        });
        self.emit_action(player, ActionKind::Bet, amount);
        debug!("Game {}: {} bet ${}", self.game.id, player, amount);
        Ok(())
    }

    /// Fold, and if only one player is left standing, pay them the pot and
    /// end the game on the spot.
    pub fn fold(&mut self, player: &PlayerId, now: DateTime<Utc>) -> GameResult<()> {
        self.ensure_not_cleaned_up()?;
        self.ensure_participant(player)?;
        self.ensure_phase(Phase::Betting)?;
        self.ensure_before_deadline(now)?;
        if self.participant(player)?.has_folded {
            return Err(GameError::AlreadyFolded);
        }

        let record = seat_of(&mut self.players, player)?;
        record.has_folded = true;
        record.record_action(now);
        let released = record.card_index;
        if let Some(idx) = released {
            self.game.assigned.unassign(idx);
        }
        self.game.active_player_count -= 1;

        self.emit(GameEvent::PlayerFolded {
            player: player.clone(),
        });
        self.emit_action(player, ActionKind::Fold, 0);
        debug!("Game {}: {} folded", self.game.id, player);

        if self.game.active_player_count == 1 {
            let survivor = self
                .players()
                .find(|(_, record)| record.is_contending())
                .map(|(id, _)| id.clone())
                .ok_or(GameError::NoEligiblePlayers)?;
            self.game.ended_by_fold = true;
            self.finish(survivor)?;
        }
        Ok(())
    }

    /// Reveal every standing card, pay the highest one, and end the game.
    pub fn end_betting_phase(&mut self, caller: &PlayerId, now: DateTime<Utc>) -> GameResult<()> {
        self.ensure_not_cleaned_up()?;
        self.ensure_keeper(caller)?;
        self.ensure_phase(Phase::Betting)?;
        self.ensure_deadline_elapsed(now)?;

        let mut revealed = Vec::with_capacity(self.game.active_player_count);
        for (id, record) in self.players() {
            if !record.is_contending() {
                continue;
            }
            let card = self
                .card_of(id)
                .ok_or_else(|| GameError::InvariantViolation(format!("{id} holds no card")))?;
            revealed.push((id.clone(), card));
        }
        let winner = resolver::resolve(revealed.iter().map(|(id, card)| (id, *card)))
            .map(|(id, _)| id.clone())
            .inspect_err(|e| error!("Game {}: showdown failed: {}", self.game.id, e))?;

        self.advance(Phase::Showdown);
        self.game.deadline = None;
        self.emit(GameEvent::ShowdownStarted);
        for (player, card) in revealed {
            self.emit(GameEvent::CardRevealed { player, card });
        }
        self.finish(winner)
    }

    /// Close out an ended game. Returns the participants whose game
    /// association should be released.
    pub fn cleanup(&mut self, caller: &PlayerId) -> GameResult<Vec<PlayerId>> {
        self.ensure_keeper(caller)?;
        if self.game.is_cleaned_up {
            return Err(GameError::AlreadyCleanedUp);
        }
        self.ensure_phase(Phase::Ended)?;

        self.game.is_cleaned_up = true;
        self.emit(GameEvent::GameCleanedUp);
        info!("Game {} cleaned up", self.game.id);
        Ok(self.game.participants.clone())
    }

    /// Verify the record-level invariants.
    pub fn check_invariants(&self) -> GameResult<()> {
        let violation = |reason: String| -> GameResult<()> {
            error!("Game {}: {}", self.game.id, reason);
            Err(GameError::InvariantViolation(reason))
        };

        if self.game.participants.len() != self.players.len() {
            return violation(format!(
                "{} participants but {} player records",
                self.game.participants.len(),
                self.players.len()
            ));
        }

        let contending = self.players.values().filter(|p| p.is_contending()).count();
        if contending != self.game.active_player_count {
            return violation(format!(
                "active count {} but {} players contending",
                self.game.active_player_count, contending
            ));
        }

        let expected_bits = if self.game.phase.is_dealt() {
            contending
        } else {
            0
        };
        if self.game.assigned.count() != expected_bits {
            return violation(format!(
                "{} cards assigned but expected {}",
                self.game.assigned.count(),
                expected_bits
            ));
        }

        if self.game.phase.is_dealt() {
            let mut held = HashSet::with_capacity(contending);
            for (id, player) in self.players().filter(|(_, p)| p.is_contending()) {
                let Some(idx) = player.card_index else {
                    return violation(format!("{id} holds no card"));
                };
                if !held.insert(idx) || !self.game.assigned.is_assigned(idx) {
                    return violation(format!("card {idx} held by {id} is not uniquely assigned"));
                }
            }
        }

        let expected = u64::from(self.rules.initial_chips) * self.players.len() as u64;
        let accounted = self.game.ledger.circulating(self.players.values())
            + u64::from(self.game.ledger.fees_burned());
        if !self.players.is_empty() && accounted != expected {
            return violation(format!(
                "{accounted} chips accounted for but {expected} were issued"
            ));
        }

        if self.game.is_cleaned_up && self.game.phase != Phase::Ended {
            return violation(format!("cleaned up during {}", self.game.phase));
        }

        Ok(())
    }

    fn seat(&mut self, player: PlayerId, now: DateTime<Utc>) {
        self.players
            .insert(player.clone(), Player::new(self.rules.initial_chips, now));
        self.game.participants.push(player.clone());
        self.game.active_player_count += 1;
        debug!("Game {}: {} joined", self.game.id, player);
        self.emit(GameEvent::PlayerJoined { player });
    }

    fn finish(&mut self, winner: PlayerId) -> GameResult<()> {
        let record = seat_of(&mut self.players, &winner)?;
        let amount = self.game.ledger.award_pot(record)?;
        self.game.winner = Some(winner.clone());
        self.game.deadline = None;
        self.advance(Phase::Ended);

        self.emit(GameEvent::PotAwarded {
            player: winner.clone(),
            amount,
        });
        self.emit(GameEvent::GameEnded {
            winner: Some(winner.clone()),
            by_fold: self.game.ended_by_fold,
        });
        info!("Game {} won by {} for ${}", self.game.id, winner, amount);
        Ok(())
    }

    fn advance(&mut self, next: Phase) {
        debug_assert!(next > self.game.phase, "phases only move forward");
        self.game.phase = next;
    }

    fn emit(&mut self, event: GameEvent) {
        self.events
            .push_back(Notification::public(self.game.id, event));
    }

    fn emit_private(&mut self, player: &PlayerId, event: GameEvent) {
        self.events
            .push_back(Notification::private(self.game.id, player.clone(), event));
    }

    fn emit_action(&mut self, player: &PlayerId, kind: ActionKind, amount: Chips) {
        self.emit_private(
            player,
            GameEvent::PlayerAction {
                player: player.clone(),
                kind,
                amount,
            },
        );
    }

    fn participant(&self, player: &PlayerId) -> GameResult<&Player> {
        self.players
            .get(player)
            .ok_or_else(|| GameError::NotAParticipant(player.clone()))
    }

    fn ensure_participant(&self, player: &PlayerId) -> GameResult<()> {
        self.participant(player).map(|_| ())
    }

    fn ensure_not_cleaned_up(&self) -> GameResult<()> {
        if self.game.is_cleaned_up {
            return Err(GameError::GameCleanedUp(self.game.id));
        }
        Ok(())
    }

    fn ensure_phase(&self, expected: Phase) -> GameResult<()> {
        if self.game.phase != expected {
            return Err(GameError::WrongPhase {
                expected,
                actual: self.game.phase,
            });
        }
        Ok(())
    }

    fn ensure_keeper(&self, caller: &PlayerId) -> GameResult<()> {
        if *caller != self.game.keeper {
            return Err(GameError::NotKeeper);
        }
        Ok(())
    }

    fn current_deadline(&self) -> GameResult<DateTime<Utc>> {
        self.game.deadline.ok_or_else(|| {
            GameError::InvariantViolation(format!("no deadline during {}", self.game.phase))
        })
    }

    fn ensure_before_deadline(&self, now: DateTime<Utc>) -> GameResult<()> {
        let deadline = self.current_deadline()?;
        if now >= deadline {
            return Err(GameError::DeadlinePassed { deadline });
        }
        Ok(())
    }

    fn ensure_deadline_elapsed(&self, now: DateTime<Utc>) -> GameResult<()> {
        let deadline = self.current_deadline()?;
        if now < deadline {
            return Err(GameError::DeadlineNotReached { deadline });
        }
        Ok(())
    }
}

/// `now + duration`, or an error when that falls outside chrono's range.
fn deadline_after(now: DateTime<Utc>, duration: Duration) -> GameResult<DateTime<Utc>> {
    now.checked_add_signed(duration).ok_or_else(|| {
        GameError::InvalidRules(format!("phase of {duration} runs past the end of time"))
    })
}

fn seat_of<'a>(
    players: &'a mut HashMap<PlayerId, Player>,
    player: &PlayerId,
) -> GameResult<&'a mut Player> {
    players
        .get_mut(player)
        .ok_or_else(|| GameError::NotAParticipant(player.clone()))
}
