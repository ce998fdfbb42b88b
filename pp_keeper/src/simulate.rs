//! Self-playing games so the keeper has something to keep.
//!
//! Each simulated table runs in its own task and plays game after game:
//! seat two to five players, peek and maybe swap, then bet or fold, and
//! wait for the keeper to close the game before starting the next one.

use peek_poker::{ErrorKind, GameError, GameId, GameRegistry, GameResult, Phase, PlayerId};
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::{sync::Arc, time::Duration};
use tokio::{sync::watch, task::JoinHandle};

/// Chance that a player peeks at their card.
const PEEK_PROBABILITY: f64 = 0.7;

/// Chance that a player who peeked swaps a low card.
const SWAP_PROBABILITY: f64 = 0.5;

/// Card values at or above this are never swapped away.
const KEEP_THRESHOLD: u8 = 9;

/// Chance that a player stays in with a card they don't know.
const BLIND_CALL_PROBABILITY: f64 = 0.6;

pub struct Simulator {
    registry: Arc<GameRegistry>,
    poll: Duration,
}

impl Simulator {
    pub fn new(registry: Arc<GameRegistry>, poll: Duration) -> Self {
        Self { registry, poll }
    }

    /// Spawn `tables` self-playing tables. They stop once `shutdown` flips
    /// to true.
    pub fn spawn(&self, tables: usize, shutdown: &watch::Receiver<bool>) -> Vec<JoinHandle<()>> {
        (0..tables)
            .map(|table| {
                let table = SimTable {
                    registry: self.registry.clone(),
                    poll: self.poll,
                    table,
                    rng: StdRng::from_rng(&mut rand::rng()),
                    shutdown: shutdown.clone(),
                };
                tokio::spawn(table.run())
            })
            .collect()
    }
}

struct SimTable {
    registry: Arc<GameRegistry>,
    poll: Duration,
    table: usize,
    rng: StdRng,
    shutdown: watch::Receiver<bool>,
}

impl SimTable {
    fn player(&self, seat: usize) -> PlayerId {
        PlayerId::new(&format!("sim{}-p{}", self.table, seat))
    }

    fn stopping(&self) -> bool {
        *self.shutdown.borrow()
    }

    async fn run(mut self) {
        tracing::info!(table = self.table, "Simulated table starting");
        let mut played = 0u64;

        while !self.stopping() {
            match self.play_game().await {
                Ok(game_id) => {
                    played += 1;
                    tracing::debug!(table = self.table, game_id, "Simulated game finished");
                }
                Err(e) => {
                    tracing::warn!(table = self.table, "Simulated game failed: {}", e);
                    self.pause().await;
                }
            }
        }

        tracing::info!(table = self.table, played, "Simulated table stopped");
    }

    async fn play_game(&mut self) -> GameResult<GameId> {
        let rules = self.registry.config().rules.clone();
        let seats = self.rng.random_range(rules.min_players..=rules.max_players);
        let players: Vec<PlayerId> = (0..seats).map(|seat| self.player(seat)).collect();

        let game_id = self.registry.create_game(&players[0]).await?;
        for player in &players[1..] {
            self.registry.join_game(game_id, player).await?;
        }
        self.registry.start_game(game_id, &players[0]).await?;

        let mut known = vec![None; seats];
        for (seat, player) in players.iter().enumerate() {
            if !self.rng.random_bool(PEEK_PROBABILITY) {
                continue;
            }
            let card = match self.registry.peek(game_id, player).await {
                Ok(card) => card,
                Err(e) if e.kind() == ErrorKind::Timing => break,
                Err(e) => return Err(e),
            };
            known[seat] = Some(card.value());
            if card.value() < KEEP_THRESHOLD && self.rng.random_bool(SWAP_PROBABILITY) {
                match self.registry.swap(game_id, player).await {
                    Ok(()) => known[seat] = None,
                    Err(e) if e.kind() == ErrorKind::Timing => break,
                    Err(e) => return Err(e),
                }
            }
        }

        if !self.wait_for(game_id, |phase| phase >= Phase::Betting).await? {
            return Ok(game_id);
        }

        for (seat, player) in players.iter().enumerate() {
            let stay = match known[seat] {
                Some(value) => value >= KEEP_THRESHOLD,
                None => self.rng.random_bool(BLIND_CALL_PROBABILITY),
            };
            let result = if stay {
                let table_bet = self
                    .registry
                    .spectator()
                    .game_summary(game_id)
                    .await?
                    .table_bet;
                let amount = table_bet.max(rules.minimum_bet);
                match self.registry.bet(game_id, player, amount).await {
                    Err(GameError::InsufficientChips { .. }) => {
                        self.registry.fold(game_id, player).await
                    }
                    other => other,
                }
            } else {
                self.registry.fold(game_id, player).await
            };

            match result {
                Ok(()) => {}
                // A fold can end the game before everyone has acted.
                Err(e) if matches!(e.kind(), ErrorKind::State | ErrorKind::Timing) => break,
                Err(e) => return Err(e),
            }
        }

        self.wait_for(game_id, |_| false).await?;
        Ok(game_id)
    }

    /// Poll until `ready` holds for the game's phase or the game has been
    /// cleaned up. Returns false if the game was cleaned up first or the
    /// table is shutting down.
    async fn wait_for(&mut self, game_id: GameId, ready: impl Fn(Phase) -> bool) -> GameResult<bool> {
        loop {
            let summary = self.registry.spectator().game_summary(game_id).await?;
            if summary.is_cleaned_up || self.stopping() {
                return Ok(false);
            }
            if ready(summary.phase) {
                return Ok(true);
            }
            self.pause().await;
        }
    }

    async fn pause(&mut self) {
        tokio::select! {
            _ = tokio::time::sleep(self.poll) => {}
            _ = self.shutdown.changed() => {}
        }
    }
}
