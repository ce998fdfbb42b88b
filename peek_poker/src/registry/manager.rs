//! Game registry for spawning and routing to game actors.

use super::{
    actor::{GameActor, GameHandle},
    config::RegistryConfig,
};
use crate::{
    clock::{Clock, SystemClock},
    entropy::{EntropySource, OsEntropy},
    game::{
        entities::{Card, Chips, GameId, PlayerId},
        errors::{GameError, GameResult},
        events::{LogSink, NotificationSink},
        state_machine::{GameStateMachine, LeaveOutcome},
    },
    spectator::SpectatorView,
};
use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
};
use tokio::sync::{Mutex, RwLock};

/// Registry of every game, and the only owner of the participant to game
/// association.
///
/// Lock order is `participants`, then `next_game_id`, then `games`, then
/// `active_games`. No method takes `participants` while holding another of
/// these locks.
pub struct GameRegistry {
    config: RegistryConfig,

    /// Participant to game, at most one game each
    participants: Mutex<HashMap<PlayerId, GameId>>,

    next_game_id: RwLock<GameId>,

    /// Every game ever created. Cleaned-up games stay reachable.
    games: RwLock<HashMap<GameId, GameHandle>>,

    /// Games that have not been cleaned up
    active_games: RwLock<BTreeSet<GameId>>,

    clock: Arc<dyn Clock>,
    entropy: Arc<dyn EntropySource>,
    sink: Arc<dyn NotificationSink>,
}

impl GameRegistry {
    /// Create a registry with the system clock, OS entropy, and a logging
    /// sink.
    pub fn new(config: RegistryConfig) -> GameResult<Self> {
        config.validate().map_err(GameError::InvalidRules)?;
        Ok(Self {
            config,
            participants: Mutex::new(HashMap::new()),
            next_game_id: RwLock::new(1),
            games: RwLock::new(HashMap::new()),
            active_games: RwLock::new(BTreeSet::new()),
            clock: Arc::new(SystemClock),
            entropy: Arc::new(OsEntropy),
            sink: Arc::new(LogSink),
        })
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_entropy(mut self, entropy: Arc<dyn EntropySource>) -> Self {
        self.entropy = entropy;
        self
    }

    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sink = sink;
        self
    }

    #[must_use]
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    #[must_use]
    pub fn keeper(&self) -> &PlayerId {
        &self.config.keeper
    }

    #[must_use]
    pub fn spectator(&self) -> SpectatorView<'_> {
        SpectatorView::new(self)
    }

    /// Create a game with `creator` seated in it.
    pub async fn create_game(&self, creator: &PlayerId) -> GameResult<GameId> {
        let mut participants = self.participants.lock().await;
        if let Some(&existing) = participants.get(creator) {
            return Err(GameError::AlreadyInGame(creator.clone(), existing));
        }

        let mut next_id = self.next_game_id.write().await;
        let game_id = *next_id;
        *next_id += 1;
        drop(next_id);

        let machine = GameStateMachine::new(
            game_id,
            creator.clone(),
            self.config.keeper.clone(),
            self.config.rules.clone(),
            self.clock.now(),
        );
        let (actor, handle) = GameActor::new(
            machine,
            self.config.inbox_capacity,
            self.clock.clone(),
            self.entropy.clone(),
            self.sink.clone(),
        );

        self.games.write().await.insert(game_id, handle);
        self.active_games.write().await.insert(game_id);
        participants.insert(creator.clone(), game_id);
        drop(participants);

        tokio::spawn(async move {
            actor.run().await;
        });

        log::info!("Created game {} for {}", game_id, creator);
        Ok(game_id)
    }

    /// Seat `player` in a game that hasn't started.
    ///
    /// The player is reserved for the game before the game is asked, and the
    /// reservation is rolled back if the game refuses, so concurrent joins
    /// can never seat one player in two games.
    pub async fn join_game(&self, game_id: GameId, player: &PlayerId) -> GameResult<()> {
        let handle = self.handle(game_id).await?;

        {
            let mut participants = self.participants.lock().await;
            if let Some(&existing) = participants.get(player) {
                return Err(GameError::AlreadyInGame(player.clone(), existing));
            }
            participants.insert(player.clone(), game_id);
        }

        let result = handle.join(player.clone()).await;
        if result.is_err() {
            self.release(game_id, std::slice::from_ref(player)).await;
        }
        result
    }

    pub async fn leave_game(&self, game_id: GameId, player: &PlayerId) -> GameResult<()> {
        let handle = self.handle(game_id).await?;
        let outcome = handle.leave(player.clone()).await?;
        self.release(game_id, std::slice::from_ref(player)).await;
        if outcome == LeaveOutcome::Abandoned {
            self.active_games.write().await.remove(&game_id);
        }
        Ok(())
    }

    pub async fn start_game(&self, game_id: GameId, caller: &PlayerId) -> GameResult<()> {
        self.handle(game_id).await?.start(caller.clone()).await
    }

    pub async fn peek(&self, game_id: GameId, player: &PlayerId) -> GameResult<Card> {
        self.handle(game_id).await?.peek(player.clone()).await
    }

    pub async fn swap(&self, game_id: GameId, player: &PlayerId) -> GameResult<()> {
        self.handle(game_id).await?.swap(player.clone()).await
    }

    pub async fn end_peek_phase(&self, game_id: GameId, caller: &PlayerId) -> GameResult<()> {
        self.handle(game_id)
            .await?
            .end_peek_phase(caller.clone())
            .await
    }

    pub async fn bet(&self, game_id: GameId, player: &PlayerId, amount: Chips) -> GameResult<()> {
        self.handle(game_id).await?.bet(player.clone(), amount).await
    }

    pub async fn fold(&self, game_id: GameId, player: &PlayerId) -> GameResult<()> {
        self.handle(game_id).await?.fold(player.clone()).await
    }

    pub async fn end_betting_phase(&self, game_id: GameId, caller: &PlayerId) -> GameResult<()> {
        self.handle(game_id)
            .await?
            .end_betting_phase(caller.clone())
            .await
    }

    /// Close out an ended game and free its participants to join others.
    pub async fn cleanup(&self, game_id: GameId, caller: &PlayerId) -> GameResult<()> {
        let released = self.handle(game_id).await?.cleanup(caller.clone()).await?;
        self.release(game_id, &released).await;
        self.active_games.write().await.remove(&game_id);
        Ok(())
    }

    /// The game `player` is currently associated with.
    pub async fn game_of(&self, player: &PlayerId) -> Option<GameId> {
        self.participants.lock().await.get(player).copied()
    }

    /// Games that have not been cleaned up, in id order.
    pub async fn list_active_games(&self) -> Vec<GameId> {
        self.active_games.read().await.iter().copied().collect()
    }

    /// Check every active game, and that the participant index agrees with
    /// the games' own participant lists.
    pub async fn check_invariants(&self) -> GameResult<()> {
        let associations = self.participants.lock().await.clone();
        let mut seated: HashMap<PlayerId, GameId> = HashMap::with_capacity(associations.len());

        for game_id in self.list_active_games().await {
            let handle = self.handle(game_id).await?;
            handle.check_invariants().await?;
            let summary = handle.summary().await?;
            for player in summary.participants {
                if let Some(other) = seated.insert(player.clone(), game_id) {
                    return Err(GameError::InvariantViolation(format!(
                        "{player} is seated in games {other} and {game_id}"
                    )));
                }
            }
        }

        if seated != associations {
            return Err(GameError::InvariantViolation(
                "participant index disagrees with game rosters".to_string(),
            ));
        }
        Ok(())
    }

    pub(crate) async fn handle(&self, game_id: GameId) -> GameResult<GameHandle> {
        self.games
            .read()
            .await
            .get(&game_id)
            .cloned()
            .ok_or(GameError::GameNotFound(game_id))
    }

    /// Drop the association of each player that still points at `game_id`.
    async fn release(&self, game_id: GameId, players: &[PlayerId]) {
        let mut participants = self.participants.lock().await;
        for player in players {
            if participants.get(player) == Some(&game_id) {
                participants.remove(player);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        clock::ManualClock,
        entropy::SeededEntropy,
        game::{events::MemorySink, rules::GameRules},
    };
    use chrono::{Duration, Utc};

    fn id(name: &str) -> PlayerId {
        PlayerId::new(name)
    }

    fn registry() -> (GameRegistry, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let registry = GameRegistry::new(RegistryConfig::new(id("keeper")))
            .unwrap()
            .with_clock(clock.clone())
            .with_entropy(Arc::new(SeededEntropy::new(99)))
            .with_sink(Arc::new(MemorySink::new()));
        (registry, clock)
    }

    #[tokio::test]
    async fn test_sequential_game_ids() {
        let (registry, _) = registry();
        assert_eq!(registry.create_game(&id("alice")).await, Ok(1));
        assert_eq!(registry.create_game(&id("bob")).await, Ok(2));
        assert_eq!(registry.list_active_games().await, vec![1, 2]);
        assert_eq!(registry.game_of(&id("bob")).await, Some(2));
    }

    #[tokio::test]
    async fn test_create_game_publishes_before_returning() {
        let sink = Arc::new(MemorySink::new());
        let registry = GameRegistry::new(RegistryConfig::new(id("keeper")))
            .unwrap()
            .with_sink(sink.clone());
        let game = registry.create_game(&id("alice")).await.unwrap();

        let events = sink.snapshot();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|n| n.game_id == game));
    }

    #[tokio::test]
    async fn test_rules_that_would_overflow_are_refused() {
        let rules = GameRules {
            peek_duration_secs: 1_000_000_000_000_000,
            ..GameRules::default()
        };
        let result = GameRegistry::new(RegistryConfig::new(id("keeper")).with_rules(rules));
        assert!(matches!(result, Err(GameError::InvalidRules(_))));

        let rules = GameRules {
            initial_chips: Chips::MAX,
            ..GameRules::default()
        };
        let result = GameRegistry::new(RegistryConfig::new(id("keeper")).with_rules(rules));
        assert!(matches!(result, Err(GameError::InvalidRules(_))));
    }

    #[tokio::test]
    async fn test_one_game_per_participant() {
        let (registry, _) = registry();
        let first = registry.create_game(&id("alice")).await.unwrap();
        let second = registry.create_game(&id("bob")).await.unwrap();
        assert_eq!(
            registry.create_game(&id("alice")).await,
            Err(GameError::AlreadyInGame(id("alice"), first))
        );
        assert_eq!(
            registry.join_game(second, &id("alice")).await,
            Err(GameError::AlreadyInGame(id("alice"), first))
        );
        registry.check_invariants().await.unwrap();
    }

    #[tokio::test]
    async fn test_rejected_join_rolls_back_reservation() {
        let (registry, _) = registry();
        let game = registry.create_game(&id("alice")).await.unwrap();
        registry.join_game(game, &id("bob")).await.unwrap();
        registry.start_game(game, &id("alice")).await.unwrap();

        assert!(registry.join_game(game, &id("carol")).await.is_err());
        assert_eq!(registry.game_of(&id("carol")).await, None);
        assert_eq!(
            registry.join_game(99, &id("carol")).await,
            Err(GameError::GameNotFound(99))
        );
        registry.check_invariants().await.unwrap();
    }

    #[tokio::test]
    async fn test_leave_releases_association() {
        let (registry, _) = registry();
        let game = registry.create_game(&id("alice")).await.unwrap();
        registry.join_game(game, &id("bob")).await.unwrap();
        registry.leave_game(game, &id("bob")).await.unwrap();
        assert_eq!(registry.game_of(&id("bob")).await, None);

        registry.leave_game(game, &id("alice")).await.unwrap();
        assert!(registry.list_active_games().await.is_empty());
        assert_eq!(registry.game_of(&id("alice")).await, None);
        assert_eq!(
            registry.join_game(game, &id("bob")).await,
            Err(GameError::GameCleanedUp(game))
        );
        registry.check_invariants().await.unwrap();
    }

    #[tokio::test]
    async fn test_cleanup_frees_players() {
        let (registry, clock) = registry();
        let keeper = id("keeper");
        let game = registry.create_game(&id("alice")).await.unwrap();
        registry.join_game(game, &id("bob")).await.unwrap();
        registry.start_game(game, &id("alice")).await.unwrap();
        clock.advance(Duration::seconds(60));
        registry.end_peek_phase(game, &keeper).await.unwrap();
        registry.fold(game, &id("bob")).await.unwrap();
        registry.cleanup(game, &keeper).await.unwrap();

        assert!(registry.list_active_games().await.is_empty());
        assert_eq!(registry.game_of(&id("alice")).await, None);
        assert!(registry.create_game(&id("alice")).await.is_ok());
        assert_eq!(
            registry.cleanup(game, &keeper).await,
            Err(GameError::AlreadyCleanedUp)
        );
        registry.check_invariants().await.unwrap();
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let result = GameRegistry::new(RegistryConfig::new(id("")));
        assert!(matches!(result, Err(GameError::InvalidRules(_))));
    }
}
