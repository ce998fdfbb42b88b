//! Game actor implementation with async message handling.

use super::messages::{GameMessage, Reply};
use crate::{
    clock::Clock,
    entropy::{EntropySource, rng_from},
    game::{
        entities::{Card, Chips, GameId, PlayerId},
        errors::{GameError, GameResult},
        events::NotificationSink,
        state_machine::{GameStateMachine, LeaveOutcome},
    },
    spectator::{GameSummary, PlayerView, RevealedCard},
};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Game actor handle for sending messages
#[derive(Clone, Debug)]
pub struct GameHandle {
    sender: mpsc::Sender<GameMessage>,
    game_id: GameId,
}

impl GameHandle {
    pub fn new(sender: mpsc::Sender<GameMessage>, game_id: GameId) -> Self {
        Self { sender, game_id }
    }

    pub fn game_id(&self) -> GameId {
        self.game_id
    }

    /// Send a message and wait for the actor's reply. A closed inbox or a
    /// dropped reply both mean the actor is gone.
    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> GameMessage,
    ) -> GameResult<T> {
        let (response, receiver) = oneshot::channel();
        self.sender
            .send(build(response))
            .await
            .map_err(|_| GameError::GameUnavailable(self.game_id))?;
        receiver
            .await
            .map_err(|_| GameError::GameUnavailable(self.game_id))
    }

    pub async fn join(&self, player: PlayerId) -> GameResult<()> {
        self.request(|response| GameMessage::Join { player, response })
            .await?
    }

    pub async fn leave(&self, player: PlayerId) -> GameResult<LeaveOutcome> {
        self.request(|response| GameMessage::Leave { player, response })
            .await?
    }

    pub async fn start(&self, caller: PlayerId) -> GameResult<()> {
        self.request(|response| GameMessage::Start { caller, response })
            .await?
    }

    pub async fn peek(&self, player: PlayerId) -> GameResult<Card> {
        self.request(|response| GameMessage::Peek { player, response })
            .await?
    }

    pub async fn swap(&self, player: PlayerId) -> GameResult<()> {
        self.request(|response| GameMessage::Swap { player, response })
            .await?
    }

    pub async fn end_peek_phase(&self, caller: PlayerId) -> GameResult<()> {
        self.request(|response| GameMessage::EndPeekPhase { caller, response })
            .await?
    }

    pub async fn bet(&self, player: PlayerId, amount: Chips) -> GameResult<()> {
        self.request(|response| GameMessage::Bet {
            player,
            amount,
            response,
        })
        .await?
    }

    pub async fn fold(&self, player: PlayerId) -> GameResult<()> {
        self.request(|response| GameMessage::Fold { player, response })
            .await?
    }

    pub async fn end_betting_phase(&self, caller: PlayerId) -> GameResult<()> {
        self.request(|response| GameMessage::EndBettingPhase { caller, response })
            .await?
    }

    pub async fn cleanup(&self, caller: PlayerId) -> GameResult<Vec<PlayerId>> {
        self.request(|response| GameMessage::Cleanup { caller, response })
            .await?
    }

    pub async fn summary(&self) -> GameResult<GameSummary> {
        self.request(|response| GameMessage::Summary { response })
            .await
    }

    pub async fn player_view(&self, player: PlayerId, viewer: PlayerId) -> GameResult<PlayerView> {
        self.request(|response| GameMessage::PlayerView {
            player,
            viewer,
            response,
        })
        .await?
    }

    pub async fn player_views(&self, viewer: PlayerId) -> GameResult<Vec<PlayerView>> {
        self.request(|response| GameMessage::PlayerViews { viewer, response })
            .await
    }

    pub async fn revealed_cards(&self) -> GameResult<Vec<RevealedCard>> {
        self.request(|response| GameMessage::RevealedCards { response })
            .await
    }

    pub async fn check_invariants(&self) -> GameResult<()> {
        self.request(|response| GameMessage::CheckInvariants { response })
            .await?
    }
}

/// Actor owning a single game. Requests against the same game are handled
/// one at a time in arrival order.
pub struct GameActor {
    machine: GameStateMachine,

    /// Message inbox
    inbox: mpsc::Receiver<GameMessage>,

    clock: Arc<dyn Clock>,

    entropy: Arc<dyn EntropySource>,

    sink: Arc<dyn NotificationSink>,
}

impl GameActor {
    /// Create a new game actor
    ///
    /// # Returns
    ///
    /// * `(GameActor, GameHandle)` - Actor and handle for sending messages
    pub fn new(
        machine: GameStateMachine,
        inbox_capacity: usize,
        clock: Arc<dyn Clock>,
        entropy: Arc<dyn EntropySource>,
        sink: Arc<dyn NotificationSink>,
    ) -> (Self, GameHandle) {
        let (sender, inbox) = mpsc::channel(inbox_capacity);
        let handle = GameHandle::new(sender, machine.id());
        let mut actor = Self {
            machine,
            inbox,
            clock,
            entropy,
            sink,
        };
        // Events queued at construction are out before anyone holds the handle.
        actor.flush();
        (actor, handle)
    }

    /// Run the actor until every handle is dropped.
    pub async fn run(mut self) {
        log::debug!("Game {} actor starting", self.machine.id());

        while let Some(message) = self.inbox.recv().await {
            self.handle_message(message).await;
        }

        log::debug!("Game {} actor stopped", self.machine.id());
    }

    async fn handle_message(&mut self, message: GameMessage) {
        let operation = message.name();
        log::trace!("Game {}: {}", self.machine.id(), operation);
        let now = self.clock.now();
        match message {
            GameMessage::Join { player, response } => {
                let result = self.machine.join(&player, now);
                self.commit(response, result, operation);
            }

            GameMessage::Leave { player, response } => {
                let result = self.machine.leave(&player);
                self.commit(response, result, operation);
            }

            GameMessage::Start { caller, response } => {
                let result = match rng_from(self.entropy.as_ref()).await {
                    Ok(mut rng) => self.machine.start(&caller, self.clock.now(), &mut rng),
                    Err(e) => Err(e),
                };
                self.commit(response, result, operation);
            }

            GameMessage::Peek { player, response } => {
                let result = self.machine.peek(&player, now);
                self.commit(response, result, operation);
            }

            GameMessage::Swap { player, response } => {
                let result = match rng_from(self.entropy.as_ref()).await {
                    Ok(mut rng) => self.machine.swap(&player, self.clock.now(), &mut rng),
                    Err(e) => Err(e),
                };
                self.commit(response, result, operation);
            }

            GameMessage::EndPeekPhase { caller, response } => {
                let result = self.machine.end_peek_phase(&caller, now);
                self.commit(response, result, operation);
            }

            GameMessage::Bet {
                player,
                amount,
                response,
            } => {
                let result = self.machine.bet(&player, amount, now);
                self.commit(response, result, operation);
            }

            GameMessage::Fold { player, response } => {
                let result = self.machine.fold(&player, now);
                self.commit(response, result, operation);
            }

            GameMessage::EndBettingPhase { caller, response } => {
                let result = self.machine.end_betting_phase(&caller, now);
                self.commit(response, result, operation);
            }

            GameMessage::Cleanup { caller, response } => {
                let result = self.machine.cleanup(&caller);
                self.commit(response, result, operation);
            }

            GameMessage::Summary { response } => {
                let _ = response.send(GameSummary::of(&self.machine));
            }

            GameMessage::PlayerView {
                player,
                viewer,
                response,
            } => {
                reply(response, PlayerView::of(&self.machine, &player, &viewer));
            }

            GameMessage::PlayerViews { viewer, response } => {
                let _ = response.send(PlayerView::all(&self.machine, &viewer));
            }

            GameMessage::RevealedCards { response } => {
                let _ = response.send(RevealedCard::all(&self.machine));
            }

            GameMessage::CheckInvariants { response } => {
                reply(response, self.machine.check_invariants());
            }
        }
    }

    /// Publish what a mutation emitted, then answer the caller. A caller
    /// that sees the reply can rely on the sink already holding the events.
    /// A mutation that leaves the game inconsistent is answered with the
    /// violation instead of its result.
    fn commit<T>(
        &mut self,
        response: Reply<T>,
        result: GameResult<T>,
        operation: &'static str,
    ) {
        let result = result.and_then(|value| {
            self.flush();
            self.machine
                .check_invariants()
                .inspect_err(|e| {
                    log::error!(
                        "Game {}: invariants broken after {}: {}",
                        self.machine.id(),
                        operation,
                        e
                    );
                })
                .map(|()| value)
        });
        reply(response, result);
    }

    /// Hand every pending notification to the sink.
    fn flush(&mut self) {
        for notification in self.machine.drain_events() {
            self.sink.publish(notification);
        }
    }
}

fn reply<T>(response: Reply<T>, result: GameResult<T>) {
    if response.send(result).is_err() {
        log::debug!("Caller went away before the reply was sent");
    }
}
