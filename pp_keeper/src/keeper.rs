//! Deadline-driven scheduler.
//!
//! The engine never advances a game on its own. The keeper periodically
//! looks at every active game and makes the keeper-only calls whose
//! deadlines have passed.

use chrono::{DateTime, Utc};
use peek_poker::{Clock, GameError, GameId, GameRegistry, Phase, PlayerId};
use serde::Serialize;
use std::{sync::Arc, time::Duration};
use tokio::sync::watch;

use crate::logging::{log_transition, log_transition_failure};

/// What one sweep did.
#[derive(Debug, Default, Serialize)]
pub struct SweepReport {
    pub examined: usize,
    pub peek_phases_ended: Vec<GameId>,
    pub betting_phases_ended: Vec<GameId>,
    pub cleaned_up: Vec<GameId>,
    pub failures: Vec<(GameId, GameError)>,
}

impl SweepReport {
    #[must_use]
    pub fn transitions(&self) -> usize {
        self.peek_phases_ended.len() + self.betting_phases_ended.len() + self.cleaned_up.len()
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.transitions() == 0 && self.failures.is_empty()
    }
}

#[derive(Clone, Copy, Debug)]
enum Transition {
    EndPeekPhase,
    EndBettingPhase,
    Cleanup,
}

impl Transition {
    fn name(self) -> &'static str {
        match self {
            Self::EndPeekPhase => "end_peek_phase",
            Self::EndBettingPhase => "end_betting_phase",
            Self::Cleanup => "cleanup",
        }
    }
}

pub struct Keeper {
    registry: Arc<GameRegistry>,
    clock: Arc<dyn Clock>,
    identity: PlayerId,
    interval: Duration,
}

impl Keeper {
    pub fn new(registry: Arc<GameRegistry>, clock: Arc<dyn Clock>, interval: Duration) -> Self {
        let identity = registry.keeper().clone();
        Self {
            registry,
            clock,
            identity,
            interval,
        }
    }

    /// Make every transition that is due at `now`. Failures are recorded
    /// and logged; they never stop the sweep.
    pub async fn sweep(&self, now: DateTime<Utc>) -> SweepReport {
        let spectator = self.registry.spectator();
        let mut report = SweepReport::default();

        for game_id in spectator.list_active_games().await {
            report.examined += 1;
            let summary = match spectator.game_summary(game_id).await {
                Ok(summary) => summary,
                Err(e) => {
                    log::warn!("Keeper could not read game {}: {}", game_id, e);
                    report.failures.push((game_id, e));
                    continue;
                }
            };

            let transition = match summary.phase {
                Phase::PeekPhase if summary.deadline_elapsed(now) => Transition::EndPeekPhase,
                Phase::Betting if summary.deadline_elapsed(now) => Transition::EndBettingPhase,
                Phase::Ended if !summary.is_cleaned_up => Transition::Cleanup,
                _ => continue,
            };

            let result = match transition {
                Transition::EndPeekPhase => {
                    self.registry.end_peek_phase(game_id, &self.identity).await
                }
                Transition::EndBettingPhase => {
                    self.registry
                        .end_betting_phase(game_id, &self.identity)
                        .await
                }
                Transition::Cleanup => self.registry.cleanup(game_id, &self.identity).await,
            };

            match result {
                Ok(()) => {
                    log_transition(game_id, transition.name());
                    match transition {
                        Transition::EndPeekPhase => report.peek_phases_ended.push(game_id),
                        Transition::EndBettingPhase => report.betting_phases_ended.push(game_id),
                        Transition::Cleanup => report.cleaned_up.push(game_id),
                    }
                }
                Err(e) => {
                    log_transition_failure(game_id, transition.name(), &e);
                    report.failures.push((game_id, e));
                }
            }
        }

        report
    }

    /// Sweep on a fixed interval until `shutdown` flips to true.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        tracing::info!(
            keeper = %self.identity,
            interval_ms = self.interval.as_millis() as u64,
            "Keeper running"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let report = self.sweep(self.clock.now()).await;
                    if !report.is_idle() {
                        tracing::debug!(
                            examined = report.examined,
                            transitions = report.transitions(),
                            failures = report.failures.len(),
                            "Sweep finished"
                        );
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::info!("Keeper stopped");
    }
}
