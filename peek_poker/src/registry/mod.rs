//! Game registry running one async actor per game.
//!
//! This module implements:
//! - GameActor: owns a single game's state machine behind an mpsc inbox
//! - GameRegistry: creates games, routes calls, and owns the
//!   participant to game association
//! - Message-based communication with tokio channels
//!
//! ## Architecture
//!
//! Each game runs in its own Tokio task. Calls against one game are
//! serialized by its inbox; calls against different games run in parallel.
//! Deadline-gated transitions are plain calls made by an external keeper.
//!
//! ## Example
//!
//! ```no_run
//! use peek_poker::{GameRegistry, PlayerId, RegistryConfig};
//!
//! # async fn demo() -> peek_poker::GameResult<()> {
//! let registry = GameRegistry::new(RegistryConfig::new(PlayerId::new("keeper")))?;
//! let alice = PlayerId::new("alice");
//! let game = registry.create_game(&alice).await?;
//! registry.join_game(game, &PlayerId::new("bob")).await?;
//! registry.start_game(game, &alice).await?;
//! let card = registry.peek(game, &alice).await?;
//! println!("alice holds {card}");
//! # Ok(())
//! # }
//! ```

pub mod actor;
pub mod config;
pub mod manager;
pub mod messages;

pub use actor::{GameActor, GameHandle};
pub use config::{DEFAULT_INBOX_CAPACITY, RegistryConfig};
pub use manager::GameRegistry;
pub use messages::GameMessage;
