//! Registry configuration.

use serde::{Deserialize, Serialize};

use crate::game::{entities::PlayerId, rules::GameRules};

/// Default capacity of each game actor's inbox.
pub const DEFAULT_INBOX_CAPACITY: usize = 100;

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RegistryConfig {
    /// The only identity allowed to drive deadline transitions and cleanup
    pub keeper: PlayerId,

    /// Rules shared by every game
    pub rules: GameRules,

    /// Pending requests a game actor buffers before callers wait
    pub inbox_capacity: usize,
}

impl RegistryConfig {
    #[must_use]
    pub fn new(keeper: PlayerId) -> Self {
        Self {
            keeper,
            rules: GameRules::default(),
            inbox_capacity: DEFAULT_INBOX_CAPACITY,
        }
    }

    #[must_use]
    pub fn with_rules(mut self, rules: GameRules) -> Self {
        self.rules = rules;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.keeper.as_str().is_empty() {
            return Err("Keeper identity must not be empty".to_string());
        }

        if self.inbox_capacity == 0 {
            return Err("Inbox capacity must be greater than 0".to_string());
        }

        self.rules.validate()
    }
}
