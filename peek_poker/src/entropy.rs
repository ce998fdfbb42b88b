//! Randomness sources for shuffling and swap draws.
//!
//! A game never keeps an RNG between operations. Each randomized operation
//! awaits a fresh 32-byte seed and builds a [`StdRng`] from it, so the
//! source can be an external beacon that no participant controls.

use async_trait::async_trait;
use rand::{Rng, RngCore, SeedableRng, rngs::StdRng};
use std::sync::{Mutex, PoisonError};

use crate::game::errors::GameResult;

pub type Seed = [u8; 32];

#[async_trait]
pub trait EntropySource: Send + Sync {
    /// Produce a fresh seed. Fails with
    /// [`GameError::EntropyUnavailable`](crate::game::GameError::EntropyUnavailable)
    /// if the source can't be reached.
    async fn seed(&self) -> GameResult<Seed>;
}

/// Seeds drawn from the thread-local, OS-seeded CSPRNG.
#[derive(Clone, Copy, Debug, Default)]
pub struct OsEntropy;

#[async_trait]
impl EntropySource for OsEntropy {
    async fn seed(&self) -> GameResult<Seed> {
        let mut seed = Seed::default();
        rand::rng().fill(&mut seed);
        Ok(seed)
    }
}

/// Reproducible seeds for tests and simulations.
#[derive(Debug)]
pub struct SeededEntropy {
    rng: Mutex<StdRng>,
}

impl SeededEntropy {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

#[async_trait]
impl EntropySource for SeededEntropy {
    async fn seed(&self) -> GameResult<Seed> {
        let mut seed = Seed::default();
        self.rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .fill_bytes(&mut seed);
        Ok(seed)
    }
}

/// Build the RNG for one randomized operation.
pub async fn rng_from(source: &dyn EntropySource) -> GameResult<StdRng> {
    Ok(StdRng::from_seed(source.seed().await?))
}
