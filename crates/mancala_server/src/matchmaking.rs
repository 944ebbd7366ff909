//! Opponent selection for new matches.

use rand::seq::IndexedRandom;
use tracing::{debug, instrument};

use crate::PlayerId;

/// Chooses an opponent for a player who needs a new match.
pub trait MatchmakingPolicy: Send + Sync + std::fmt::Debug {
    /// Picks one of `candidates` for `requester`, or `None` if nobody fits.
    ///
    /// `candidates` never contains the requester.
    fn pick_opponent(&self, requester: &str, candidates: &[PlayerId]) -> Option<PlayerId>;
}

/// Uniform random choice with no weighting.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformRandom;

impl MatchmakingPolicy for UniformRandom {
    #[instrument(skip(self, candidates), fields(candidates = candidates.len()))]
    fn pick_opponent(&self, requester: &str, candidates: &[PlayerId]) -> Option<PlayerId> {
        let picked = candidates.choose(&mut rand::rng()).cloned();
        debug!(?picked, "Opponent picked");
        picked
    }
}
