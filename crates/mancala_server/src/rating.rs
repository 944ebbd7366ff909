//! Elo rating updates for finished matches.

use std::sync::Arc;

use chrono::Utc;
use mancala_engine::{GameStatus, Side};
use tracing::{debug, info, instrument, warn};

use crate::store::Store;
use crate::{GameError, GameErrorKind, Match, Outcome, RatingUpdate};

/// Maximum change of a single rating update.
pub const K_FACTOR: f64 = 32.0;

/// Expected score of a player rated `own` against one rated `other`.
pub fn expected_score(own: i32, other: i32) -> f64 {
    1.0 / (1.0 + 10f64.powf(f64::from(other - own) / 400.0))
}

/// New score after a game with `outcome` against a player rated `other`.
pub fn rated_score(own: i32, other: i32, outcome: Outcome) -> i32 {
    let change = K_FACTOR * (outcome.actual_score() - expected_score(own, other));
    (f64::from(own) + change).round() as i32
}

/// Applies rating updates for finished matches.
#[derive(Debug, Clone)]
pub struct RatingEngine {
    store: Arc<dyn Store>,
}

impl RatingEngine {
    /// Creates a rating engine backed by `store`.
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Computes and stores both participants' new ratings.
    ///
    /// Both records change together in one store operation keyed by the
    /// match id. Returns `false` if this match was already rated.
    ///
    /// # Errors
    ///
    /// Returns [`GameError`] if the match is not finished, a participant is
    /// unknown, or the store fails.
    #[instrument(skip(self, record), fields(match_id = %record.id()))]
    pub async fn apply(&self, record: &Match) -> Result<bool, GameError> {
        if *record.status() != GameStatus::Finished {
            warn!("Refusing to rate an active match");
            return Err(GameErrorKind::NotFound(format!("Finished match {}", record.id())).into());
        }

        let a = record.player_on(Side::A);
        let b = record.player_on(Side::B);
        let score_a = *self
            .store
            .player(a)
            .await?
            .ok_or_else(|| GameError::new(GameErrorKind::NotFound(format!("Player {}", a))))?
            .score();
        let score_b = *self
            .store
            .player(b)
            .await?
            .ok_or_else(|| GameError::new(GameErrorKind::NotFound(format!("Player {}", b))))?
            .score();

        let outcome_a = Outcome::for_side(record.board(), Side::A);
        let outcome_b = Outcome::for_side(record.board(), Side::B);
        let delta_a = rated_score(score_a, score_b, outcome_a) - score_a;
        let delta_b = rated_score(score_b, score_a, outcome_b) - score_b;
        debug!(score_a, score_b, delta_a, delta_b, "Computed rating deltas");

        let now = Utc::now();
        let updates = [
            RatingUpdate::new(a.clone(), delta_a, outcome_a, now),
            RatingUpdate::new(b.clone(), delta_b, outcome_b, now),
        ];
        let applied = self.store.apply_rating(record.id(), &updates).await?;

        if applied {
            info!(%outcome_a, delta_a, delta_b, "Ratings applied");
        } else {
            debug!("Ratings already applied for this match");
        }
        Ok(applied)
    }
}
