//! Matchmaking, turn selection and move submission.

use std::sync::Arc;

use chrono::Utc;
use mancala_engine::{
    Board, GameStatus, InvariantSet, MoveError, MoveInvariants, Side, apply_move,
    denormalize_pit, normalize,
};
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};

use crate::matchmaking::{MatchmakingPolicy, UniformRandom};
use crate::notifier::FinishNotifier;
use crate::rating::RatingEngine;
use crate::store::Store;
use crate::{GameError, GameErrorKind, Match, Outcome, PlayerId, TurnToken};

/// A match as seen by one participant, who always plays side A.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnView {
    /// Handle for submitting moves; stable for the life of the match.
    pub turn_token: TurnToken,
    /// Board normalized so the requester's pits are 0-5 and store is 6.
    pub board: Board,
    /// Whether the requester is to move.
    pub your_turn: bool,
    /// Match status.
    pub status: GameStatus,
    /// Requester's result once the match is finished.
    pub outcome: Option<Outcome>,
}

impl TurnView {
    fn new(record: &Match, side: Side) -> Self {
        let finished = *record.status() == GameStatus::Finished;
        Self {
            turn_token: record.turn_token().clone(),
            board: normalize(record.board(), side),
            your_turn: record.is_turn_of(record.player_on(side)),
            status: *record.status(),
            outcome: finished.then(|| Outcome::for_side(record.board(), side)),
        }
    }
}

fn invalid_pit(pit: usize, reason: &str) -> GameError {
    GameError::new(GameErrorKind::InvalidPit {
        pit,
        reason: reason.to_string(),
    })
}

/// Drives each player's matches: finds or creates a match to play and
/// applies submitted moves.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    store: Arc<dyn Store>,
    policy: Arc<dyn MatchmakingPolicy>,
    ratings: RatingEngine,
    notifier: FinishNotifier,
    max_waiting_matches: usize,
}

impl Orchestrator {
    /// Creates an orchestrator with uniform random matchmaking.
    #[instrument(skip(store, notifier))]
    pub fn new(store: Arc<dyn Store>, notifier: FinishNotifier, max_waiting_matches: usize) -> Self {
        info!("Creating orchestrator");
        Self {
            ratings: RatingEngine::new(Arc::clone(&store)),
            store,
            policy: Arc::new(UniformRandom),
            notifier,
            max_waiting_matches,
        }
    }

    /// Replaces the matchmaking policy.
    pub fn with_policy(mut self, policy: Arc<dyn MatchmakingPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Notifier receiving finished matches.
    pub fn notifier(&self) -> &FinishNotifier {
        &self.notifier
    }

    /// Returns a match in which it is `player`'s turn, creating one if needed.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the player has no profile
    /// - `Backpressure` if too many of the player's matches wait on opponents
    /// - `NoOpponent` if nobody else is in the matchmaking pool
    #[instrument(skip(self))]
    pub async fn get_turn(&self, player: &str) -> Result<TurnView, GameError> {
        if self.store.player(player).await?.is_none() {
            warn!("Unknown player requested a turn");
            return Err(GameErrorKind::NotFound(format!("Player {}", player)).into());
        }

        if self.store.register_active(player).await? {
            info!("Player joined the matchmaking pool");
        }

        let (ready, waiting): (Vec<Match>, Vec<Match>) = self
            .store
            .active_matches_for(player)
            .await?
            .into_iter()
            .partition(|m| m.is_turn_of(player));
        debug!(ready = ready.len(), waiting = waiting.len(), "Loaded active matches");

        let picked = ready.choose(&mut rand::rng()).cloned();
        if let Some(record) = picked {
            let side = record
                .side_of(player)
                .ok_or_else(|| GameError::new(GameErrorKind::Forbidden(player.to_string())))?;
            debug!(match_id = %record.id(), "Resuming match");
            return Ok(TurnView::new(&record, side));
        }

        if waiting.len() > self.max_waiting_matches {
            warn!(waiting = waiting.len(), "Too many matches waiting on opponents");
            return Err(GameErrorKind::Backpressure {
                waiting: waiting.len(),
                ceiling: self.max_waiting_matches,
            }
            .into());
        }

        let candidates: Vec<PlayerId> = self
            .store
            .active_players()
            .await?
            .into_iter()
            .filter(|id| id != player)
            .collect();
        let opponent = self
            .policy
            .pick_opponent(player, &candidates)
            .ok_or_else(|| GameError::new(GameErrorKind::NoOpponent))?;

        let record = Match::new(player.to_string(), opponent);
        self.store.insert_match(&record).await?;
        info!(
            match_id = %record.id(),
            opponent = %record.player_on(Side::B),
            "Created match"
        );

        Ok(TurnView::new(&record, Side::A))
    }

    /// Applies `player`'s move at `relative_pit` in the match behind `turn_token`.
    ///
    /// Checks run in order: match exists, player participates, match is
    /// active, it is the player's turn, the pit is valid. Nothing is written
    /// unless every check passes.
    ///
    /// A participant submitting against a finished match first retries its
    /// settlement, so a rating write that failed after the final move is
    /// completed by the next request that touches the match.
    ///
    /// # Errors
    ///
    /// `NotFound`, `Forbidden`, `MatchFinished`, `NotYourTurn`, `InvalidPit`,
    /// `Conflict` if a concurrent submission advanced the match first, or
    /// `Internal` on storage failure.
    #[instrument(skip(self))]
    pub async fn submit_move(
        &self,
        player: &str,
        turn_token: &str,
        relative_pit: usize,
    ) -> Result<TurnView, GameError> {
        let mut record = self
            .store
            .match_by_token(turn_token)
            .await?
            .ok_or_else(|| GameError::new(GameErrorKind::NotFound("Turn token".to_string())))?;

        let side = record.side_of(player).ok_or_else(|| {
            warn!(match_id = %record.id(), "Non-participant attempted a move");
            GameError::new(GameErrorKind::Forbidden(player.to_string()))
        })?;

        if *record.status() == GameStatus::Finished {
            if self.settle_record(&record).await? {
                warn!(match_id = %record.id(), "Completed settlement left over from an earlier failure");
            }
            return Err(GameErrorKind::MatchFinished.into());
        }

        if record.turn() != player {
            warn!(match_id = %record.id(), turn = %record.turn(), "Player tried to move out of turn");
            return Err(GameErrorKind::NotYourTurn.into());
        }

        let pit = denormalize_pit(relative_pit, side)
            .ok_or_else(|| invalid_pit(relative_pit, "outside the board"))?;
        let result = apply_move(record.board(), pit, side).map_err(|e| match e {
            MoveError::OutOfRange(_) => invalid_pit(relative_pit, "outside the board"),
            MoveError::NotOwned { .. } => invalid_pit(relative_pit, "not one of your pits"),
            MoveError::EmptyPit(_) => invalid_pit(relative_pit, "pit is empty"),
        })?;

        if let Err(violations) = MoveInvariants::check_all(&result) {
            let descriptions: Vec<String> = violations.iter().map(ToString::to_string).collect();
            error!(violations = ?descriptions, "Move result violates invariants");
            return Err(GameErrorKind::Internal(descriptions.join("; ")).into());
        }

        let expected_version = *record.version();
        record.record_move(side, pit, result, Utc::now());
        self.store.update_match(&record, expected_version).await?;
        info!(
            match_id = %record.id(),
            pit,
            next_turn = %record.turn(),
            status = %record.status(),
            "Move applied"
        );

        if *record.status() == GameStatus::Finished {
            self.settle_record(&record).await?;
        }

        Ok(TurnView::new(&record, side))
    }

    /// Re-runs settlement (rating, then notification) for a finished match.
    ///
    /// Safe to call repeatedly: ratings apply once per match and participants
    /// are notified only by the call that applied them. Returns whether this
    /// call applied the ratings.
    ///
    /// # Errors
    ///
    /// `NotFound` if the token is unknown or the match is still active, or
    /// `Internal` on storage failure.
    #[instrument(skip(self))]
    pub async fn settle(&self, turn_token: &str) -> Result<bool, GameError> {
        let record = self
            .store
            .match_by_token(turn_token)
            .await?
            .ok_or_else(|| GameError::new(GameErrorKind::NotFound("Turn token".to_string())))?;
        self.settle_record(&record).await
    }

    async fn settle_record(&self, record: &Match) -> Result<bool, GameError> {
        let applied = self.ratings.apply(record).await?;
        if applied {
            for participant in record.participants() {
                self.notifier.publish(participant, record);
            }
            info!(match_id = %record.id(), "Match settled");
        }
        Ok(applied)
    }
}
