//! Errors reported by the turn server.

use derive_more::{Display, Error};

use crate::store::{StoreError, StoreErrorKind};

/// What went wrong, grouped the way callers react to it.
///
/// Validation and not-found errors never mutate state. `Backpressure` and
/// `NoOpponent` are capacity signals; clients should back off and retry.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum GameErrorKind {
    /// Unknown player, match or turn token.
    #[display("{} not found", _0)]
    NotFound(String),

    /// Requester is not a participant of the match.
    #[display("Player {} is not a participant in this match", _0)]
    Forbidden(String),

    /// Requester is a participant but the opponent is to move.
    #[display("Not your turn")]
    NotYourTurn,

    /// The match has already ended.
    #[display("Match is already finished")]
    MatchFinished,

    /// Relative pit is out of range, empty, or not the requester's.
    #[display("Invalid pit {}: {}", pit, reason)]
    InvalidPit {
        /// Pit as submitted by the client.
        pit: usize,
        /// Why it was rejected.
        reason: String,
    },

    /// Too many matches are waiting on opponents.
    #[display("{} matches are waiting on opponents (limit {})", waiting, ceiling)]
    Backpressure {
        /// Active matches where the opponent is to move.
        waiting: usize,
        /// Configured ceiling.
        ceiling: usize,
    },

    /// Nobody else is in the matchmaking pool.
    #[display("No opponent available")]
    NoOpponent,

    /// A concurrent submission advanced the match first.
    #[display("Match was updated concurrently")]
    Conflict,

    /// Persistence or other infrastructure failure.
    #[display("Internal error: {}", _0)]
    Internal(String),
}

impl GameErrorKind {
    /// Short machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Forbidden(_) => "forbidden",
            Self::NotYourTurn => "not_your_turn",
            Self::MatchFinished => "match_finished",
            Self::InvalidPit { .. } => "invalid_pit",
            Self::Backpressure { .. } => "backpressure",
            Self::NoOpponent => "no_opponent",
            Self::Conflict => "conflict",
            Self::Internal(_) => "internal",
        }
    }
}

/// Turn server error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("{} at {}:{}", kind, file, line)]
pub struct GameError {
    /// What went wrong.
    pub kind: GameErrorKind,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl GameError {
    /// Creates a new error with caller location tracking.
    #[track_caller]
    pub fn new(kind: GameErrorKind) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            line: loc.line(),
            file: loc.file(),
        }
    }

    /// Returns the error category.
    pub fn kind(&self) -> &GameErrorKind {
        &self.kind
    }
}

impl From<GameErrorKind> for GameError {
    #[track_caller]
    fn from(kind: GameErrorKind) -> Self {
        Self::new(kind)
    }
}

impl From<StoreError> for GameError {
    #[track_caller]
    fn from(err: StoreError) -> Self {
        match err.kind {
            StoreErrorKind::Conflict => Self::new(GameErrorKind::Conflict),
            _ => Self::new(GameErrorKind::Internal(err.to_string())),
        }
    }
}
