//! Persisted records: players, matches and their move history.

use chrono::{DateTime, Utc};
use derive_getters::Getters;
use derive_new::new;
use mancala_engine::{Board, GameStatus, MoveResult, Side};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Opaque, unique player identifier.
pub type PlayerId = String;

/// Unique match identifier.
pub type MatchId = String;

/// Handle clients use to address a match when submitting moves.
pub type TurnToken = String;

/// Skill score assigned to new players.
pub const DEFAULT_SCORE: i32 = 1200;

/// Generates a fresh random identifier.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Player profile.
///
/// The credential only re-identifies a returning player and is never
/// serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct Player {
    id: PlayerId,
    score: i32,
    wins: u32,
    losses: u32,
    created_at: DateTime<Utc>,
    last_played_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    #[getter(skip)]
    credential: Option<String>,
}

impl Player {
    /// Creates a fresh profile with the default score.
    #[instrument(skip(credential))]
    pub fn new(id: PlayerId, credential: Option<String>) -> Self {
        Self {
            id,
            score: DEFAULT_SCORE,
            wins: 0,
            losses: 0,
            created_at: Utc::now(),
            last_played_at: None,
            credential,
        }
    }

    /// Rebuilds a profile from stored fields.
    pub fn from_parts(
        id: PlayerId,
        score: i32,
        wins: u32,
        losses: u32,
        created_at: DateTime<Utc>,
        last_played_at: Option<DateTime<Utc>>,
        credential: Option<String>,
    ) -> Self {
        Self {
            id,
            score,
            wins,
            losses,
            created_at,
            last_played_at,
            credential,
        }
    }

    /// Credential used to find this player again, if any.
    pub(crate) fn credential(&self) -> Option<&str> {
        self.credential.as_deref()
    }

    /// Applies a rating increment in place.
    pub(crate) fn apply_rating(&mut self, update: &RatingUpdate) {
        self.score += update.delta();
        match update.outcome() {
            Outcome::Win => self.wins += 1,
            Outcome::Loss => self.losses += 1,
            Outcome::Draw => {}
        }
        self.last_played_at = Some(*update.played_at());
    }
}

/// Result of a finished match from one participant's point of view.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Outcome {
    /// Own store holds more stones than the opponent's.
    Win,
    /// Own store holds fewer stones than the opponent's.
    Loss,
    /// Both stores are equal.
    Draw,
}

impl Outcome {
    /// Compares `side`'s store against the opponent's on a final board.
    pub fn for_side(board: &Board, side: Side) -> Self {
        let own = board.store(side);
        let other = board.store(side.opponent());
        match own.cmp(&other) {
            std::cmp::Ordering::Greater => Outcome::Win,
            std::cmp::Ordering::Less => Outcome::Loss,
            std::cmp::Ordering::Equal => Outcome::Draw,
        }
    }

    /// Actual score used by the rating formula.
    pub fn actual_score(self) -> f64 {
        match self {
            Outcome::Win => 1.0,
            Outcome::Loss => 0.0,
            Outcome::Draw => 0.5,
        }
    }
}

/// Increment applied to one player's record when a match is rated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, new)]
pub struct RatingUpdate {
    player: PlayerId,
    delta: i32,
    outcome: Outcome,
    played_at: DateTime<Utc>,
}

/// One applied move. Immutable once appended to a match's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, new)]
pub struct MoveRecord {
    turn_token: TurnToken,
    board: Board,
    mover: PlayerId,
    pit: usize,
    played_at: DateTime<Utc>,
}

/// A match between two players.
///
/// The first participant plays side A, the second side B.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct Match {
    id: MatchId,
    turn_token: TurnToken,
    participants: [PlayerId; 2],
    board: Board,
    turn: PlayerId,
    status: GameStatus,
    history: Vec<MoveRecord>,
    version: u32,
}

impl Match {
    /// Creates a match where `first` plays side A and moves first.
    #[instrument]
    pub fn new(first: PlayerId, second: PlayerId) -> Self {
        Self {
            id: new_id(),
            turn_token: new_id(),
            turn: first.clone(),
            participants: [first, second],
            board: Board::new(),
            status: GameStatus::Active,
            history: Vec::new(),
            version: 0,
        }
    }

    /// Rebuilds a match from stored fields.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: MatchId,
        turn_token: TurnToken,
        participants: [PlayerId; 2],
        board: Board,
        turn: PlayerId,
        status: GameStatus,
        history: Vec<MoveRecord>,
        version: u32,
    ) -> Self {
        Self {
            id,
            turn_token,
            participants,
            board,
            turn,
            status,
            history,
            version,
        }
    }

    /// Side played by `player`, or `None` for non-participants.
    pub fn side_of(&self, player: &str) -> Option<Side> {
        if self.participants[0] == player {
            Some(Side::A)
        } else if self.participants[1] == player {
            Some(Side::B)
        } else {
            None
        }
    }

    /// Participant playing `side`.
    pub fn player_on(&self, side: Side) -> &PlayerId {
        match side {
            Side::A => &self.participants[0],
            Side::B => &self.participants[1],
        }
    }

    /// True when `player` is to move in an active match.
    pub fn is_turn_of(&self, player: &str) -> bool {
        self.status == GameStatus::Active && self.turn == player
    }

    /// Applies an engine result made by `mover` at absolute `pit`.
    pub(crate) fn record_move(
        &mut self,
        mover: Side,
        pit: usize,
        result: MoveResult,
        played_at: DateTime<Utc>,
    ) {
        let record = MoveRecord::new(
            self.turn_token.clone(),
            result.board,
            self.player_on(mover).clone(),
            pit,
            played_at,
        );
        self.history.push(record);
        self.board = result.board;
        self.turn = self.player_on(result.next_turn).clone();
        self.status = result.status;
        self.version += 1;
    }
}
