//! First-class invariants for move results.
//!
//! Invariants are logical properties every [`MoveResult`] must satisfy. The
//! engine checks them in debug builds, and tests check them over random
//! playouts.

use crate::board::{Side, TOTAL_STONES};
use crate::engine::MoveResult;

/// A logical property that must hold for a given state.
pub trait Invariant<S> {
    /// Checks if the invariant holds for the given state.
    fn holds(state: &S) -> bool;

    /// Human-readable description of the invariant.
    fn description() -> &'static str;
}

/// Violation of an invariant.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
#[display("{}", description)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub description: String,
}

impl InvariantViolation {
    /// Creates a new invariant violation.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

/// A set of invariants that can be checked together.
pub trait InvariantSet<S> {
    /// Checks all invariants in the set, collecting every violation.
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>>;
}

impl<S, I1, I2> InvariantSet<S> for (I1, I2)
where
    I1: Invariant<S>,
    I2: Invariant<S>,
{
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>> {
        let mut violations = Vec::new();

        if !I1::holds(state) {
            violations.push(InvariantViolation::new(I1::description()));
        }

        if !I2::holds(state) {
            violations.push(InvariantViolation::new(I2::description()));
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

/// Invariant: the board always holds exactly 48 stones.
pub struct StonesConserved;

impl Invariant<MoveResult> for StonesConserved {
    fn holds(state: &MoveResult) -> bool {
        state.board.total() == TOTAL_STONES
    }

    fn description() -> &'static str {
        "Board must hold exactly 48 stones"
    }
}

/// Invariant: a finished game has no stones left in any pit, and an active
/// game has stones on both sides.
pub struct StatusMatchesBoard;

impl Invariant<MoveResult> for StatusMatchesBoard {
    fn holds(state: &MoveResult) -> bool {
        let a_empty = state.board.side_empty(Side::A);
        let b_empty = state.board.side_empty(Side::B);
        match state.status {
            crate::GameStatus::Finished => a_empty && b_empty,
            crate::GameStatus::Active => !a_empty && !b_empty,
        }
    }

    fn description() -> &'static str {
        "Finished games must be fully swept and active games must have stones on both sides"
    }
}

/// Every invariant a move result must satisfy.
pub type MoveInvariants = (StonesConserved, StatusMatchesBoard);
