//! Pure Kalah game logic.
//!
//! # Architecture
//!
//! - **Board**: the 14-slot board, sides and validation predicates
//! - **Engine**: sowing, turn hand-off and the end-of-game sweep
//! - **Perspective**: rotation between absolute boards and a player's own view
//! - **Invariants**: properties every move result must satisfy
//!
//! Nothing here performs I/O; given the same inputs every function returns
//! the same output.
//!
//! # Example
//!
//! ```
//! use mancala_engine::{Board, GameStatus, Side, apply_move};
//!
//! let result = apply_move(&Board::new(), 2, Side::A).unwrap();
//! assert_eq!(result.next_turn, Side::A);
//! assert_eq!(result.status, GameStatus::Active);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod board;
mod engine;
mod invariants;
mod perspective;

pub use board::{
    Board, GameStatus, PITS_PER_SIDE, SLOTS, STONES_PER_PIT, Side, TOTAL_STONES, owns_pit,
};
pub use engine::{MoveError, MoveResult, apply_move, check_move, sow, sweep};
pub use invariants::{
    Invariant, InvariantSet, InvariantViolation, MoveInvariants, StatusMatchesBoard,
    StonesConserved,
};
pub use perspective::{denormalize_pit, normalize, normalize_pit};
