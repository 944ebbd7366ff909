//! Move resolution: sowing, turn hand-off and the end-of-game sweep.

use crate::board::{Board, GameStatus, SLOTS, Side};
use crate::invariants::{Invariant, StatusMatchesBoard};
use serde::{Deserialize, Serialize};
use tracing::{instrument, trace};

/// Error returned when a move violates the engine's preconditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum MoveError {
    /// Slot index is not on the board.
    #[display("Pit {} is outside the board", _0)]
    OutOfRange(#[error(not(source))] usize),

    /// Pit belongs to the other side or is a store.
    #[display("Pit {} does not belong to side {}", pit, side)]
    NotOwned {
        /// Absolute slot index.
        pit: usize,
        /// Side attempting the move.
        side: Side,
    },

    /// Pit holds no stones.
    #[display("Pit {} is empty", _0)]
    EmptyPit(#[error(not(source))] usize),
}

/// Result of applying one move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveResult {
    /// Board after sowing (and the sweep, if the game ended).
    pub board: Board,
    /// Side to move next.
    pub next_turn: Side,
    /// Whether the game continues.
    pub status: GameStatus,
}

/// Validates that `mover` may play `pit` on `board`.
///
/// # Errors
///
/// Returns [`MoveError`] when the pit is off the board, not owned by the
/// mover, or empty.
pub fn check_move(board: &Board, pit: usize, mover: Side) -> Result<(), MoveError> {
    if pit >= SLOTS {
        return Err(MoveError::OutOfRange(pit));
    }
    if !mover.owns_pit(pit) {
        return Err(MoveError::NotOwned { pit, side: mover });
    }
    if board.slots()[pit] == 0 {
        return Err(MoveError::EmptyPit(pit));
    }
    Ok(())
}

/// Distributes the stones of `pit` one per slot, skipping the opponent's store.
///
/// Returns the new board and the slot that received the last stone. An empty
/// pit yields the board unchanged and `pit` itself as the last slot.
pub fn sow(board: &Board, pit: usize, mover: Side) -> (Board, usize) {
    let mut next = *board;
    let slots = next.slots_mut();
    let skip = mover.opponent().store();

    let mut stones = std::mem::take(&mut slots[pit]);
    let mut cursor = pit;
    while stones > 0 {
        cursor = (cursor + 1) % SLOTS;
        if cursor == skip {
            continue;
        }
        slots[cursor] += 1;
        stones -= 1;
    }

    (next, cursor)
}

/// Moves every side's remaining pit stones into that side's own store.
pub fn sweep(board: &Board) -> Board {
    let mut next = *board;
    let slots = next.slots_mut();
    for side in [Side::A, Side::B] {
        let remaining: u32 = side.pits().map(|slot| std::mem::take(&mut slots[slot])).sum();
        slots[side.store()] += remaining;
    }
    next
}

/// Applies one move and reports the next turn and game status.
///
/// The last stone landing in the mover's own store grants another turn.
/// When either side's pits are empty after sowing, both sides are swept and
/// the game is finished.
///
/// # Errors
///
/// Returns [`MoveError`] if [`check_move`] rejects the move.
#[instrument(skip(board), fields(total = board.total()))]
pub fn apply_move(board: &Board, pit: usize, mover: Side) -> Result<MoveResult, MoveError> {
    check_move(board, pit, mover)?;

    let (sown, last) = sow(board, pit, mover);
    let next_turn = if last == mover.store() {
        mover
    } else {
        mover.opponent()
    };
    trace!(last, ?next_turn, "Sowing complete");

    let result = if sown.side_empty(Side::A) || sown.side_empty(Side::B) {
        MoveResult {
            board: sweep(&sown),
            next_turn,
            status: GameStatus::Finished,
        }
    } else {
        MoveResult {
            board: sown,
            next_turn,
            status: GameStatus::Active,
        }
    };

    debug_assert_eq!(result.board.total(), board.total());
    debug_assert!(StatusMatchesBoard::holds(&result));
    Ok(result)
}
