//! Mapping between absolute boards and a player's "I am side A" view.
//!
//! Clients always see themselves as side A: their pits are relative slots
//! 0-5 and their store is relative slot 6. For side B this is a rotation of
//! the absolute board by seven slots, which is its own inverse.

use crate::board::{Board, PITS_PER_SIDE, SLOTS, Side};

const HALF: usize = SLOTS / 2;

/// Re-expresses `board` from `side`'s point of view.
pub fn normalize(board: &Board, side: Side) -> Board {
    match side {
        Side::A => *board,
        Side::B => {
            let mut slots = *board.slots();
            slots.rotate_left(HALF);
            Board::from_slots(slots)
        }
    }
}

/// Converts a relative pit chosen by `side` into an absolute slot.
///
/// Side A's view is the absolute board, so any slot on the board passes
/// through. For side B, relative 0-5 map to 7-12 and relative 6 maps to 13;
/// anything else is rejected.
pub fn denormalize_pit(pit: usize, side: Side) -> Option<usize> {
    match side {
        Side::A => (pit < SLOTS).then_some(pit),
        Side::B => (pit <= PITS_PER_SIDE).then_some(pit + HALF),
    }
}

/// Converts an absolute slot into `side`'s relative numbering.
pub fn normalize_pit(pit: usize, side: Side) -> usize {
    match side {
        Side::A => pit,
        Side::B => (pit + HALF) % SLOTS,
    }
}
