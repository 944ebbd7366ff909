//! Core domain types for the Kalah board.

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Number of playable pits on each side.
pub const PITS_PER_SIDE: usize = 6;

/// Total number of slots (12 pits + 2 stores).
pub const SLOTS: usize = 14;

/// Stones placed in every pit at the start of a game.
pub const STONES_PER_PIT: u32 = 4;

/// Stones on the board at all times.
pub const TOTAL_STONES: u32 = STONES_PER_PIT * (2 * PITS_PER_SIDE) as u32;

/// One side of the board.
///
/// Side A owns slots 0-5 and store 6, side B owns slots 7-12 and store 13.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display,
)]
pub enum Side {
    /// First participant; moves first in a new match.
    A,
    /// Second participant.
    B,
}

impl Side {
    /// Returns the opposing side.
    pub fn opponent(self) -> Self {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }

    /// Slot index of this side's store.
    pub fn store(self) -> usize {
        match self {
            Side::A => PITS_PER_SIDE,
            Side::B => SLOTS - 1,
        }
    }

    /// Slot indices of this side's six pits.
    pub fn pits(self) -> Range<usize> {
        match self {
            Side::A => 0..PITS_PER_SIDE,
            Side::B => PITS_PER_SIDE + 1..SLOTS - 1,
        }
    }

    /// Checks whether `pit` is one of this side's playable pits.
    pub fn owns_pit(self, pit: usize) -> bool {
        self.pits().contains(&pit)
    }
}

/// Checks whether `pit` is one of `side`'s playable pits.
pub fn owns_pit(pit: usize, side: Side) -> bool {
    side.owns_pit(pit)
}

/// Status of a match after a move.
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
pub enum GameStatus {
    /// Moves can still be made.
    Active,
    /// Both sides have been swept; no further moves.
    Finished,
}

/// 14-slot Kalah board in absolute orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    slots: [u32; SLOTS],
}

impl Board {
    /// Creates the opening position: four stones per pit, empty stores.
    pub fn new() -> Self {
        let mut slots = [STONES_PER_PIT; SLOTS];
        slots[Side::A.store()] = 0;
        slots[Side::B.store()] = 0;
        Self { slots }
    }

    /// Wraps raw slot values.
    pub fn from_slots(slots: [u32; SLOTS]) -> Self {
        Self { slots }
    }

    /// Returns all slots in absolute order.
    pub fn slots(&self) -> &[u32; SLOTS] {
        &self.slots
    }

    /// Gets the stone count of a slot, `None` when out of range.
    pub fn get(&self, slot: usize) -> Option<u32> {
        self.slots.get(slot).copied()
    }

    /// Sum of every slot.
    pub fn total(&self) -> u32 {
        self.slots.iter().sum()
    }

    /// Stones in `side`'s store.
    pub fn store(&self, side: Side) -> u32 {
        self.slots[side.store()]
    }

    /// Stones remaining in `side`'s pits.
    pub fn pit_total(&self, side: Side) -> u32 {
        self.slots[side.pits()].iter().sum()
    }

    /// True iff all six pits of `side` are empty.
    pub fn side_empty(&self, side: Side) -> bool {
        self.slots[side.pits()].iter().all(|&stones| stones == 0)
    }

    pub(crate) fn slots_mut(&mut self) -> &mut [u32; SLOTS] {
        &mut self.slots
    }

    /// Formats the board as two rows, side B on top (reversed) and side A below.
    pub fn display(&self) -> String {
        let top: Vec<String> = Side::B
            .pits()
            .rev()
            .map(|slot| format!("{:>2}", self.slots[slot]))
            .collect();
        let bottom: Vec<String> = Side::A
            .pits()
            .map(|slot| format!("{:>2}", self.slots[slot]))
            .collect();
        format!(
            "    {}\n{:>2}{}{:>2}\n    {}",
            top.join(" "),
            self.store(Side::B),
            " ".repeat(PITS_PER_SIDE * 3 + 2),
            self.store(Side::A),
            bottom.join(" ")
        )
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}
