//! Persistence layer for players, matches and the matchmaking pool.
//!
//! [`Store`] captures the operations the orchestrator needs from a
//! key-value backend: plain reads and inserts, insert-if-absent for the
//! active-player registry, compare-and-swap on a match's version, and an
//! atomic, idempotent two-player rating update.

mod error;
mod memory;
mod schema;
mod sqlite;

pub use error::{StoreError, StoreErrorKind};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::{Match, Player, PlayerId, RatingUpdate};
use async_trait::async_trait;

/// Backend for every shared mutable record.
#[async_trait]
pub trait Store: Send + Sync + std::fmt::Debug {
    /// Inserts a new player.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreErrorKind::Duplicate`] error if the id or credential
    /// is taken.
    async fn insert_player(&self, player: &Player) -> Result<(), StoreError>;

    /// Looks up a player by id.
    async fn player(&self, id: &str) -> Result<Option<Player>, StoreError>;

    /// Looks up a player by credential.
    async fn player_by_credential(&self, credential: &str) -> Result<Option<Player>, StoreError>;

    /// Returns up to `limit` players ordered by descending score.
    async fn top_players(&self, limit: usize) -> Result<Vec<Player>, StoreError>;

    /// Adds `id` to the active-player registry. Returns `false` if it was
    /// already present.
    async fn register_active(&self, id: &str) -> Result<bool, StoreError>;

    /// Lists every registered active player.
    async fn active_players(&self) -> Result<Vec<PlayerId>, StoreError>;

    /// Active matches in which `player` participates.
    async fn active_matches_for(&self, player: &str) -> Result<Vec<Match>, StoreError>;

    /// Inserts a newly created match.
    async fn insert_match(&self, record: &Match) -> Result<(), StoreError>;

    /// Looks up a match by its turn token.
    async fn match_by_token(&self, token: &str) -> Result<Option<Match>, StoreError>;

    /// Replaces a match only if the stored version still equals
    /// `expected_version`.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreErrorKind::Conflict`] error when another writer got
    /// there first; nothing is written in that case.
    async fn update_match(&self, record: &Match, expected_version: u32) -> Result<(), StoreError>;

    /// Applies both participants' rating increments as one unit, at most once
    /// per `match_id`. Returns `false` if the match had already been rated.
    async fn apply_rating(
        &self,
        match_id: &str,
        updates: &[RatingUpdate; 2],
    ) -> Result<bool, StoreError>;
}
