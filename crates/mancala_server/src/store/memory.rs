//! In-process store, used by default and in tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use mancala_engine::GameStatus;
use tracing::{debug, instrument};

use crate::store::{Store, StoreError};
use crate::{Match, MatchId, Player, PlayerId, RatingUpdate, TurnToken};

#[derive(Debug, Default)]
struct Tables {
    players: HashMap<PlayerId, Player>,
    credentials: HashMap<String, PlayerId>,
    active: HashSet<PlayerId>,
    matches: HashMap<MatchId, Match>,
    tokens: HashMap<TurnToken, MatchId>,
    rated: HashSet<MatchId>,
}

/// Store backed by hash maps behind a single mutex.
///
/// Every method takes the lock once, so each operation is atomic with
/// respect to the others.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[instrument]
    pub fn new() -> Self {
        debug!("Creating in-memory store");
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_player(&self, player: &Player) -> Result<(), StoreError> {
        let mut tables = self.tables();
        if tables.players.contains_key(player.id()) {
            return Err(StoreError::duplicate(format!("Player {} exists", player.id())));
        }
        if let Some(credential) = player.credential() {
            if tables.credentials.contains_key(credential) {
                return Err(StoreError::duplicate("Credential already registered"));
            }
            tables
                .credentials
                .insert(credential.to_string(), player.id().clone());
        }
        tables.players.insert(player.id().clone(), player.clone());
        Ok(())
    }

    async fn player(&self, id: &str) -> Result<Option<Player>, StoreError> {
        Ok(self.tables().players.get(id).cloned())
    }

    async fn player_by_credential(&self, credential: &str) -> Result<Option<Player>, StoreError> {
        let tables = self.tables();
        Ok(tables
            .credentials
            .get(credential)
            .and_then(|id| tables.players.get(id))
            .cloned())
    }

    async fn top_players(&self, limit: usize) -> Result<Vec<Player>, StoreError> {
        let mut players: Vec<Player> = self.tables().players.values().cloned().collect();
        players.sort_by(|a, b| {
            b.score()
                .cmp(a.score())
                .then_with(|| a.created_at().cmp(b.created_at()))
                .then_with(|| a.id().cmp(b.id()))
        });
        players.truncate(limit);
        Ok(players)
    }

    async fn register_active(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.tables().active.insert(id.to_string()))
    }

    async fn active_players(&self) -> Result<Vec<PlayerId>, StoreError> {
        let mut ids: Vec<PlayerId> = self.tables().active.iter().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    async fn active_matches_for(&self, player: &str) -> Result<Vec<Match>, StoreError> {
        Ok(self
            .tables()
            .matches
            .values()
            .filter(|m| *m.status() == GameStatus::Active && m.side_of(player).is_some())
            .cloned()
            .collect())
    }

    async fn insert_match(&self, record: &Match) -> Result<(), StoreError> {
        let mut tables = self.tables();
        if tables.matches.contains_key(record.id()) || tables.tokens.contains_key(record.turn_token())
        {
            return Err(StoreError::duplicate(format!("Match {} exists", record.id())));
        }
        tables
            .tokens
            .insert(record.turn_token().clone(), record.id().clone());
        tables.matches.insert(record.id().clone(), record.clone());
        Ok(())
    }

    async fn match_by_token(&self, token: &str) -> Result<Option<Match>, StoreError> {
        let tables = self.tables();
        Ok(tables
            .tokens
            .get(token)
            .and_then(|id| tables.matches.get(id))
            .cloned())
    }

    async fn update_match(&self, record: &Match, expected_version: u32) -> Result<(), StoreError> {
        let mut tables = self.tables();
        let stored = tables
            .matches
            .get_mut(record.id())
            .ok_or_else(|| StoreError::backend(format!("Match {} missing", record.id())))?;
        if *stored.version() != expected_version {
            return Err(StoreError::conflict(format!(
                "Match {} is at version {}, expected {}",
                record.id(),
                stored.version(),
                expected_version
            )));
        }
        *stored = record.clone();
        Ok(())
    }

    async fn apply_rating(
        &self,
        match_id: &str,
        updates: &[RatingUpdate; 2],
    ) -> Result<bool, StoreError> {
        let mut tables = self.tables();
        if tables.rated.contains(match_id) {
            return Ok(false);
        }
        if let Some(missing) = updates
            .iter()
            .find(|u| !tables.players.contains_key(u.player()))
        {
            return Err(StoreError::backend(format!(
                "Player {} missing",
                missing.player()
            )));
        }
        for update in updates {
            if let Some(player) = tables.players.get_mut(update.player()) {
                player.apply_rating(update);
            }
        }
        tables.rated.insert(match_id.to_string());
        Ok(true)
    }
}
