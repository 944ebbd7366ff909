//! Player profile business logic layer.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::store::{Store, StoreErrorKind};
use crate::{GameError, GameErrorKind, Player, new_id};

/// Service layer for player profile operations.
///
/// Wraps a [`Store`] with get-or-create semantics for returning players.
#[derive(Debug, Clone)]
pub struct ProfileService {
    store: Arc<dyn Store>,
}

impl ProfileService {
    /// Creates a new profile service backed by the given store.
    #[instrument(skip(store))]
    pub fn new(store: Arc<dyn Store>) -> Self {
        info!("Creating ProfileService");
        Self { store }
    }

    /// Returns the player holding `credential`, or creates a new one.
    ///
    /// Without a credential a fresh anonymous player is always created.
    #[instrument(skip(self, credential), fields(has_credential = credential.is_some()))]
    pub async fn create_or_find(&self, credential: Option<String>) -> Result<Player, GameError> {
        if let Some(ref credential) = credential {
            if let Some(player) = self.store.player_by_credential(credential).await? {
                debug!(player_id = %player.id(), "Returning player found");
                return Ok(player);
            }
        }

        let player = Player::new(new_id(), credential.clone());
        match self.store.insert_player(&player).await {
            Ok(()) => {
                info!(player_id = %player.id(), "Player created");
                Ok(player)
            }
            Err(e) if e.kind == StoreErrorKind::Duplicate => {
                // Lost a race with another request for the same credential.
                let credential = credential.unwrap_or_default();
                debug!("Credential registered concurrently, looking it up");
                self.store
                    .player_by_credential(&credential)
                    .await?
                    .ok_or_else(|| GameError::from(e))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Returns the top `limit` players by score.
    #[instrument(skip(self))]
    pub async fn list_players(&self, limit: usize) -> Result<Vec<Player>, GameError> {
        let players = self.store.top_players(limit).await?;
        debug!(count = players.len(), "Players listed");
        Ok(players)
    }

    /// Looks up one player.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id.
    #[instrument(skip(self))]
    pub async fn get_player(&self, id: &str) -> Result<Player, GameError> {
        self.store
            .player(id)
            .await?
            .ok_or_else(|| GameError::new(GameErrorKind::NotFound(format!("Player {}", id))))
    }
}
