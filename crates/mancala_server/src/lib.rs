//! Mancala turn server library.
//!
//! Many independent clients, human or automated, poll for a turn and submit
//! moves; the server pairs them up, resolves moves with
//! [`mancala_engine`], rates finished games and tells listeners how they
//! went.
//!
//! # Architecture
//!
//! - **Store**: persistence trait with in-memory and SQLite backends
//! - **Profiles**: create-or-find, leaderboard and lookup of players
//! - **Orchestrator**: matchmaking, backpressure, turn selection and moves
//! - **Rating**: Elo updates applied once per finished match
//! - **Notifier**: per-player stream of finished-game events
//! - **HTTP**: axum routes over all of the above
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use mancala_server::{FinishNotifier, MemoryStore, Orchestrator, ProfileService, Store};
//!
//! # async fn example() -> Result<(), mancala_server::GameError> {
//! let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
//! let profiles = ProfileService::new(Arc::clone(&store));
//! let orchestrator = Orchestrator::new(store, FinishNotifier::new(), 10);
//!
//! let alice = profiles.create_or_find(None).await?;
//! let bob = profiles.create_or_find(None).await?;
//! orchestrator.get_turn(bob.id()).await.ok();
//! let turn = orchestrator.get_turn(alice.id()).await?;
//! orchestrator.submit_move(alice.id(), &turn.turn_token, 2).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod http;
mod matchmaking;
mod models;
mod notifier;
mod orchestrator;
mod profile_service;
mod rating;
mod store;

pub use config::{ConfigError, SHARED_SECRET_ENV, ServerConfig};
pub use error::{GameError, GameErrorKind};
pub use http::{
    AppState, CreatePlayerRequest, ErrorBody, ListPlayersQuery, SubmitMoveRequest, router,
};
pub use matchmaking::{MatchmakingPolicy, UniformRandom};
pub use models::{
    DEFAULT_SCORE, Match, MatchId, MoveRecord, Outcome, Player, PlayerId, RatingUpdate,
    TurnToken, new_id,
};
pub use notifier::{FinishNotifier, FinishedGameEvent, MoveView, Subscription};
pub use orchestrator::{Orchestrator, TurnView};
pub use profile_service::ProfileService;
pub use rating::{K_FACTOR, RatingEngine, expected_score, rated_score};
pub use store::{MemoryStore, SqliteStore, Store, StoreError, StoreErrorKind};
