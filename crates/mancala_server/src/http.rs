//! REST and Server-Sent Events API over the orchestrator.

use std::sync::Arc;

use axum::extract::{Path, Query, Request, State};
use axum::http::{StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tracing::{debug, error, instrument, warn};

use crate::store::Store;
use crate::{
    FinishNotifier, GameError, GameErrorKind, Orchestrator, Player, ProfileService, ServerConfig,
    TurnView,
};

/// Shared state handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    orchestrator: Orchestrator,
    profiles: ProfileService,
    leaderboard_size: usize,
    shared_secret: Option<Arc<str>>,
}

impl AppState {
    /// Wires services for `config` on top of `store`.
    #[instrument(skip(config, store))]
    pub fn new(config: &ServerConfig, store: Arc<dyn Store>) -> Self {
        let orchestrator = Orchestrator::new(
            Arc::clone(&store),
            FinishNotifier::new(),
            *config.max_waiting_matches(),
        );
        Self {
            orchestrator,
            profiles: ProfileService::new(store),
            leaderboard_size: *config.leaderboard_size(),
            shared_secret: config.shared_secret().as_deref().map(Arc::from),
        }
    }

    /// Turn orchestrator.
    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Profile service.
    pub fn profiles(&self) -> &ProfileService {
        &self.profiles
    }
}

/// Body of `POST /players`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreatePlayerRequest {
    /// Credential identifying a returning player.
    #[serde(default)]
    pub credential: Option<String>,
}

/// Query of `GET /players`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListPlayersQuery {
    /// Number of players to return.
    pub limit: Option<usize>,
}

/// Body of `POST /players/{id}/moves`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitMoveRequest {
    /// Match handle from the turn view.
    pub turn_token: String,
    /// Pit in the player's own numbering (0-5).
    pub pit: usize,
}

/// JSON error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable message.
    pub error: String,
}

impl IntoResponse for GameError {
    fn into_response(self) -> Response {
        let status = match self.kind() {
            GameErrorKind::NotFound(_) => StatusCode::NOT_FOUND,
            GameErrorKind::Forbidden(_) => StatusCode::FORBIDDEN,
            GameErrorKind::NotYourTurn
            | GameErrorKind::MatchFinished
            | GameErrorKind::Conflict => StatusCode::CONFLICT,
            GameErrorKind::InvalidPit { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            GameErrorKind::Backpressure { .. } => StatusCode::TOO_MANY_REQUESTS,
            GameErrorKind::NoOpponent => StatusCode::SERVICE_UNAVAILABLE,
            GameErrorKind::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = match self.kind() {
            GameErrorKind::Internal(_) => {
                error!(error = %self, "Internal error");
                "Internal error".to_string()
            }
            kind => kind.to_string(),
        };

        let body = ErrorBody {
            code: self.kind().code().to_string(),
            error: message,
        };
        (status, Json(body)).into_response()
    }
}

/// Builds the router. Every route except `/health` sits behind the
/// shared-secret check when one is configured.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/players", post(create_player).get(list_players))
        .route("/players/{id}", get(get_player))
        .route("/players/{id}/turn", post(get_turn))
        .route("/players/{id}/moves", post(submit_move))
        .route("/players/{id}/events", get(events))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_secret))
        .route("/health", get(health))
        .layer(ServiceBuilder::new().map_request(|req: Request| {
            debug!(method = %req.method(), uri = %req.uri(), "Incoming HTTP request");
            req
        }))
        .with_state(state)
}

async fn require_secret(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let Some(secret) = state.shared_secret.as_deref() else {
        return next.run(request).await;
    };

    let presented = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    if presented == Some(secret) {
        next.run(request).await
    } else {
        warn!(uri = %request.uri(), "Rejected request without valid shared secret");
        let body = ErrorBody {
            code: "unauthorized".to_string(),
            error: "Missing or invalid bearer token".to_string(),
        };
        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}

async fn health() -> &'static str {
    "ok"
}

async fn create_player(
    State(state): State<AppState>,
    Json(req): Json<CreatePlayerRequest>,
) -> Result<Json<Player>, GameError> {
    let player = state.profiles.create_or_find(req.credential).await?;
    Ok(Json(player))
}

async fn list_players(
    State(state): State<AppState>,
    Query(query): Query<ListPlayersQuery>,
) -> Result<Json<Vec<Player>>, GameError> {
    let limit = query.limit.unwrap_or(state.leaderboard_size);
    let players = state.profiles.list_players(limit).await?;
    Ok(Json(players))
}

async fn get_player(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Player>, GameError> {
    let player = state.profiles.get_player(&id).await?;
    Ok(Json(player))
}

async fn get_turn(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TurnView>, GameError> {
    let view = state.orchestrator.get_turn(&id).await?;
    Ok(Json(view))
}

async fn submit_move(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SubmitMoveRequest>,
) -> Result<Json<TurnView>, GameError> {
    let view = state
        .orchestrator
        .submit_move(&id, &req.turn_token, req.pit)
        .await?;
    Ok(Json(view))
}

async fn events(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, GameError> {
    state.profiles.get_player(&id).await?;
    let subscription = state.orchestrator.notifier().subscribe(&id);
    debug!(player_id = %id, "Streaming finished games");

    let stream = subscription.map(|event| Event::default().event("finished").json_data(&event));
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
