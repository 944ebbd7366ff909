//! Tests for the HTTP API.

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use futures::StreamExt;
use mancala_engine::{Board, GameStatus};
use mancala_server::{AppState, Match, MemoryStore, ServerConfig, Store, TurnView, router};
use serde_json::{Value, json};
use tower::ServiceExt;

fn app(config: ServerConfig) -> Router {
    router(AppState::new(&config, Arc::new(MemoryStore::new())))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    send_with_auth(app, method, uri, body, None).await
}

async fn send_with_auth(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    bearer: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("Failed to build request");

    let response = app.clone().oneshot(request).await.expect("Request failed");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn create_player(app: &Router) -> String {
    let (status, body) = send(app, Method::POST, "/players", Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    body["id"].as_str().expect("Missing id").to_string()
}

#[tokio::test]
async fn test_health() {
    let app = app(ServerConfig::default());
    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).expect("Bad request"))
        .await
        .expect("Request failed");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_create_player_hides_credential() {
    let app = app(ServerConfig::default());
    let (status, first) = send(
        &app,
        Method::POST,
        "/players",
        Some(json!({ "credential": "hunter2" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["score"], 1200);
    assert!(first.get("credential").is_none());

    let (_, again) = send(
        &app,
        Method::POST,
        "/players",
        Some(json!({ "credential": "hunter2" })),
    )
    .await;
    assert_eq!(again["id"], first["id"], "Credential finds the same player");
}

#[tokio::test]
async fn test_get_player() {
    let app = app(ServerConfig::default());
    let id = create_player(&app).await;

    let (status, body) = send(&app, Method::GET, &format!("/players/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id.as_str());

    let (status, body) = send(&app, Method::GET, "/players/nobody", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn test_list_players_respects_limit() {
    let app = app(ServerConfig::default());
    for _ in 0..3 {
        create_player(&app).await;
    }

    let (status, body) = send(&app, Method::GET, "/players?limit=2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().expect("Expected array").len(), 2);

    let (_, body) = send(&app, Method::GET, "/players", None).await;
    assert_eq!(body.as_array().expect("Expected array").len(), 3);
}

#[tokio::test]
async fn test_turn_without_opponent() {
    let app = app(ServerConfig::default());
    let id = create_player(&app).await;

    let (status, body) = send(&app, Method::POST, &format!("/players/{}/turn", id), None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "no_opponent");
}

#[tokio::test]
async fn test_play_a_move() {
    let app = app(ServerConfig::default());
    let alice = create_player(&app).await;
    let bob = create_player(&app).await;
    send(&app, Method::POST, &format!("/players/{}/turn", bob), None).await;

    let (status, body) = send(&app, Method::POST, &format!("/players/{}/turn", alice), None).await;
    assert_eq!(status, StatusCode::OK);
    let view: TurnView = serde_json::from_value(body).expect("Bad turn view");
    assert!(view.your_turn);

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/players/{}/moves", bob),
        Some(json!({ "turn_token": view.turn_token, "pit": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "not_your_turn");

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/players/{}/moves", alice),
        Some(json!({ "turn_token": view.turn_token, "pit": 9 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "invalid_pit");

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/players/{}/moves", alice),
        Some(json!({ "turn_token": view.turn_token, "pit": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["your_turn"], true);
    assert_eq!(body["board"][6], 1);
}

#[tokio::test]
async fn test_backpressure_is_too_many_requests() {
    let app = app(ServerConfig::default().with_max_waiting_matches(0));
    let alice = create_player(&app).await;
    let bob = create_player(&app).await;
    send(&app, Method::POST, &format!("/players/{}/turn", bob), None).await;

    let (_, body) = send(&app, Method::POST, &format!("/players/{}/turn", alice), None).await;
    let token = body["turn_token"].as_str().expect("Missing token").to_string();
    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/players/{}/moves", alice),
        Some(json!({ "turn_token": token, "pit": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::POST, &format!("/players/{}/turn", alice), None).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["code"], "backpressure");
}

#[tokio::test]
async fn test_shared_secret_required() {
    let app = app(ServerConfig::default().with_shared_secret("s3cret".to_string()));

    let (status, body) = send(&app, Method::GET, "/players", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "unauthorized");

    let (status, _) = send_with_auth(&app, Method::GET, "/players", None, Some("wrong")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send_with_auth(&app, Method::GET, "/players", None, Some("s3cret")).await;
    assert_eq!(status, StatusCode::OK);

    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).expect("Bad request"))
        .await
        .expect("Request failed");
    assert_eq!(response.status(), StatusCode::OK, "Health stays open");
}

#[tokio::test]
async fn test_events_for_unknown_player() {
    let app = app(ServerConfig::default());
    let (status, body) = send(&app, Method::GET, "/players/nobody/events", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn test_events_stream_finished_game() {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let app = router(AppState::new(&ServerConfig::default(), Arc::clone(&store)));
    let alice = create_player(&app).await;
    let bob = create_player(&app).await;

    let record = Match::from_parts(
        "match-1".to_string(),
        "token-1".to_string(),
        [alice.clone(), bob.clone()],
        Board::from_slots([0, 0, 0, 0, 0, 1, 20, 3, 3, 3, 3, 3, 3, 9]),
        alice.clone(),
        GameStatus::Active,
        Vec::new(),
        0,
    );
    store.insert_match(&record).await.expect("Insert match failed");

    let response = app
        .clone()
        .oneshot(
            Request::get(format!("/players/{}/events", bob))
                .body(Body::empty())
                .expect("Bad request"),
        )
        .await
        .expect("Request failed");
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("text/event-stream"));

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/players/{}/moves", alice),
        Some(json!({ "turn_token": "token-1", "pit": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let mut frames = response.into_body().into_data_stream();
    let mut text = String::new();
    while !text.contains("\n\n") {
        let chunk = tokio::time::timeout(std::time::Duration::from_secs(5), frames.next())
            .await
            .expect("Timed out waiting for event")
            .expect("Stream ended")
            .expect("Body error");
        text.push_str(&String::from_utf8_lossy(&chunk));
    }

    assert!(text.contains("event: finished"), "frame was {:?}", text);
    let data = text
        .lines()
        .find_map(|line| line.strip_prefix("data: "))
        .expect("Missing data line");
    let event: Value = serde_json::from_str(data).expect("Bad event JSON");
    assert_eq!(event["match_id"], "match-1");
    assert_eq!(event["opponent"], alice.as_str());
    assert_eq!(event["outcome"], "win");
    assert_eq!(event["final_board"][6], 27);
}
