//! Tests for finished-game notifications.

use chrono::Utc;
use futures::StreamExt;
use mancala_engine::{Board, GameStatus};
use mancala_server::{FinishNotifier, FinishedGameEvent, Match, MoveRecord, Outcome};

/// Alice (side A) plays absolute pit 2, Bob (side B) answers with absolute
/// pit 9, then the game is declared over on a hand-built final board.
fn finished_match() -> Match {
    let token = "token-1".to_string();
    let after_alice = Board::from_slots([4, 4, 0, 5, 5, 5, 1, 4, 4, 4, 4, 4, 4, 0]);
    let after_bob = Board::from_slots([4, 4, 0, 5, 5, 5, 1, 4, 4, 0, 5, 5, 5, 1]);
    let history = vec![
        MoveRecord::new(token.clone(), after_alice, "alice".to_string(), 2, Utc::now()),
        MoveRecord::new(token.clone(), after_bob, "bob".to_string(), 9, Utc::now()),
    ];
    Match::from_parts(
        "match-1".to_string(),
        token,
        ["alice".to_string(), "bob".to_string()],
        Board::from_slots([0, 0, 0, 0, 0, 0, 20, 0, 0, 0, 0, 0, 0, 28]),
        "alice".to_string(),
        GameStatus::Finished,
        history,
        2,
    )
}

#[test]
fn test_event_contains_only_own_moves_in_own_perspective() {
    let record = finished_match();
    let event = FinishedGameEvent::for_player(&record, "bob").expect("Bob took part");

    assert_eq!(event.match_id, "match-1");
    assert_eq!(event.opponent, "alice");
    assert_eq!(event.outcome, Outcome::Win);
    assert_eq!(event.moves.len(), 1);
    assert_eq!(event.moves[0].pit, 2);
    assert_eq!(
        event.moves[0].board.slots(),
        &[4, 4, 0, 5, 5, 5, 1, 4, 4, 0, 5, 5, 5, 1]
    );
    assert_eq!(event.final_board.slots()[6], 28);
}

#[test]
fn test_no_event_for_outsiders() {
    assert!(FinishedGameEvent::for_player(&finished_match(), "carol").is_none());
}

#[test]
fn test_publish_without_subscribers() {
    let notifier = FinishNotifier::new();
    assert_eq!(notifier.publish("alice", &finished_match()), 0);
}

#[test]
fn test_every_subscription_receives() {
    let notifier = FinishNotifier::new();
    let mut first = notifier.subscribe("alice");
    let mut second = notifier.subscribe("alice");
    let mut other = notifier.subscribe("bob");

    assert_eq!(notifier.publish("alice", &finished_match()), 2);
    assert_eq!(
        first.try_recv().expect("First missed it").outcome,
        Outcome::Loss
    );
    assert!(second.try_recv().is_some());
    assert!(other.try_recv().is_none(), "Only alice's listeners");
}

#[test]
fn test_drop_deregisters() {
    let notifier = FinishNotifier::new();
    let subscription = notifier.subscribe("alice");
    assert_eq!(subscription.player(), "alice");
    assert_eq!(notifier.subscriber_count("alice"), 1);

    drop(subscription);
    assert_eq!(notifier.subscriber_count("alice"), 0);
    assert_eq!(notifier.publish("alice", &finished_match()), 0);
}

#[test]
fn test_events_are_not_queued_for_later_subscribers() {
    let notifier = FinishNotifier::new();
    notifier.publish("alice", &finished_match());

    let mut late = notifier.subscribe("alice");
    assert!(late.try_recv().is_none());
}

#[tokio::test]
async fn test_subscription_is_a_stream() {
    let notifier = FinishNotifier::new();
    let mut subscription = notifier.subscribe("bob");

    let publisher = notifier.clone();
    tokio::spawn(async move {
        publisher.publish("bob", &finished_match());
    });

    let event = subscription.next().await.expect("Stream ended");
    assert_eq!(event.outcome, Outcome::Win);
}
