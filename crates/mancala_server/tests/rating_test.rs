//! Tests for Elo ratings.

use std::sync::Arc;

use mancala_engine::{Board, GameStatus};
use mancala_server::{
    DEFAULT_SCORE, GameErrorKind, K_FACTOR, Match, MemoryStore, Outcome, Player, RatingEngine,
    Store, expected_score, new_id, rated_score,
};

const SCORES: [i32; 7] = [0, 800, 1100, 1200, 1350, 1800, 2600];

#[test]
fn test_expected_score_even_match() {
    assert!((expected_score(1200, 1200) - 0.5).abs() < 1e-9);
}

#[test]
fn test_expected_scores_sum_to_one() {
    for own in SCORES {
        for other in SCORES {
            let sum = expected_score(own, other) + expected_score(other, own);
            assert!((sum - 1.0).abs() < 1e-9, "{} vs {}", own, other);
        }
    }
}

#[test]
fn test_rating_change_is_bounded() {
    for own in SCORES {
        for other in SCORES {
            for outcome in [Outcome::Win, Outcome::Loss, Outcome::Draw] {
                let change = rated_score(own, other, outcome) - own;
                assert!(
                    f64::from(change.abs()) <= K_FACTOR,
                    "{} vs {} {}: {}",
                    own,
                    other,
                    outcome,
                    change
                );
                match outcome {
                    Outcome::Win => assert!(change >= 0),
                    Outcome::Loss => assert!(change <= 0),
                    Outcome::Draw => {}
                }
            }
        }
    }
}

#[test]
fn test_even_draw_keeps_scores() {
    assert_eq!(rated_score(1500, 1500, Outcome::Draw), 1500);
}

#[test]
fn test_upset_gains_more_than_expected_win() {
    let favourite_gain = rated_score(1600, 1200, Outcome::Win) - 1600;
    let underdog_gain = rated_score(1200, 1600, Outcome::Win) - 1200;
    assert!(favourite_gain < 16);
    assert!(underdog_gain > 16);
}

async fn finished_match(store: &Arc<dyn Store>, slots: [u32; 14]) -> (Player, Player, Match) {
    let alice = Player::new(new_id(), None);
    let bob = Player::new(new_id(), None);
    store.insert_player(&alice).await.expect("Insert failed");
    store.insert_player(&bob).await.expect("Insert failed");
    let record = Match::from_parts(
        new_id(),
        new_id(),
        [alice.id().clone(), bob.id().clone()],
        Board::from_slots(slots),
        bob.id().clone(),
        GameStatus::Finished,
        Vec::new(),
        3,
    );
    (alice, bob, record)
}

#[tokio::test]
async fn test_apply_rates_once() {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let engine = RatingEngine::new(Arc::clone(&store));
    let (alice, bob, record) =
        finished_match(&store, [0, 0, 0, 0, 0, 0, 30, 0, 0, 0, 0, 0, 0, 18]).await;

    assert!(engine.apply(&record).await.expect("Apply failed"));
    assert!(!engine.apply(&record).await.expect("Apply failed"));

    let alice = store.player(alice.id()).await.expect("Query failed").expect("Missing");
    let bob = store.player(bob.id()).await.expect("Query failed").expect("Missing");
    assert_eq!(*alice.score(), DEFAULT_SCORE + 16);
    assert_eq!(*bob.score(), DEFAULT_SCORE - 16);
    assert_eq!(*alice.wins(), 1);
    assert_eq!(*bob.losses(), 1);
}

#[tokio::test]
async fn test_draw_updates_only_score_and_timestamp() {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let engine = RatingEngine::new(Arc::clone(&store));
    let (alice, _bob, record) =
        finished_match(&store, [0, 0, 0, 0, 0, 0, 24, 0, 0, 0, 0, 0, 0, 24]).await;

    assert!(engine.apply(&record).await.expect("Apply failed"));

    let alice = store.player(alice.id()).await.expect("Query failed").expect("Missing");
    assert_eq!(*alice.score(), DEFAULT_SCORE);
    assert_eq!((*alice.wins(), *alice.losses()), (0, 0));
    assert!(alice.last_played_at().is_some());
}

#[tokio::test]
async fn test_apply_refuses_active_match() {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let engine = RatingEngine::new(Arc::clone(&store));
    let record = Match::new(new_id(), new_id());

    let err = engine.apply(&record).await.expect_err("Active match cannot be rated");
    assert!(matches!(err.kind(), GameErrorKind::NotFound(_)));
}
