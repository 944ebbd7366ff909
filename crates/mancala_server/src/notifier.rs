//! Per-player stream of finished-game events.
//!
//! Every [`Subscription`] owns its own channel. Publishing is fire-and-forget:
//! events go to whoever is subscribed right now and are never queued for
//! later subscribers.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use chrono::{DateTime, Utc};
use futures::Stream;
use mancala_engine::{Board, normalize, normalize_pit};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::{debug, instrument, trace};

use crate::{Match, MatchId, Outcome, PlayerId};

/// One of the player's own moves, in their own perspective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveView {
    /// Relative pit the player chose.
    pub pit: usize,
    /// Board after the move, normalized for the player.
    pub board: Board,
    /// When the move was applied.
    pub played_at: DateTime<Utc>,
}

/// Outcome of a finished match for one participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishedGameEvent {
    /// Finished match.
    pub match_id: MatchId,
    /// The other participant.
    pub opponent: PlayerId,
    /// Win, loss or draw, by comparing stores on the final board.
    pub outcome: Outcome,
    /// Moves authored by the player, oldest first.
    pub moves: Vec<MoveView>,
    /// Final board, normalized for the player.
    pub final_board: Board,
}

impl FinishedGameEvent {
    /// Builds the event for `player`, or `None` if they did not take part.
    pub fn for_player(record: &Match, player: &str) -> Option<Self> {
        let side = record.side_of(player)?;
        let moves = record
            .history()
            .iter()
            .filter(|m| m.mover() == player)
            .map(|m| MoveView {
                pit: normalize_pit(*m.pit(), side),
                board: normalize(m.board(), side),
                played_at: *m.played_at(),
            })
            .collect();

        Some(Self {
            match_id: record.id().clone(),
            opponent: record.player_on(side.opponent()).clone(),
            outcome: Outcome::for_side(record.board(), side),
            moves,
            final_board: normalize(record.board(), side),
        })
    }
}

#[derive(Debug, Default)]
struct Registry {
    next_id: u64,
    subscribers: HashMap<PlayerId, Vec<(u64, UnboundedSender<FinishedGameEvent>)>>,
}

impl Registry {
    fn remove(&mut self, player: &str, id: u64) {
        if let Some(senders) = self.subscribers.get_mut(player) {
            senders.retain(|(sub, _)| *sub != id);
            if senders.is_empty() {
                self.subscribers.remove(player);
            }
        }
    }
}

fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Publish/subscribe channel keyed by player id.
#[derive(Debug, Clone, Default)]
pub struct FinishNotifier {
    registry: Arc<Mutex<Registry>>,
}

impl FinishNotifier {
    /// Creates a notifier with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts receiving finished-game events for `player`.
    ///
    /// Dropping the returned subscription deregisters it.
    #[instrument(skip(self))]
    pub fn subscribe(&self, player: &str) -> Subscription {
        let (sender, receiver) = unbounded_channel();
        let mut registry = lock(&self.registry);
        let id = registry.next_id;
        registry.next_id += 1;
        registry
            .subscribers
            .entry(player.to_string())
            .or_default()
            .push((id, sender));
        debug!(subscription = id, "Subscribed");

        Subscription {
            player: player.to_string(),
            id,
            receiver,
            registry: Arc::clone(&self.registry),
        }
    }

    /// Delivers `record`'s outcome to every current subscriber of `player`.
    ///
    /// Returns the number of subscribers reached; zero when nobody listens.
    #[instrument(skip(self, record), fields(match_id = %record.id()))]
    pub fn publish(&self, player: &str, record: &Match) -> usize {
        let mut registry = lock(&self.registry);
        let Some(senders) = registry.subscribers.get_mut(player) else {
            trace!("No subscribers");
            return 0;
        };
        let Some(event) = FinishedGameEvent::for_player(record, player) else {
            debug!("Player did not take part in this match");
            return 0;
        };

        senders.retain(|(_, sender)| sender.send(event.clone()).is_ok());
        let delivered = senders.len();
        if senders.is_empty() {
            registry.subscribers.remove(player);
        }
        debug!(delivered, "Published finished game");
        delivered
    }

    /// Number of live subscriptions for `player`.
    pub fn subscriber_count(&self, player: &str) -> usize {
        lock(&self.registry)
            .subscribers
            .get(player)
            .map_or(0, Vec::len)
    }
}

/// Stream of finished-game events for one player.
#[derive(Debug)]
pub struct Subscription {
    player: PlayerId,
    id: u64,
    receiver: UnboundedReceiver<FinishedGameEvent>,
    registry: Arc<Mutex<Registry>>,
}

impl Subscription {
    /// Player this subscription listens for.
    pub fn player(&self) -> &str {
        &self.player
    }

    /// Waits for the next event.
    pub async fn recv(&mut self) -> Option<FinishedGameEvent> {
        self.receiver.recv().await
    }

    /// Returns an already delivered event without waiting.
    pub fn try_recv(&mut self) -> Option<FinishedGameEvent> {
        self.receiver.try_recv().ok()
    }
}

impl Stream for Subscription {
    type Item = FinishedGameEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        lock(&self.registry).remove(&self.player, self.id);
        debug!(player = %self.player, subscription = self.id, "Unsubscribed");
    }
}
