//! SQLite store built on diesel.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use mancala_engine::{Board, GameStatus};
use tracing::{debug, info, instrument};

use crate::store::{Store, StoreError, schema};
use crate::{Match, MoveRecord, Outcome, Player, PlayerId, RatingUpdate};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = schema::players)]
struct PlayerRow {
    id: String,
    score: i32,
    wins: i32,
    losses: i32,
    created_at: NaiveDateTime,
    last_played_at: Option<NaiveDateTime>,
    credential: Option<String>,
}

impl From<&Player> for PlayerRow {
    fn from(player: &Player) -> Self {
        Self {
            id: player.id().clone(),
            score: *player.score(),
            wins: i32::try_from(*player.wins()).unwrap_or(i32::MAX),
            losses: i32::try_from(*player.losses()).unwrap_or(i32::MAX),
            created_at: player.created_at().naive_utc(),
            last_played_at: player.last_played_at().map(|at| at.naive_utc()),
            credential: player.credential().map(str::to_string),
        }
    }
}

impl From<PlayerRow> for Player {
    fn from(row: PlayerRow) -> Self {
        Player::from_parts(
            row.id,
            row.score,
            u32::try_from(row.wins).unwrap_or_default(),
            u32::try_from(row.losses).unwrap_or_default(),
            row.created_at.and_utc(),
            row.last_played_at.map(|at| at.and_utc()),
            row.credential,
        )
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = schema::matches)]
struct MatchRow {
    id: String,
    turn_token: String,
    player_a: String,
    player_b: String,
    board: String,
    turn: String,
    status: String,
    history: String,
    version: i32,
}

impl TryFrom<&Match> for MatchRow {
    type Error = StoreError;

    fn try_from(record: &Match) -> Result<Self, StoreError> {
        let [player_a, player_b] = record.participants().clone();
        Ok(Self {
            id: record.id().clone(),
            turn_token: record.turn_token().clone(),
            player_a,
            player_b,
            board: serde_json::to_string(record.board())?,
            turn: record.turn().clone(),
            status: record.status().to_string(),
            history: serde_json::to_string(record.history())?,
            version: i32::try_from(*record.version())
                .map_err(|_| StoreError::backend("Match version overflow"))?,
        })
    }
}

impl TryFrom<MatchRow> for Match {
    type Error = StoreError;

    fn try_from(row: MatchRow) -> Result<Self, StoreError> {
        let board: Board = serde_json::from_str(&row.board)?;
        let history: Vec<MoveRecord> = serde_json::from_str(&row.history)?;
        let status: GameStatus = row
            .status
            .parse()
            .map_err(|_| StoreError::backend(format!("Invalid status '{}'", row.status)))?;
        let version = u32::try_from(row.version)
            .map_err(|_| StoreError::backend(format!("Invalid version {}", row.version)))?;
        Ok(Match::from_parts(
            row.id,
            row.turn_token,
            [row.player_a, row.player_b],
            board,
            row.turn,
            status,
            history,
            version,
        ))
    }
}

/// Store persisted in a SQLite database.
///
/// A single connection is shared behind a mutex and every query runs on the
/// blocking thread pool. Use `":memory:"` for a throwaway database.
#[derive(Clone)]
pub struct SqliteStore {
    path: String,
    conn: Arc<Mutex<SqliteConnection>>,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore").field("path", &self.path).finish()
    }
}

impl SqliteStore {
    /// Opens (or creates) the database at `path` and applies pending migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the connection or a migration fails.
    #[instrument(skip(path), fields(path = %path.as_ref()))]
    pub fn open(path: impl AsRef<str>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_string();
        info!(path = %path, "Opening SQLite store");
        let mut conn = SqliteConnection::establish(&path)
            .map_err(|e| StoreError::backend(format!("Failed to connect to '{}': {}", path, e)))?;

        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| StoreError::backend(format!("Migrations failed: {}", e)))?;
        debug!(count = applied.len(), "Migrations applied");

        Ok(Self {
            path,
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs `op` against the shared connection on the blocking pool.
    async fn run<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut SqliteConnection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| StoreError::backend("Connection mutex poisoned"))?;
            op(&mut guard)
        })
        .await
        .map_err(|e| StoreError::backend(format!("Blocking task failed: {}", e)))?
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn insert_player(&self, player: &Player) -> Result<(), StoreError> {
        let row = PlayerRow::from(player);
        self.run(move |conn| {
            diesel::insert_into(schema::players::table)
                .values(&row)
                .execute(conn)?;
            Ok(())
        })
        .await
    }

    async fn player(&self, id: &str) -> Result<Option<Player>, StoreError> {
        let id = id.to_string();
        self.run(move |conn| {
            let row = schema::players::table
                .find(&id)
                .first::<PlayerRow>(conn)
                .optional()?;
            Ok(row.map(Player::from))
        })
        .await
    }

    async fn player_by_credential(&self, credential: &str) -> Result<Option<Player>, StoreError> {
        let credential = credential.to_string();
        self.run(move |conn| {
            let row = schema::players::table
                .filter(schema::players::credential.eq(&credential))
                .first::<PlayerRow>(conn)
                .optional()?;
            Ok(row.map(Player::from))
        })
        .await
    }

    async fn top_players(&self, limit: usize) -> Result<Vec<Player>, StoreError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.run(move |conn| {
            let rows = schema::players::table
                .order((
                    schema::players::score.desc(),
                    schema::players::created_at.asc(),
                    schema::players::id.asc(),
                ))
                .limit(limit)
                .load::<PlayerRow>(conn)?;
            Ok(rows.into_iter().map(Player::from).collect())
        })
        .await
    }

    async fn register_active(&self, id: &str) -> Result<bool, StoreError> {
        let id = id.to_string();
        self.run(move |conn| {
            let inserted = diesel::insert_or_ignore_into(schema::active_players::table)
                .values(schema::active_players::id.eq(&id))
                .execute(conn)?;
            Ok(inserted > 0)
        })
        .await
    }

    async fn active_players(&self) -> Result<Vec<PlayerId>, StoreError> {
        self.run(|conn| {
            let ids = schema::active_players::table
                .select(schema::active_players::id)
                .order(schema::active_players::id.asc())
                .load::<String>(conn)?;
            Ok(ids)
        })
        .await
    }

    async fn active_matches_for(&self, player: &str) -> Result<Vec<Match>, StoreError> {
        let player = player.to_string();
        self.run(move |conn| {
            let rows = schema::matches::table
                .filter(schema::matches::status.eq(GameStatus::Active.to_string()))
                .filter(
                    schema::matches::player_a
                        .eq(&player)
                        .or(schema::matches::player_b.eq(&player)),
                )
                .load::<MatchRow>(conn)?;
            rows.into_iter().map(Match::try_from).collect()
        })
        .await
    }

    async fn insert_match(&self, record: &Match) -> Result<(), StoreError> {
        let row = MatchRow::try_from(record)?;
        self.run(move |conn| {
            diesel::insert_into(schema::matches::table)
                .values(&row)
                .execute(conn)?;
            Ok(())
        })
        .await
    }

    async fn match_by_token(&self, token: &str) -> Result<Option<Match>, StoreError> {
        let token = token.to_string();
        self.run(move |conn| {
            let row = schema::matches::table
                .filter(schema::matches::turn_token.eq(&token))
                .first::<MatchRow>(conn)
                .optional()?;
            row.map(Match::try_from).transpose()
        })
        .await
    }

    async fn update_match(&self, record: &Match, expected_version: u32) -> Result<(), StoreError> {
        let row = MatchRow::try_from(record)?;
        let expected = i32::try_from(expected_version)
            .map_err(|_| StoreError::backend("Match version overflow"))?;
        self.run(move |conn| {
            let changed = diesel::update(
                schema::matches::table
                    .filter(schema::matches::id.eq(&row.id))
                    .filter(schema::matches::version.eq(expected)),
            )
            .set((
                schema::matches::board.eq(&row.board),
                schema::matches::turn.eq(&row.turn),
                schema::matches::status.eq(&row.status),
                schema::matches::history.eq(&row.history),
                schema::matches::version.eq(row.version),
            ))
            .execute(conn)?;

            if changed == 0 {
                return Err(StoreError::conflict(format!(
                    "Match {} is no longer at version {}",
                    row.id, expected
                )));
            }
            Ok(())
        })
        .await
    }

    async fn apply_rating(
        &self,
        match_id: &str,
        updates: &[RatingUpdate; 2],
    ) -> Result<bool, StoreError> {
        let match_id = match_id.to_string();
        let updates = updates.clone();
        self.run(move |conn| {
            conn.transaction::<bool, StoreError, _>(|conn| {
                let inserted = diesel::insert_or_ignore_into(schema::rated_matches::table)
                    .values(schema::rated_matches::match_id.eq(&match_id))
                    .execute(conn)?;
                if inserted == 0 {
                    debug!(match_id = %match_id, "Match already rated");
                    return Ok(false);
                }

                for update in &updates {
                    let (wins, losses) = match update.outcome() {
                        Outcome::Win => (1, 0),
                        Outcome::Loss => (0, 1),
                        Outcome::Draw => (0, 0),
                    };
                    let changed = diesel::update(schema::players::table.find(update.player()))
                        .set((
                            schema::players::score.eq(schema::players::score + *update.delta()),
                            schema::players::wins.eq(schema::players::wins + wins),
                            schema::players::losses.eq(schema::players::losses + losses),
                            schema::players::last_played_at
                                .eq(Some(update.played_at().naive_utc())),
                        ))
                        .execute(conn)?;
                    if changed == 0 {
                        return Err(StoreError::backend(format!(
                            "Player {} missing",
                            update.player()
                        )));
                    }
                }
                Ok(true)
            })
        })
        .await
    }
}
