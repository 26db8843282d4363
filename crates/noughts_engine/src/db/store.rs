//! SQLite-backed session store.

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::{debug, info, instrument, warn};

use crate::db::models::{MoveRow, NewMoveRow, NewPlayerRow, PlayerRow, SessionRow};
use crate::db::{StoreConfig, schema};
use crate::store::{SessionStore, new_session_id, now, validate_name};
use crate::{
    EngineError, EngineErrorKind, MoveRecord, Player, PlayerId, Session, SessionStatus,
    transition,
};

/// Schema migrations compiled into the binary.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Session store persisted in a SQLite database.
///
/// Each operation opens a short-lived connection. Mutations run inside
/// `BEGIN IMMEDIATE` transactions, so the read-validate-write sequence holds
/// the writer lock from the first read and always sees the latest commit.
/// Session updates are additionally guarded on the `(status, move_count)`
/// pair that was read.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    config: StoreConfig,
}

impl SqliteStore {
    /// Opens the database, enabling WAL mode and applying pending migrations.
    ///
    /// # Errors
    ///
    /// Returns an `Unavailable` [`EngineError`] if the database cannot be
    /// opened or migrated.
    #[instrument(skip(config), fields(db_path = %config.db_path()))]
    pub fn open(config: StoreConfig) -> Result<Self, EngineError> {
        info!("Opening SQLite session store");
        let store = Self { config };
        let mut conn = store.connection()?;
        conn.batch_execute("PRAGMA journal_mode = WAL;")?;

        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| EngineError::unavailable(format!("Failed to run migrations: {}", e)))?;
        info!(applied = applied.len(), "Migrations applied");
        Ok(store)
    }

    /// Checkpoints the write-ahead log and releases the handle.
    ///
    /// # Errors
    ///
    /// Returns an `Unavailable` [`EngineError`] if the checkpoint fails.
    #[instrument(skip(self), fields(db_path = %self.config.db_path()))]
    pub fn close(self) -> Result<(), EngineError> {
        let mut conn = self.connection()?;
        conn.batch_execute("PRAGMA wal_checkpoint(TRUNCATE);")?;
        info!("SQLite session store closed");
        Ok(())
    }

    /// Returns the store configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Establishes a database connection.
    #[instrument(skip(self))]
    fn connection(&self) -> Result<SqliteConnection, EngineError> {
        debug!(path = %self.config.db_path(), "Establishing connection");
        let mut conn = SqliteConnection::establish(self.config.db_path()).map_err(|e| {
            EngineError::unavailable(format!(
                "Failed to connect to '{}': {}",
                self.config.db_path(),
                e
            ))
        })?;
        conn.batch_execute(&format!(
            "PRAGMA busy_timeout = {}; PRAGMA foreign_keys = ON;",
            self.config.busy_timeout_ms()
        ))?;
        Ok(conn)
    }
}

fn load_session(conn: &mut SqliteConnection, session_id: &str) -> Result<Session, EngineError> {
    let row = schema::sessions::table
        .find(session_id)
        .select(SessionRow::as_select())
        .first(conn)
        .optional()?;
    match row {
        Some(row) => Session::try_from(row),
        None => {
            debug!(session_id, "Session not found");
            Err(EngineErrorKind::SessionNotFound(session_id.to_string()).into())
        }
    }
}

fn ensure_player(conn: &mut SqliteConnection, player_id: PlayerId) -> Result<(), EngineError> {
    let found = schema::players::table
        .find(player_id)
        .select(schema::players::id)
        .first::<i32>(conn)
        .optional()?;
    match found {
        Some(_) => Ok(()),
        None => Err(EngineErrorKind::PlayerNotFound(player_id).into()),
    }
}

/// Writes `after` over `before`, failing if the row moved on since it was read.
fn commit_session(
    conn: &mut SqliteConnection,
    before: &Session,
    after: &Session,
) -> Result<(), EngineError> {
    use schema::sessions::dsl;

    let updated = diesel::update(
        dsl::sessions
            .filter(dsl::id.eq(&before.id))
            .filter(dsl::status.eq(before.status.as_ref()))
            .filter(dsl::move_count.eq(before.move_count)),
    )
    .set(&SessionRow::from(after))
    .execute(conn)?;

    if updated != 1 {
        warn!(session_id = %before.id, "Session changed underneath the transaction");
        return Err(EngineError::unavailable(format!(
            "Session {} was modified concurrently",
            before.id
        )));
    }
    Ok(())
}

fn into_sessions(rows: Vec<SessionRow>) -> Result<Vec<Session>, EngineError> {
    rows.into_iter().map(Session::try_from).collect()
}

impl SessionStore for SqliteStore {
    #[instrument(skip(self))]
    fn register_player(&self, name: &str) -> Result<Player, EngineError> {
        let name = validate_name(name)?;
        let mut conn = self.connection()?;

        let new_player = NewPlayerRow {
            name,
            wins: 0,
            moves_in_wins: 0,
            created_at: now(),
        };
        let row = diesel::insert_into(schema::players::table)
            .values(&new_player)
            .returning(PlayerRow::as_returning())
            .get_result(&mut conn)
            .map_err(|e| match e {
                DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    warn!(name, "Display name already taken");
                    EngineError::new(EngineErrorKind::NameConflict(name.to_string()))
                }
                other => EngineError::from(other),
            })?;

        let player = Player::from(row);
        info!(player_id = player.id(), name, "Player registered");
        Ok(player)
    }

    #[instrument(skip(self))]
    fn get_player(&self, player_id: PlayerId) -> Result<Player, EngineError> {
        let mut conn = self.connection()?;
        schema::players::table
            .find(player_id)
            .select(PlayerRow::as_select())
            .first(&mut conn)
            .optional()?
            .map(Player::from)
            .ok_or_else(|| EngineErrorKind::PlayerNotFound(player_id).into())
    }

    #[instrument(skip(self))]
    fn find_player_by_name(&self, name: &str) -> Result<Option<Player>, EngineError> {
        let mut conn = self.connection()?;
        let row = schema::players::table
            .filter(schema::players::name.eq(name.trim()))
            .select(PlayerRow::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(row.map(Player::from))
    }

    #[instrument(skip(self))]
    fn create_session(&self, first_player: PlayerId) -> Result<Session, EngineError> {
        let mut conn = self.connection()?;
        let session = conn.immediate_transaction::<_, EngineError, _>(|conn| {
            ensure_player(conn, first_player)?;
            let session = Session::open(new_session_id(), first_player, now());
            diesel::insert_into(schema::sessions::table)
                .values(&SessionRow::from(&session))
                .execute(conn)?;
            Ok(session)
        })?;

        info!(session_id = %session.id, first_player, "Session created");
        Ok(session)
    }

    #[instrument(skip(self))]
    fn join_session(
        &self,
        session_id: &str,
        second_player: PlayerId,
    ) -> Result<Session, EngineError> {
        let mut conn = self.connection()?;
        let session = conn.immediate_transaction::<_, EngineError, _>(|conn| {
            let current = load_session(conn, session_id)?;
            let next = transition::join(&current, second_player, now())?;
            ensure_player(conn, second_player)?;
            commit_session(conn, &current, &next)?;
            Ok(next)
        })?;

        info!(session_id, second_player, "Player joined session");
        Ok(session)
    }

    #[instrument(skip(self))]
    fn apply_move(
        &self,
        session_id: &str,
        player_id: PlayerId,
        row: i64,
        col: i64,
    ) -> Result<Session, EngineError> {
        let mut conn = self.connection()?;
        let session = conn.immediate_transaction::<_, EngineError, _>(|conn| {
            let current = load_session(conn, session_id)?;
            let commit = transition::apply_move(&current, player_id, row, col, now())?;

            diesel::insert_into(schema::moves::table)
                .values(&NewMoveRow::from(&commit.record))
                .execute(conn)?;

            if let Some(credit) = commit.win {
                use schema::players::dsl;
                let updated = diesel::update(dsl::players.find(credit.player_id))
                    .set((
                        dsl::wins.eq(dsl::wins + 1),
                        dsl::moves_in_wins.eq(dsl::moves_in_wins + credit.moves),
                    ))
                    .execute(conn)?;
                if updated != 1 {
                    return Err(EngineErrorKind::PlayerNotFound(credit.player_id).into());
                }
                info!(
                    player_id = credit.player_id,
                    moves = credit.moves,
                    "Win credited"
                );
            }

            commit_session(conn, &current, &commit.session)?;
            Ok(commit.session)
        })?;

        info!(
            session_id,
            player_id,
            row,
            col,
            status = %session.status,
            move_count = session.move_count,
            "Move committed"
        );
        Ok(session)
    }

    #[instrument(skip(self))]
    fn get_session(&self, session_id: &str) -> Result<Session, EngineError> {
        let mut conn = self.connection()?;
        load_session(&mut conn, session_id)
    }

    #[instrument(skip(self))]
    fn list_sessions_by_status(&self, status: SessionStatus) -> Result<Vec<Session>, EngineError> {
        use schema::sessions::dsl;

        let mut conn = self.connection()?;
        let rows = dsl::sessions
            .filter(dsl::status.eq(status.as_ref()))
            .order((dsl::updated_at.desc(), dsl::id.asc()))
            .select(SessionRow::as_select())
            .load(&mut conn)?;
        let sessions = into_sessions(rows)?;
        debug!(count = sessions.len(), "Listed sessions by status");
        Ok(sessions)
    }

    #[instrument(skip(self))]
    fn list_sessions_for_player(&self, player_id: PlayerId) -> Result<Vec<Session>, EngineError> {
        use schema::sessions::dsl;

        let mut conn = self.connection()?;
        let rows = dsl::sessions
            .filter(
                dsl::first_player_id
                    .eq(player_id)
                    .or(dsl::second_player_id.eq(player_id)),
            )
            .order((dsl::updated_at.desc(), dsl::id.asc()))
            .select(SessionRow::as_select())
            .load(&mut conn)?;
        let sessions = into_sessions(rows)?;
        debug!(count = sessions.len(), "Listed sessions for player");
        Ok(sessions)
    }

    #[instrument(skip(self))]
    fn list_moves(&self, session_id: &str) -> Result<Vec<MoveRecord>, EngineError> {
        use schema::moves::dsl;

        let mut conn = self.connection()?;
        load_session(&mut conn, session_id)?;
        let moves = dsl::moves
            .filter(dsl::session_id.eq(session_id))
            .order(dsl::seq.asc())
            .select(MoveRow::as_select())
            .load(&mut conn)?;
        Ok(moves.into_iter().map(MoveRecord::from).collect())
    }

    #[instrument(skip(self))]
    fn ranked_players(&self) -> Result<Vec<Player>, EngineError> {
        use schema::players::dsl;

        let mut conn = self.connection()?;
        let players = dsl::players
            .filter(dsl::wins.gt(0))
            .order(dsl::id.asc())
            .select(PlayerRow::as_select())
            .load(&mut conn)?;
        debug!(count = players.len(), "Loaded ranked players");
        Ok(players.into_iter().map(Player::from).collect())
    }
}
