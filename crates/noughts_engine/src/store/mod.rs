//! Session store abstraction and the in-memory backend.

mod memory;

pub use memory::MemoryStore;

use chrono::NaiveDateTime;
use tracing::instrument;

use crate::{
    EngineError, EngineErrorKind, MoveRecord, Player, PlayerId, Session, SessionStatus,
};

/// Durable owner of sessions, move records and player aggregates.
///
/// Every mutation is one indivisible unit scoped to a single session (and,
/// for a winning move, its winner). Concurrent mutations of the same session
/// are linearized and each re-validates against the latest committed state.
/// Different sessions never share a lock.
pub trait SessionStore: Send + Sync + std::fmt::Debug {
    /// Registers a player under a unique display name.
    ///
    /// # Errors
    ///
    /// `NameConflict` if the name is taken, `InvalidName` if it is blank.
    fn register_player(&self, name: &str) -> Result<Player, EngineError>;

    /// Returns a player snapshot.
    ///
    /// # Errors
    ///
    /// `PlayerNotFound` if the id is unknown.
    fn get_player(&self, player_id: PlayerId) -> Result<Player, EngineError>;

    /// Looks a player up by display name.
    fn find_player_by_name(&self, name: &str) -> Result<Option<Player>, EngineError>;

    /// Opens a new session with `first_player` holding the turn.
    ///
    /// # Errors
    ///
    /// `PlayerNotFound` if the player is unknown.
    fn create_session(&self, first_player: PlayerId) -> Result<Session, EngineError>;

    /// Seats the second player and starts the game. At most one of several
    /// concurrent joins succeeds.
    ///
    /// # Errors
    ///
    /// `SessionNotFound`, `InvalidState` (not waiting), `SelfJoin`, or
    /// `PlayerNotFound` for an unknown joining player.
    fn join_session(
        &self,
        session_id: &str,
        second_player: PlayerId,
    ) -> Result<Session, EngineError>;

    /// Applies a move and commits grid, move count, move record, status,
    /// winner and winner statistics together.
    ///
    /// # Errors
    ///
    /// `SessionNotFound`, `InvalidState`, `OutOfBounds`, `CellOccupied` or
    /// `NotYourTurn`.
    fn apply_move(
        &self,
        session_id: &str,
        player_id: PlayerId,
        row: i64,
        col: i64,
    ) -> Result<Session, EngineError>;

    /// Returns the current snapshot of a session.
    fn get_session(&self, session_id: &str) -> Result<Session, EngineError>;

    /// Sessions with the given status, most recently updated first.
    fn list_sessions_by_status(&self, status: SessionStatus) -> Result<Vec<Session>, EngineError>;

    /// Sessions where the player holds a seat, most recently updated first.
    fn list_sessions_for_player(&self, player_id: PlayerId) -> Result<Vec<Session>, EngineError>;

    /// The move audit trail of a session in sequence order.
    fn list_moves(&self, session_id: &str) -> Result<Vec<MoveRecord>, EngineError>;

    /// Players with at least one win, ordered by id.
    fn ranked_players(&self) -> Result<Vec<Player>, EngineError>;
}

/// Trims a display name and rejects blank ones.
#[instrument]
pub(crate) fn validate_name(name: &str) -> Result<&str, EngineError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(EngineErrorKind::InvalidName(name.to_string()).into());
    }
    Ok(trimmed)
}

/// Generates a fresh session token.
pub(crate) fn new_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub(crate) fn now() -> NaiveDateTime {
    chrono::Utc::now().naive_utc()
}

/// Orders snapshots most recently updated first, ties by id.
pub(crate) fn sort_recent_first(sessions: &mut [Session]) {
    sessions.sort_by(|a, b| {
        b.updated_at
            .cmp(&a.updated_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}
