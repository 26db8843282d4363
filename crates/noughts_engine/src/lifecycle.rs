//! Session lifecycle facade.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::ranking::{LeaderboardEntry, RankingOrder, leaderboard};
use crate::{EngineError, MoveRecord, Player, PlayerId, Session, SessionStatus, SessionStore};

/// Entry point the boundary talks to.
///
/// Composes the grid rules and a [`SessionStore`] into the create, join and
/// move operations plus read accessors. It holds no session data itself;
/// cloning shares the same store handle.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    store: Arc<dyn SessionStore>,
}

impl Lifecycle {
    /// Wraps an opened store.
    #[instrument(skip(store))]
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        info!("Creating session lifecycle");
        Self { store }
    }

    /// Registers a new player.
    #[instrument(skip(self))]
    pub fn register_player(&self, name: &str) -> Result<Player, EngineError> {
        self.store.register_player(name)
    }

    /// Returns a player snapshot.
    #[instrument(skip(self))]
    pub fn player(&self, player_id: PlayerId) -> Result<Player, EngineError> {
        self.store.get_player(player_id)
    }

    /// Opens a session for `first_player`.
    #[instrument(skip(self))]
    pub fn create_session(&self, first_player: PlayerId) -> Result<Session, EngineError> {
        self.store.create_session(first_player)
    }

    /// Seats `second_player` in a waiting session.
    #[instrument(skip(self))]
    pub fn join_session(
        &self,
        session_id: &str,
        second_player: PlayerId,
    ) -> Result<Session, EngineError> {
        self.store.join_session(session_id, second_player)
    }

    /// Plays a move at boundary-supplied coordinates.
    ///
    /// Coordinates are passed through signed; the store reports anything
    /// off the grid as out of bounds once the session and its status check
    /// out.
    #[instrument(skip(self))]
    pub fn make_move(
        &self,
        session_id: &str,
        player_id: PlayerId,
        row: i64,
        col: i64,
    ) -> Result<Session, EngineError> {
        self.store.apply_move(session_id, player_id, row, col)
    }

    /// Returns the current snapshot of a session.
    #[instrument(skip(self))]
    pub fn session(&self, session_id: &str) -> Result<Session, EngineError> {
        self.store.get_session(session_id)
    }

    /// Sessions in the given status, most recently updated first.
    #[instrument(skip(self))]
    pub fn sessions_by_status(&self, status: SessionStatus) -> Result<Vec<Session>, EngineError> {
        self.store.list_sessions_by_status(status)
    }

    /// Sessions the player is seated in, most recently updated first.
    #[instrument(skip(self))]
    pub fn sessions_for_player(&self, player_id: PlayerId) -> Result<Vec<Session>, EngineError> {
        self.store.list_sessions_for_player(player_id)
    }

    /// Move audit trail for a session.
    #[instrument(skip(self))]
    pub fn moves(&self, session_id: &str) -> Result<Vec<MoveRecord>, EngineError> {
        self.store.list_moves(session_id)
    }

    /// Top `limit` players under `order`.
    #[instrument(skip(self))]
    pub fn leaderboard(
        &self,
        order: RankingOrder,
        limit: usize,
    ) -> Result<Vec<LeaderboardEntry>, EngineError> {
        let players = self.store.ranked_players()?;
        Ok(leaderboard(&players, order, limit))
    }
}
