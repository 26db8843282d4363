//! In-memory session store.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info, instrument, warn};

use super::{SessionStore, new_session_id, now, sort_recent_first, validate_name};
use crate::{
    EngineError, EngineErrorKind, MoveRecord, Player, PlayerId, Session, SessionId,
    SessionStatus, transition,
};

#[derive(Debug)]
struct SessionEntry {
    session: Session,
    moves: Vec<MoveRecord>,
}

#[derive(Debug, Default)]
struct PlayerTable {
    by_id: BTreeMap<PlayerId, Arc<Mutex<Player>>>,
    by_name: HashMap<String, PlayerId>,
}

/// Session store held entirely in process memory.
///
/// The session map is only write-locked to insert; each session sits behind
/// its own mutex, so different sessions mutate concurrently. A winning move
/// locks its session and then the winner (always in that order).
#[derive(Debug, Default)]
pub struct MemoryStore {
    sessions: RwLock<HashMap<SessionId, Arc<Mutex<SessionEntry>>>>,
    players: RwLock<PlayerTable>,
    last_player_id: AtomicI32,
}

impl MemoryStore {
    /// Creates an empty store.
    #[instrument]
    pub fn new() -> Self {
        info!("Creating in-memory session store");
        Self::default()
    }

    #[instrument(skip(self))]
    fn session_entry(&self, session_id: &str) -> Result<Arc<Mutex<SessionEntry>>, EngineError> {
        let sessions = read(&self.sessions)?;
        sessions.get(session_id).cloned().ok_or_else(|| {
            debug!(session_id, "Session not found");
            EngineErrorKind::SessionNotFound(session_id.to_string()).into()
        })
    }

    #[instrument(skip(self))]
    fn player_handle(&self, player_id: PlayerId) -> Result<Arc<Mutex<Player>>, EngineError> {
        let players = read(&self.players)?;
        players.by_id.get(&player_id).cloned().ok_or_else(|| {
            debug!(player_id, "Player not found");
            EngineErrorKind::PlayerNotFound(player_id).into()
        })
    }

    fn collect_sessions(
        &self,
        keep: impl Fn(&Session) -> bool,
    ) -> Result<Vec<Session>, EngineError> {
        let handles: Vec<_> = read(&self.sessions)?.values().cloned().collect();
        let mut found = Vec::new();
        for handle in handles {
            let entry = lock(&handle)?;
            if keep(&entry.session) {
                found.push(entry.session.clone());
            }
        }
        sort_recent_first(&mut found);
        Ok(found)
    }
}

impl SessionStore for MemoryStore {
    #[instrument(skip(self))]
    fn register_player(&self, name: &str) -> Result<Player, EngineError> {
        let name = validate_name(name)?;
        let mut players = write(&self.players)?;
        if players.by_name.contains_key(name) {
            warn!(name, "Display name already taken");
            return Err(EngineErrorKind::NameConflict(name.to_string()).into());
        }

        let id = self.last_player_id.fetch_add(1, Ordering::SeqCst) + 1;
        let player = Player::new(id, name.to_string(), 0, 0, now());
        players.by_name.insert(name.to_string(), id);
        players.by_id.insert(id, Arc::new(Mutex::new(player.clone())));

        info!(player_id = id, name, "Player registered");
        Ok(player)
    }

    #[instrument(skip(self))]
    fn get_player(&self, player_id: PlayerId) -> Result<Player, EngineError> {
        let handle = self.player_handle(player_id)?;
        let player = lock(&handle)?.clone();
        Ok(player)
    }

    #[instrument(skip(self))]
    fn find_player_by_name(&self, name: &str) -> Result<Option<Player>, EngineError> {
        let id = read(&self.players)?.by_name.get(name.trim()).copied();
        id.map(|id| self.get_player(id)).transpose()
    }

    #[instrument(skip(self))]
    fn create_session(&self, first_player: PlayerId) -> Result<Session, EngineError> {
        self.player_handle(first_player)?;

        let session = Session::open(new_session_id(), first_player, now());
        let entry = SessionEntry {
            session: session.clone(),
            moves: Vec::new(),
        };
        write(&self.sessions)?.insert(session.id.clone(), Arc::new(Mutex::new(entry)));

        info!(session_id = %session.id, first_player, "Session created");
        Ok(session)
    }

    #[instrument(skip(self))]
    fn join_session(
        &self,
        session_id: &str,
        second_player: PlayerId,
    ) -> Result<Session, EngineError> {
        let handle = self.session_entry(session_id)?;
        let mut entry = lock(&handle)?;

        let next = transition::join(&entry.session, second_player, now())?;
        self.player_handle(second_player)?;
        entry.session = next.clone();

        info!(session_id, second_player, "Player joined session");
        Ok(next)
    }

    #[instrument(skip(self))]
    fn apply_move(
        &self,
        session_id: &str,
        player_id: PlayerId,
        row: i64,
        col: i64,
    ) -> Result<Session, EngineError> {
        let handle = self.session_entry(session_id)?;
        let mut entry = lock(&handle)?;

        let commit = transition::apply_move(&entry.session, player_id, row, col, now())?;

        // Winner stats first: nothing below can fail once they are written.
        if let Some(credit) = commit.win {
            let winner = self.player_handle(credit.player_id)?;
            lock(&winner)?.credit_win(credit.moves);
            info!(
                player_id = credit.player_id,
                moves = credit.moves,
                "Win credited"
            );
        }
        entry.moves.push(commit.record);
        entry.session = commit.session.clone();

        info!(
            session_id,
            player_id,
            row,
            col,
            status = %commit.session.status,
            move_count = commit.session.move_count,
            "Move committed"
        );
        Ok(commit.session)
    }

    #[instrument(skip(self))]
    fn get_session(&self, session_id: &str) -> Result<Session, EngineError> {
        let handle = self.session_entry(session_id)?;
        let session = lock(&handle)?.session.clone();
        Ok(session)
    }

    #[instrument(skip(self))]
    fn list_sessions_by_status(&self, status: SessionStatus) -> Result<Vec<Session>, EngineError> {
        let sessions = self.collect_sessions(|s| s.status == status)?;
        debug!(count = sessions.len(), "Listed sessions by status");
        Ok(sessions)
    }

    #[instrument(skip(self))]
    fn list_sessions_for_player(&self, player_id: PlayerId) -> Result<Vec<Session>, EngineError> {
        let sessions = self.collect_sessions(|s| s.is_seated(player_id))?;
        debug!(count = sessions.len(), "Listed sessions for player");
        Ok(sessions)
    }

    #[instrument(skip(self))]
    fn list_moves(&self, session_id: &str) -> Result<Vec<MoveRecord>, EngineError> {
        let handle = self.session_entry(session_id)?;
        let moves = lock(&handle)?.moves.clone();
        Ok(moves)
    }

    #[instrument(skip(self))]
    fn ranked_players(&self) -> Result<Vec<Player>, EngineError> {
        let handles: Vec<_> = read(&self.players)?.by_id.values().cloned().collect();
        let mut ranked = Vec::new();
        for handle in handles {
            let player = lock(&handle)?;
            if *player.wins() > 0 {
                ranked.push(player.clone());
            }
        }
        debug!(count = ranked.len(), "Loaded ranked players");
        Ok(ranked)
    }
}

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>, EngineError> {
    lock.read()
        .map_err(|_| EngineError::unavailable("Store lock poisoned"))
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>, EngineError> {
    lock.write()
        .map_err(|_| EngineError::unavailable("Store lock poisoned"))
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, EngineError> {
    mutex
        .lock()
        .map_err(|_| EngineError::unavailable("Session lock poisoned"))
}
