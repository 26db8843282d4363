//! Engine error types.

use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{PlayerId, SessionId, SessionStatus};

/// What went wrong.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum EngineErrorKind {
    /// No session with this id.
    #[display("Session not found: {_0}")]
    SessionNotFound(SessionId),
    /// No player with this id.
    #[display("Player not found: {_0}")]
    PlayerNotFound(PlayerId),
    /// The session's status forbids the operation.
    #[display("Session {session_id} is {status}, operation requires {required}")]
    InvalidState {
        /// Session the operation targeted.
        session_id: SessionId,
        /// Status found under the lock.
        status: SessionStatus,
        /// Status the operation needs.
        required: SessionStatus,
    },
    /// A player tried to join the session they created.
    #[display("Player {player_id} cannot join their own session")]
    SelfJoin {
        /// The creating player.
        player_id: PlayerId,
    },
    /// The acting player does not hold the turn.
    #[display("Not player {player_id}'s turn")]
    NotYourTurn {
        /// The acting player.
        player_id: PlayerId,
    },
    /// Coordinates fall outside the grid.
    #[display("Cell ({row}, {col}) is outside the grid")]
    OutOfBounds {
        /// Requested row.
        row: i64,
        /// Requested column.
        col: i64,
    },
    /// The target cell already holds a mark.
    #[display("Cell ({row}, {col}) is already occupied")]
    CellOccupied {
        /// Requested row.
        row: usize,
        /// Requested column.
        col: usize,
    },
    /// Display name already registered.
    #[display("Display name already taken: {_0}")]
    NameConflict(String),
    /// Display name is empty or blank.
    #[display("Invalid display name: {_0:?}")]
    InvalidName(String),
    /// Storage failed; nothing was committed.
    #[display("Storage unavailable: {_0}")]
    Unavailable(String),
}

impl EngineErrorKind {
    /// Maps the kind onto its stable external code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::SessionNotFound(_) | Self::PlayerNotFound(_) => ErrorCode::NotFound,
            Self::InvalidState { .. } => ErrorCode::InvalidState,
            Self::SelfJoin { .. } => ErrorCode::SelfJoin,
            Self::NotYourTurn { .. } => ErrorCode::NotYourTurn,
            Self::OutOfBounds { .. } | Self::CellOccupied { .. } => ErrorCode::IllegalMove,
            Self::NameConflict(_) => ErrorCode::NameConflict,
            Self::InvalidName(_) => ErrorCode::InvalidRequest,
            Self::Unavailable(_) => ErrorCode::Unavailable,
        }
    }
}

/// Stable signal a caller can branch on.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::AsRefStr,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorCode {
    /// Unknown session or player.
    NotFound,
    /// Session status forbids the operation.
    InvalidState,
    /// Player tried to join their own session.
    SelfJoin,
    /// Acting player is not the current-turn holder.
    NotYourTurn,
    /// Coordinates out of range or cell occupied.
    IllegalMove,
    /// Display name already registered.
    NameConflict,
    /// Malformed request input.
    InvalidRequest,
    /// Transient storage failure; safe to retry.
    Unavailable,
}

/// Engine error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Engine error: {} at {}:{}", kind, file, line)]
pub struct EngineError {
    /// Error kind.
    pub kind: EngineErrorKind,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl EngineError {
    /// Creates a new engine error with caller location tracking.
    #[track_caller]
    #[instrument(skip(kind), fields(kind = %kind))]
    pub fn new(kind: EngineErrorKind) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            line: loc.line(),
            file: loc.file(),
        }
    }

    /// Creates a storage failure error.
    #[track_caller]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::Unavailable(message.into()))
    }

    /// Returns the error kind.
    pub fn kind(&self) -> &EngineErrorKind {
        &self.kind
    }

    /// Returns the stable external code.
    pub fn code(&self) -> ErrorCode {
        self.kind.code()
    }

    /// True when retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self.kind, EngineErrorKind::Unavailable(_))
    }
}

impl From<EngineErrorKind> for EngineError {
    #[track_caller]
    fn from(kind: EngineErrorKind) -> Self {
        Self::new(kind)
    }
}

impl From<diesel::result::Error> for EngineError {
    #[track_caller]
    fn from(err: diesel::result::Error) -> Self {
        Self::unavailable(format!("Diesel error: {}", err))
    }
}

impl From<diesel::ConnectionError> for EngineError {
    #[track_caller]
    fn from(err: diesel::ConnectionError) -> Self {
        Self::unavailable(format!("Connection error: {}", err))
    }
}
