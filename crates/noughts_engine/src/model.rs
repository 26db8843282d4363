//! Session, player and move records.

use chrono::NaiveDateTime;
use derive_getters::Getters;
use derive_new::new;
use noughts_grid::{Grid, Mark, empty_grid};
use serde::{Deserialize, Serialize};

/// Unique identifier for a registered player.
pub type PlayerId = i32;

/// Opaque, globally unique session token.
pub type SessionId = String;

/// Lifecycle status of a session.
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
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SessionStatus {
    /// Created, waiting for a second player.
    Waiting,
    /// Both seats filled, moves accepted.
    InProgress,
    /// A player completed a line.
    Won,
    /// Grid filled without a completed line.
    Drawn,
}

impl SessionStatus {
    /// True for `Won` and `Drawn`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Won | Self::Drawn)
    }
}

/// A registered player and their aggregate statistics.
///
/// `wins` and `moves_in_wins` only ever change together, inside the commit
/// of a winning move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, new)]
pub struct Player {
    id: PlayerId,
    name: String,
    wins: i32,
    moves_in_wins: i32,
    created_at: NaiveDateTime,
}

impl Player {
    /// Average number of session moves per win, if the player has won.
    pub fn average_moves_per_win(&self) -> Option<f64> {
        (self.wins > 0).then(|| f64::from(self.moves_in_wins) / f64::from(self.wins))
    }

    pub(crate) fn credit_win(&mut self, moves: i32) {
        self.wins += 1;
        self.moves_in_wins += moves;
    }
}

/// One game session between two players.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct Session {
    pub(crate) id: SessionId,
    pub(crate) first_player: PlayerId,
    pub(crate) second_player: Option<PlayerId>,
    /// Absent once the session is terminal.
    pub(crate) current_turn: Option<PlayerId>,
    pub(crate) status: SessionStatus,
    pub(crate) winner: Option<PlayerId>,
    pub(crate) grid: Grid,
    pub(crate) move_count: i32,
    pub(crate) created_at: NaiveDateTime,
    pub(crate) updated_at: NaiveDateTime,
}

impl Session {
    /// A fresh session waiting for its second player.
    pub(crate) fn open(id: SessionId, first_player: PlayerId, now: NaiveDateTime) -> Self {
        Self {
            id,
            first_player,
            second_player: None,
            current_turn: Some(first_player),
            status: SessionStatus::Waiting,
            winner: None,
            grid: empty_grid(),
            move_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Checks whether the player holds one of the two seats.
    pub fn is_seated(&self, player_id: PlayerId) -> bool {
        self.first_player == player_id || self.second_player == Some(player_id)
    }

    /// The mark assigned to a seated player.
    pub fn mark_of(&self, player_id: PlayerId) -> Option<Mark> {
        if player_id == self.first_player {
            Some(Mark::First)
        } else if self.second_player == Some(player_id) {
            Some(Mark::Second)
        } else {
            None
        }
    }

    /// The other seated player, if both seats are filled.
    pub fn opponent_of(&self, player_id: PlayerId) -> Option<PlayerId> {
        match self.mark_of(player_id)? {
            Mark::First => self.second_player,
            Mark::Second => Some(self.first_player),
        }
    }

    /// True once the session is won or drawn.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Append-only audit entry for an accepted move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, new)]
pub struct MoveRecord {
    session_id: SessionId,
    player_id: PlayerId,
    row: i32,
    col: i32,
    /// 1-based position within the session.
    seq: i32,
    played_at: NaiveDateTime,
}
