//! Database row models and their domain conversions.

use std::str::FromStr;

use chrono::NaiveDateTime;
use diesel::prelude::*;
use noughts_grid::{GRID_SIZE, Grid};
use tracing::instrument;

use crate::db::schema;
use crate::{EngineError, MoveRecord, Player, Session, SessionStatus};

/// Player row.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = schema::players)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub(crate) struct PlayerRow {
    id: i32,
    name: String,
    wins: i32,
    moves_in_wins: i32,
    created_at: NaiveDateTime,
}

impl From<PlayerRow> for Player {
    fn from(row: PlayerRow) -> Self {
        Player::new(row.id, row.name, row.wins, row.moves_in_wins, row.created_at)
    }
}

/// Insertable player row.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::players)]
pub(crate) struct NewPlayerRow<'a> {
    pub name: &'a str,
    pub wins: i32,
    pub moves_in_wins: i32,
    pub created_at: NaiveDateTime,
}

/// Session row. The grid is stored as nine digits in row-major order.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = schema::sessions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub(crate) struct SessionRow {
    id: String,
    first_player_id: i32,
    second_player_id: Option<i32>,
    current_turn_id: Option<i32>,
    status: String,
    winner_id: Option<i32>,
    grid: String,
    move_count: i32,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl From<&Session> for SessionRow {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id.clone(),
            first_player_id: session.first_player,
            second_player_id: session.second_player,
            current_turn_id: session.current_turn,
            status: session.status.as_ref().to_string(),
            winner_id: session.winner,
            grid: encode_grid(&session.grid),
            move_count: session.move_count,
            created_at: session.created_at,
            updated_at: session.updated_at,
        }
    }
}

impl TryFrom<SessionRow> for Session {
    type Error = EngineError;

    #[instrument(skip(row), fields(session_id = %row.id))]
    fn try_from(row: SessionRow) -> Result<Self, Self::Error> {
        let status = SessionStatus::from_str(&row.status).map_err(|_| {
            EngineError::unavailable(format!(
                "Invalid status '{}' stored for session {}",
                row.status, row.id
            ))
        })?;
        let grid = decode_grid(&row.grid)?;
        Ok(Session {
            id: row.id,
            first_player: row.first_player_id,
            second_player: row.second_player_id,
            current_turn: row.current_turn_id,
            status,
            winner: row.winner_id,
            grid,
            move_count: row.move_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Move row.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = schema::moves)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub(crate) struct MoveRow {
    id: i32,
    session_id: String,
    player_id: i32,
    row_index: i32,
    col_index: i32,
    seq: i32,
    played_at: NaiveDateTime,
}

impl From<MoveRow> for MoveRecord {
    fn from(row: MoveRow) -> Self {
        MoveRecord::new(
            row.session_id,
            row.player_id,
            row.row_index,
            row.col_index,
            row.seq,
            row.played_at,
        )
    }
}

/// Insertable move row.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::moves)]
pub(crate) struct NewMoveRow<'a> {
    session_id: &'a str,
    player_id: i32,
    row_index: i32,
    col_index: i32,
    seq: i32,
    played_at: NaiveDateTime,
}

impl<'a> From<&'a MoveRecord> for NewMoveRow<'a> {
    fn from(record: &'a MoveRecord) -> Self {
        Self {
            session_id: record.session_id(),
            player_id: *record.player_id(),
            row_index: *record.row(),
            col_index: *record.col(),
            seq: *record.seq(),
            played_at: *record.played_at(),
        }
    }
}

/// Encodes a grid as nine digits, row-major.
pub(crate) fn encode_grid(grid: &Grid) -> String {
    grid.cells()
        .map(|(_, _, cell)| char::from(b'0' + u8::from(cell)))
        .collect()
}

/// Decodes the nine-digit grid column.
#[instrument]
pub(crate) fn decode_grid(encoded: &str) -> Result<Grid, EngineError> {
    let digits = encoded.as_bytes();
    if digits.len() != GRID_SIZE * GRID_SIZE {
        return Err(EngineError::unavailable(format!(
            "Stored grid '{}' has {} cells",
            encoded,
            digits.len()
        )));
    }

    let mut values = [[0u8; GRID_SIZE]; GRID_SIZE];
    for (index, digit) in digits.iter().enumerate() {
        values[index / GRID_SIZE][index % GRID_SIZE] = digit.wrapping_sub(b'0');
    }
    Grid::from_values(values)
        .map_err(|e| EngineError::unavailable(format!("Stored grid '{}': {}", encoded, e)))
}
