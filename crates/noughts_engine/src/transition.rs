//! Session state machine.
//!
//! Both store backends read the current session under their lock or
//! transaction, compute the next state here, and commit the result as one
//! unit. Nothing in this module performs I/O.

use chrono::NaiveDateTime;
use noughts_grid::{GRID_SIZE, apply_mark, has_winning_line, is_board_full};
use tracing::{debug, instrument, warn};

use crate::{EngineError, EngineErrorKind, MoveRecord, PlayerId, Session, SessionStatus};

/// Aggregate statistics owed to the winner of a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct WinCredit {
    pub player_id: PlayerId,
    /// Session move count at the winning move.
    pub moves: i32,
}

/// Everything an accepted move must commit together.
#[derive(Debug, Clone)]
pub(crate) struct MoveCommit {
    pub session: Session,
    pub record: MoveRecord,
    pub win: Option<WinCredit>,
}

/// Seats the second player.
#[instrument(skip(session, now), fields(session_id = %session.id))]
pub(crate) fn join(
    session: &Session,
    second_player: PlayerId,
    now: NaiveDateTime,
) -> Result<Session, EngineError> {
    if session.status != SessionStatus::Waiting {
        warn!(status = %session.status, "Join rejected: session not waiting");
        return Err(EngineErrorKind::InvalidState {
            session_id: session.id.clone(),
            status: session.status,
            required: SessionStatus::Waiting,
        }
        .into());
    }
    if session.first_player == second_player {
        warn!(player_id = second_player, "Join rejected: self join");
        return Err(EngineErrorKind::SelfJoin {
            player_id: second_player,
        }
        .into());
    }

    // First player keeps the turn.
    let mut next = session.clone();
    next.second_player = Some(second_player);
    next.status = SessionStatus::InProgress;
    next.updated_at = now;
    debug!(player_id = second_player, "Join accepted");
    Ok(next)
}

/// Validates and applies a move.
///
/// Checks run in this order: status, bounds, occupancy, turn. Legality is
/// checked before the turn so that the loser of a race on one cell sees the
/// occupied cell. Coordinates arrive signed; anything outside `0..3`,
/// negative included, is out of bounds.
#[instrument(skip(session, now), fields(session_id = %session.id))]
pub(crate) fn apply_move(
    session: &Session,
    player_id: PlayerId,
    row: i64,
    col: i64,
    now: NaiveDateTime,
) -> Result<MoveCommit, EngineError> {
    if session.status != SessionStatus::InProgress {
        warn!(status = %session.status, "Move rejected: session not in progress");
        return Err(EngineErrorKind::InvalidState {
            session_id: session.id.clone(),
            status: session.status,
            required: SessionStatus::InProgress,
        }
        .into());
    }
    let (Some(row), Some(col)) = (cell_index(row), cell_index(col)) else {
        warn!("Move rejected: out of bounds");
        return Err(EngineErrorKind::OutOfBounds { row, col }.into());
    };
    if !noughts_grid::is_legal_move(&session.grid, row, col) {
        warn!("Move rejected: cell occupied");
        return Err(EngineErrorKind::CellOccupied { row, col }.into());
    }
    let mark = match (session.current_turn, session.mark_of(player_id)) {
        (Some(turn), Some(mark)) if turn == player_id => mark,
        _ => {
            warn!(current_turn = ?session.current_turn, "Move rejected: not player's turn");
            return Err(EngineErrorKind::NotYourTurn { player_id }.into());
        }
    };

    let mut next = session.clone();
    next.grid = apply_mark(&session.grid, row, col, mark);
    next.move_count += 1;
    next.updated_at = now;

    let record = MoveRecord::new(
        next.id.clone(),
        player_id,
        to_i32(row),
        to_i32(col),
        next.move_count,
        now,
    );

    let win = if has_winning_line(&next.grid, mark) {
        next.status = SessionStatus::Won;
        next.winner = Some(player_id);
        next.current_turn = None;
        Some(WinCredit {
            player_id,
            moves: next.move_count,
        })
    } else if is_board_full(&next.grid) {
        next.status = SessionStatus::Drawn;
        next.current_turn = None;
        None
    } else {
        next.current_turn = next.opponent_of(player_id);
        None
    };

    debug!(
        seq = next.move_count,
        status = %next.status,
        "Move accepted"
    );
    Ok(MoveCommit {
        session: next,
        record,
        win,
    })
}

fn cell_index(value: i64) -> Option<usize> {
    usize::try_from(value).ok().filter(|&index| index < GRID_SIZE)
}

// Callers have already bounds-checked against GRID_SIZE.
fn to_i32(value: usize) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}
