//! Plain-text rendering for CLI output.

use std::fmt::Write;

use noughts_engine::{LeaderboardEntry, MoveRecord, RankingOrder, Session};

/// Renders a leaderboard as an aligned table.
pub fn render_leaderboard(entries: &[LeaderboardEntry], order: RankingOrder) -> String {
    if entries.is_empty() {
        return "No winners yet.\n".to_string();
    }
    let mut out = format!("{:>4}  {:<24} {:>10}\n", "rank", "name", order.as_ref());
    for entry in entries {
        out.push_str(&format!(
            "{:>4}  {:<24} {:>10}\n",
            entry.rank(),
            entry.name(),
            entry.score()
        ));
    }
    out
}

/// Renders a session: header, board and move trail.
pub fn render_session(session: &Session, moves: &[MoveRecord]) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(out, "session {}", session.id());
    let _ = writeln!(out, "status  {}", session.status());
    let _ = writeln!(
        out,
        "players X={} O={}",
        session.first_player(),
        session
            .second_player()
            .map_or_else(|| "-".to_string(), |id| id.to_string())
    );
    if let Some(winner) = session.winner() {
        let _ = writeln!(out, "winner  {}", winner);
    }
    if let Some(turn) = session.current_turn() {
        let _ = writeln!(out, "turn    {}", turn);
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", session.grid().display());
    if !moves.is_empty() {
        let _ = writeln!(out);
        for record in moves {
            let _ = writeln!(
                out,
                "{:>2}. player {} -> ({}, {})",
                record.seq(),
                record.player_id(),
                record.row(),
                record.col()
            );
        }
    }
    out
}
