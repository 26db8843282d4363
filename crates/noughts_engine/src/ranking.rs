//! Leaderboard computation over player aggregates.
//!
//! Only players with at least one win are ranked. Ties on score are broken
//! by player id (registration order), so repeated queries over unchanged data
//! return the same ordering.

use derive_getters::Getters;
use derive_new::new;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::Player;

/// Number of entries the boundary asks for by default.
pub const DEFAULT_LEADERBOARD_LIMIT: usize = 3;

/// Decimal places kept in efficiency scores.
pub const EFFICIENCY_DECIMALS: i32 = 2;

/// How the leaderboard is ordered.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::AsRefStr,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum RankingOrder {
    /// Most wins first.
    #[default]
    Wins,
    /// Fewest average moves per win first.
    Efficiency,
}

/// One row of the leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters, new)]
pub struct LeaderboardEntry {
    /// 1-based position.
    rank: u32,
    /// Player display name.
    name: String,
    /// Wins, or average moves per win, depending on the ordering.
    score: f64,
}

/// Rounds to [`EFFICIENCY_DECIMALS`] places.
fn round_score(value: f64) -> f64 {
    let factor = 10f64.powi(EFFICIENCY_DECIMALS);
    (value * factor).round() / factor
}

/// Ranks `players` and returns at most `limit` entries.
///
/// Players without wins are skipped. An empty result is valid.
#[instrument(skip(players), fields(candidates = players.len()))]
pub fn leaderboard(players: &[Player], order: RankingOrder, limit: usize) -> Vec<LeaderboardEntry> {
    let mut scored: Vec<(&Player, f64)> = players
        .iter()
        .filter_map(|player| {
            let score = match order {
                RankingOrder::Wins => (*player.wins() > 0).then(|| f64::from(*player.wins())),
                RankingOrder::Efficiency => player.average_moves_per_win().map(round_score),
            };
            score.map(|score| (player, score))
        })
        .collect();

    scored.sort_by(|(a, a_score), (b, b_score)| {
        let by_score = match order {
            RankingOrder::Wins => b_score.total_cmp(a_score),
            RankingOrder::Efficiency => a_score.total_cmp(b_score),
        };
        by_score.then_with(|| a.id().cmp(b.id()))
    });

    let entries: Vec<_> = scored
        .into_iter()
        .take(limit)
        .zip(1u32..)
        .map(|((player, score), rank)| LeaderboardEntry::new(rank, player.name().clone(), score))
        .collect();

    debug!(order = %order, count = entries.len(), "Leaderboard computed");
    entries
}
