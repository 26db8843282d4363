//! Win detection.

use crate::{Cell, Grid, Mark};
use tracing::instrument;

/// Three cell coordinates forming a line.
pub type Line = [(usize, usize); 3];

/// Every winning line: rows, then columns, then diagonals.
pub const LINES: [Line; 8] = [
    // Rows
    [(0, 0), (0, 1), (0, 2)],
    [(1, 0), (1, 1), (1, 2)],
    [(2, 0), (2, 1), (2, 2)],
    // Columns
    [(0, 0), (1, 0), (2, 0)],
    [(0, 1), (1, 1), (2, 1)],
    [(0, 2), (1, 2), (2, 2)],
    // Diagonals
    [(0, 0), (1, 1), (2, 2)],
    [(0, 2), (1, 1), (2, 0)],
];

/// Returns the first completed line for `mark`, in [`LINES`] order.
///
/// The order only matters for which line a client highlights; win
/// determination itself is order-independent.
#[instrument(skip(grid))]
pub fn winning_line(grid: &Grid, mark: Mark) -> Option<Line> {
    LINES.into_iter().find(|line| {
        line.iter()
            .all(|&(row, col)| grid.get(row, col) == Some(Cell::Marked(mark)))
    })
}

/// Checks whether `mark` occupies any complete line.
#[instrument(skip(grid))]
pub fn has_winning_line(grid: &Grid, mark: Mark) -> bool {
    winning_line(grid, mark).is_some()
}
