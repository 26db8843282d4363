//! Draw detection.

use crate::{Cell, Grid};
use tracing::instrument;

/// Checks whether every cell is occupied.
///
/// A full grid with no completed line is a draw.
#[instrument(skip(grid))]
pub fn is_board_full(grid: &Grid) -> bool {
    grid.cells().all(|(_, _, cell)| cell != Cell::Empty)
}
