//! Placement rules: legality and applying marks.

use crate::{Cell, GRID_SIZE, Grid, Mark};
use tracing::instrument;

/// Returns a grid with every cell empty.
#[instrument]
pub fn empty_grid() -> Grid {
    Grid::new()
}

/// Checks whether `(row, col)` is on the grid and unoccupied.
///
/// Out-of-range coordinates are illegal rather than an error; the caller
/// decides how to report them.
#[instrument(skip(grid))]
pub fn is_legal_move(grid: &Grid, row: usize, col: usize) -> bool {
    row < GRID_SIZE && col < GRID_SIZE && grid.get(row, col) == Some(Cell::Empty)
}

/// Returns a copy of `grid` with `(row, col)` set to `mark`.
///
/// The input grid is left untouched. Legality must already have been
/// checked with [`is_legal_move`].
#[instrument(skip(grid))]
pub fn apply_mark(grid: &Grid, row: usize, col: usize, mark: Mark) -> Grid {
    debug_assert!(is_legal_move(grid, row, col), "apply_mark on illegal cell");
    let mut next = *grid;
    next.set(row, col, Cell::Marked(mark));
    next
}

/// Counts the non-empty cells.
#[instrument(skip(grid))]
pub fn occupied_count(grid: &Grid) -> usize {
    grid.cells()
        .filter(|(_, _, cell)| *cell != Cell::Empty)
        .count()
}
