//! Core value types for the 3x3 grid.

use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Number of rows and columns on the grid.
pub const GRID_SIZE: usize = 3;

/// The token a seated player places on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum Mark {
    /// The session creator's mark (moves first).
    #[display("1")]
    First,
    /// The joining player's mark.
    #[display("2")]
    Second,
}

impl Mark {
    /// Returns the opposing mark.
    pub fn opponent(self) -> Self {
        match self {
            Mark::First => Mark::Second,
            Mark::Second => Mark::First,
        }
    }
}

/// A single cell of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Cell {
    /// Nobody has marked this cell.
    #[default]
    Empty,
    /// Cell holds a player's mark.
    Marked(Mark),
}

impl From<Cell> for u8 {
    fn from(cell: Cell) -> Self {
        match cell {
            Cell::Empty => 0,
            Cell::Marked(Mark::First) => 1,
            Cell::Marked(Mark::Second) => 2,
        }
    }
}

impl TryFrom<u8> for Cell {
    type Error = InvalidCell;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Cell::Empty),
            1 => Ok(Cell::Marked(Mark::First)),
            2 => Ok(Cell::Marked(Mark::Second)),
            other => Err(InvalidCell { value: other }),
        }
    }
}

/// A cell value outside `0..=2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
#[display("Invalid cell value {value} (expected 0, 1 or 2)")]
pub struct InvalidCell {
    /// The rejected value.
    pub value: u8,
}

/// 3x3 grid of cells, row-major.
///
/// `Grid` is `Copy`: every snapshot is an independent value, so a grid read
/// before a move can never observe the mark applied afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Grid {
    cells: [[Cell; GRID_SIZE]; GRID_SIZE],
}

impl Grid {
    /// Creates an empty grid.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a grid from integer rows (0 = empty, 1 = first, 2 = second).
    ///
    /// # Errors
    ///
    /// Returns [`InvalidCell`] if any value is outside `0..=2`.
    #[instrument]
    pub fn from_values(values: [[u8; GRID_SIZE]; GRID_SIZE]) -> Result<Self, InvalidCell> {
        let mut cells = [[Cell::Empty; GRID_SIZE]; GRID_SIZE];
        for (row, row_values) in values.iter().enumerate() {
            for (col, value) in row_values.iter().enumerate() {
                cells[row][col] = Cell::try_from(*value)?;
            }
        }
        Ok(Self { cells })
    }

    /// Returns the cell at `(row, col)`, or `None` when out of range.
    pub fn get(&self, row: usize, col: usize) -> Option<Cell> {
        self.cells.get(row).and_then(|r| r.get(col)).copied()
    }

    /// Returns the grid as integer rows.
    pub fn to_values(&self) -> [[u8; GRID_SIZE]; GRID_SIZE] {
        self.cells.map(|row| row.map(u8::from))
    }

    /// Iterates over every cell with its coordinates.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, Cell)> + '_ {
        self.cells.iter().enumerate().flat_map(|(row, cells)| {
            cells
                .iter()
                .enumerate()
                .map(move |(col, cell)| (row, col, *cell))
        })
    }

    /// Returns the coordinates of every empty cell.
    pub fn empty_cells(&self) -> Vec<(usize, usize)> {
        self.cells()
            .filter(|(_, _, cell)| *cell == Cell::Empty)
            .map(|(row, col, _)| (row, col))
            .collect()
    }

    /// Writes a cell in place. Only this crate mutates grids directly.
    pub(crate) fn set(&mut self, row: usize, col: usize, cell: Cell) {
        self.cells[row][col] = cell;
    }

    /// Formats the grid as a human-readable string.
    pub fn display(&self) -> String {
        let mut result = String::new();
        for (row, cells) in self.cells.iter().enumerate() {
            for (col, cell) in cells.iter().enumerate() {
                let symbol = match cell {
                    Cell::Empty => ".",
                    Cell::Marked(Mark::First) => "X",
                    Cell::Marked(Mark::Second) => "O",
                };
                result.push_str(symbol);
                if col < GRID_SIZE - 1 {
                    result.push('|');
                }
            }
            if row < GRID_SIZE - 1 {
                result.push_str("\n-+-+-\n");
            }
        }
        result
    }
}
