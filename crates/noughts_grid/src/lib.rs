//! Pure grid logic for two-player noughts and crosses.
//!
//! Everything in this crate is a side-effect-free function over the
//! [`Grid`] value type: empty-grid construction, move legality, win and
//! draw detection. Session state and persistence live in `noughts_engine`.
//!
//! # Example
//!
//! ```
//! use noughts_grid::{Mark, apply_mark, empty_grid, has_winning_line, is_legal_move};
//!
//! let grid = empty_grid();
//! assert!(is_legal_move(&grid, 1, 1));
//!
//! let grid = apply_mark(&grid, 1, 1, Mark::First);
//! assert!(!is_legal_move(&grid, 1, 1));
//! assert!(!has_winning_line(&grid, Mark::First));
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod rules;
mod types;

pub use rules::{
    LINES, Line, apply_mark, empty_grid, has_winning_line, is_board_full, is_legal_move,
    occupied_count, winning_line,
};
pub use types::{Cell, GRID_SIZE, Grid, InvalidCell, Mark};
