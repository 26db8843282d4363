//! Grid rules.
//!
//! Pure functions over [`Grid`](crate::Grid) values. Nothing here touches
//! storage or sessions, so any persistence backend can reuse them.

pub mod draw;
pub mod placement;
pub mod win;

pub use draw::is_board_full;
pub use placement::{apply_mark, empty_grid, is_legal_move, occupied_count};
pub use win::{LINES, Line, has_winning_line, winning_line};
