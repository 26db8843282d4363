//! Game session engine for two-player noughts and crosses.
//!
//! The engine owns the session state machine, applies each move exactly once
//! together with its side effects, and derives leaderboards from player
//! statistics. It is transport-agnostic: callers hand it player ids and
//! coordinates and get typed outcomes back.
//!
//! # Architecture
//!
//! - **Store**: [`SessionStore`] with an in-memory ([`MemoryStore`]) and a
//!   SQLite ([`SqliteStore`]) backend. Each mutation commits atomically per
//!   session.
//! - **Ranking**: [`leaderboard`] over player aggregates.
//! - **Facade**: [`Lifecycle`], the three externally visible operations plus
//!   read accessors.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use noughts_engine::{Lifecycle, MemoryStore, SessionStatus};
//!
//! # fn main() -> Result<(), noughts_engine::EngineError> {
//! let engine = Lifecycle::new(Arc::new(MemoryStore::new()));
//! let ann = engine.register_player("Ann")?;
//! let bo = engine.register_player("Bo")?;
//!
//! let session = engine.create_session(*ann.id())?;
//! let session = engine.join_session(session.id(), *bo.id())?;
//! assert_eq!(*session.status(), SessionStatus::InProgress);
//!
//! let session = engine.make_move(session.id(), *ann.id(), 1, 1)?;
//! assert_eq!(*session.move_count(), 1);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod db;
mod error;
mod lifecycle;
mod model;
mod ranking;
mod store;
mod transition;

pub use db::{MIGRATIONS, SqliteStore, StoreConfig};
pub use error::{EngineError, EngineErrorKind, ErrorCode};
pub use lifecycle::Lifecycle;
pub use model::{MoveRecord, Player, PlayerId, Session, SessionId, SessionStatus};
pub use ranking::{
    DEFAULT_LEADERBOARD_LIMIT, EFFICIENCY_DECIMALS, LeaderboardEntry, RankingOrder, leaderboard,
};
pub use store::{MemoryStore, SessionStore};
