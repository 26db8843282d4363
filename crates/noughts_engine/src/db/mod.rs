//! SQLite persistence for sessions, moves and player statistics.

mod config;
mod models;
mod schema; // Diesel generated schema - internal use only
mod store;

pub use config::StoreConfig;
pub use store::{MIGRATIONS, SqliteStore};
