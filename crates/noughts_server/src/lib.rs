//! REST server and load simulator for the noughts game session engine.
//!
//! - [`config`]: TOML server configuration with environment overrides.
//! - [`routes`]: axum router translating HTTP to the engine facade.
//! - [`simulate`]: concurrent random-play driver over HTTP.
//! - [`report`]: plain-text rendering for CLI output.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod report;
pub mod routes;
pub mod simulate;

pub use config::{ConfigError, DB_PATH_ENV, ServerConfig};
pub use routes::{ApiError, AppState, ErrorBody, router};
pub use simulate::{ApiClient, SimulationConfig, SimulationSummary};
