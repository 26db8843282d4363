//! Command-line interface for the noughts server.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use noughts_engine::RankingOrder;

/// Noughts - two-player game session server
#[derive(Parser, Debug)]
#[command(name = "noughts")]
#[command(about = "Game session server for two-player noughts and crosses", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the REST server until Ctrl-C
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,

        /// Path to the database file (created if it doesn't exist)
        #[arg(long)]
        db_path: Option<String>,
    },

    /// Print the leaderboard from a database file
    Leaderboard {
        /// Path to the database file
        #[arg(long)]
        db_path: Option<String>,

        /// Ordering: wins or efficiency
        #[arg(long, default_value = "wins")]
        order: RankingOrder,

        /// Number of entries (defaults to the configured limit)
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Print one session's board and move trail from a database file
    Show {
        /// Session id
        session_id: String,

        /// Path to the database file
        #[arg(long)]
        db_path: Option<String>,
    },

    /// Play random games against a running server
    Simulate {
        /// Server URL
        #[arg(long, default_value = "http://127.0.0.1:3000")]
        server_url: String,

        /// Number of games to play
        #[arg(short, long, default_value = "100")]
        games: usize,

        /// Games in flight at once
        #[arg(long, default_value = "8")]
        concurrency: usize,
    },
}
