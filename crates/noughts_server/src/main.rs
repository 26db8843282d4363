//! Noughts - unified CLI
//!
//! Serves the REST API, prints leaderboards, and drives load simulations.

#![warn(missing_docs)]

mod cli;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use noughts_engine::{Lifecycle, RankingOrder, SqliteStore};
use noughts_server::{AppState, ServerConfig, SimulationConfig, report, router, simulate};
use tracing::{info, instrument, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = ServerConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Serve {
            host,
            port,
            db_path,
        } => {
            let mut config = config;
            if let Some(host) = host {
                config = config.with_host(host);
            }
            if let Some(port) = port {
                config = config.with_port(port);
            }
            if let Some(db_path) = db_path {
                config = config.with_db_path(db_path);
            }
            run_server(config).await
        }
        Command::Leaderboard {
            db_path,
            order,
            limit,
        } => {
            let config = match db_path {
                Some(db_path) => config.with_db_path(db_path),
                None => config,
            };
            print_leaderboard(config, order, limit)
        }
        Command::Show {
            session_id,
            db_path,
        } => {
            let config = match db_path {
                Some(db_path) => config.with_db_path(db_path),
                None => config,
            };
            show_session(config, &session_id)
        }
        Command::Simulate {
            server_url,
            games,
            concurrency,
        } => run_simulation(SimulationConfig::new(server_url, games, concurrency)).await,
    }
}

/// Run the REST server until Ctrl-C.
#[instrument(skip_all, fields(addr = %config.bind_addr()))]
async fn run_server(config: ServerConfig) -> Result<()> {
    info!(db_path = %config.store().db_path(), "Opening session store");
    let store = Arc::new(SqliteStore::open(config.store().clone())?);
    let lifecycle = Lifecycle::new(store.clone());
    let app = router(AppState::new(lifecycle, *config.leaderboard_limit()));

    let listener = tokio::net::TcpListener::bind(config.bind_addr())
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr()))?;
    info!("Server ready at http://{}/", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped, closing store");
    match Arc::try_unwrap(store) {
        Ok(store) => store.close()?,
        Err(_) => warn!("Store still shared at shutdown, skipping checkpoint"),
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

/// Print the leaderboard from the configured database.
#[instrument(skip(config))]
fn print_leaderboard(
    config: ServerConfig,
    order: RankingOrder,
    limit: Option<usize>,
) -> Result<()> {
    let store = Arc::new(SqliteStore::open(config.store().clone())?);
    let lifecycle = Lifecycle::new(store.clone());
    let limit = limit.unwrap_or(*config.leaderboard_limit());
    let entries = lifecycle.leaderboard(order, limit)?;
    drop(lifecycle);

    print!("{}", report::render_leaderboard(&entries, order));

    if let Ok(store) = Arc::try_unwrap(store) {
        store.close()?;
    }
    Ok(())
}

/// Print one session from the configured database.
#[instrument(skip(config))]
fn show_session(config: ServerConfig, session_id: &str) -> Result<()> {
    let store = Arc::new(SqliteStore::open(config.store().clone())?);
    let lifecycle = Lifecycle::new(store.clone());
    let session = lifecycle.session(session_id)?;
    let moves = lifecycle.moves(session_id)?;
    drop(lifecycle);

    print!("{}", report::render_session(&session, &moves));

    if let Ok(store) = Arc::try_unwrap(store) {
        store.close()?;
    }
    Ok(())
}

/// Play simulated games against a running server.
#[instrument(skip_all, fields(server_url = %config.server_url()))]
async fn run_simulation(config: SimulationConfig) -> Result<()> {
    let summary = simulate::run(&config).await;
    println!("{}", summary);
    if *summary.failed() > 0 {
        anyhow::bail!("{} of {} games failed", summary.failed(), summary.total());
    }
    Ok(())
}
