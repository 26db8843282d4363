//! Load simulation against a running server.
//!
//! Each simulated game registers two fresh players, opens and joins a
//! session, then plays uniformly random empty cells until the session is
//! terminal. Games run concurrently up to a fixed bound. A failed request
//! fails its game; nothing is retried.

use anyhow::{Context, Result, bail};
use derive_getters::Getters;
use futures::{StreamExt, stream};
use noughts_engine::{Player, PlayerId, Session, SessionStatus};
use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, info, instrument, warn};

use crate::routes::{ErrorBody, MoveRequest, RegisterRequest, SeatRequest};

/// Parameters of one simulation run.
#[derive(Debug, Clone, Getters)]
pub struct SimulationConfig {
    /// Base URL of the server, e.g. `http://127.0.0.1:3000`.
    server_url: String,
    /// Games to play.
    games: usize,
    /// Games in flight at once.
    concurrency: usize,
}

impl SimulationConfig {
    /// Creates a run configuration. A zero concurrency is raised to one.
    pub fn new(server_url: impl Into<String>, games: usize, concurrency: usize) -> Self {
        Self {
            server_url: server_url.into().trim_end_matches('/').to_string(),
            games,
            concurrency: concurrency.max(1),
        }
    }
}

/// How the games of a run ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Getters)]
pub struct SimulationSummary {
    /// Games that ended with a winner.
    won: usize,
    /// Games that ended full without a winner.
    drawn: usize,
    /// Games abandoned on a request failure.
    failed: usize,
}

impl SimulationSummary {
    /// Games accounted for.
    pub fn total(&self) -> usize {
        self.won + self.drawn + self.failed
    }
}

impl std::fmt::Display for SimulationSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} games: {} won, {} drawn, {} failed",
            self.total(),
            self.won,
            self.drawn,
            self.failed
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GameOutcome {
    Won,
    Drawn,
}

/// Minimal typed client for the REST surface.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    /// Creates a client for `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: reqwest::Client::new(),
        }
    }

    /// Registers a player.
    #[instrument(skip(self))]
    pub async fn register(&self, name: &str) -> Result<Player> {
        let body = RegisterRequest {
            name: name.to_string(),
        };
        self.post("/players", &body).await
    }

    /// Opens a session.
    #[instrument(skip(self))]
    pub async fn create_session(&self, player_id: PlayerId) -> Result<Session> {
        self.post("/sessions", &SeatRequest { player_id }).await
    }

    /// Joins a waiting session.
    #[instrument(skip(self))]
    pub async fn join(&self, session_id: &str, player_id: PlayerId) -> Result<Session> {
        self.post(&format!("/sessions/{}/join", session_id), &SeatRequest { player_id })
            .await
    }

    /// Plays a move.
    #[instrument(skip(self))]
    pub async fn make_move(
        &self,
        session_id: &str,
        player_id: PlayerId,
        row: usize,
        col: usize,
    ) -> Result<Session> {
        let body = MoveRequest {
            player_id,
            row: i64::try_from(row)?,
            col: i64::try_from(col)?,
        };
        self.post(&format!("/sessions/{}/moves", session_id), &body)
            .await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("POST {} failed", url))?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }
    let body: ErrorBody = response
        .json()
        .await
        .with_context(|| format!("HTTP {} without an error body", status))?;
    bail!("HTTP {} {}: {}", status.as_u16(), body.code, body.message)
}

/// Plays every game of the run and tallies the outcomes.
#[instrument(skip(config), fields(server_url = %config.server_url, games = config.games))]
pub async fn run(config: &SimulationConfig) -> SimulationSummary {
    let client = ApiClient::new(config.server_url.clone());
    let run_tag: u32 = StdRng::from_entropy().r#gen();
    info!(run_tag, concurrency = config.concurrency, "Starting simulation");

    let outcomes: Vec<Result<GameOutcome>> = stream::iter(0..config.games)
        .map(|index| play_game(&client, run_tag, index))
        .buffer_unordered(config.concurrency)
        .collect()
        .await;

    let mut summary = SimulationSummary::default();
    for outcome in outcomes {
        match outcome {
            Ok(GameOutcome::Won) => summary.won += 1,
            Ok(GameOutcome::Drawn) => summary.drawn += 1,
            Err(e) => {
                warn!(error = %e, "Simulated game failed");
                summary.failed += 1;
            }
        }
    }
    info!(%summary, "Simulation finished");
    summary
}

#[instrument(skip(client))]
async fn play_game(client: &ApiClient, run_tag: u32, index: usize) -> Result<GameOutcome> {
    let mut rng = StdRng::from_entropy();
    let first = client.register(&format!("sim-{:08x}-{}-a", run_tag, index)).await?;
    let second = client.register(&format!("sim-{:08x}-{}-b", run_tag, index)).await?;

    let session = client.create_session(*first.id()).await?;
    let mut session = client.join(session.id(), *second.id()).await?;

    while !session.is_terminal() {
        let player = (*session.current_turn())
            .context("in-progress session has no turn holder")?;
        let cells = session.grid().empty_cells();
        let &(row, col) = cells
            .choose(&mut rng)
            .context("in-progress session has no empty cell")?;
        session = client.make_move(session.id(), player, row, col).await?;
    }

    debug!(session_id = %session.id(), status = %session.status(), "Game finished");
    match session.status() {
        SessionStatus::Won => Ok(GameOutcome::Won),
        SessionStatus::Drawn => Ok(GameOutcome::Drawn),
        other => bail!("session ended in non-terminal status {}", other),
    }
}
