//! REST routes over the session lifecycle.
//!
//! Handlers are a thin translation layer: decode the request, run the
//! blocking engine call on the blocking pool, encode the outcome. Failures
//! become `{ "code": ..., "message": ... }` bodies carrying the stable
//! [`ErrorCode`].

use axum::{
    Json, Router,
    body::Body,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use derive_getters::Getters;
use derive_more::{Display, Error};
use noughts_engine::{
    EngineError, ErrorCode, LeaderboardEntry, Lifecycle, MoveRecord, Player, PlayerId,
    RankingOrder, Session, SessionStatus,
};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tracing::{debug, instrument, warn};

/// Shared handler state.
#[derive(Debug, Clone, Getters)]
pub struct AppState {
    /// Engine facade.
    lifecycle: Lifecycle,
    /// Leaderboard size when the request names none.
    leaderboard_limit: usize,
}

impl AppState {
    /// Creates handler state.
    pub fn new(lifecycle: Lifecycle, leaderboard_limit: usize) -> Self {
        Self {
            lifecycle,
            leaderboard_limit,
        }
    }
}

/// Body of `POST /players`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    /// Display name, unique across players.
    pub name: String,
}

/// Body of `POST /sessions` and `POST /sessions/{id}/join`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatRequest {
    /// Player taking the seat.
    pub player_id: PlayerId,
}

/// Body of `POST /sessions/{id}/moves`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveRequest {
    /// Player making the move.
    pub player_id: PlayerId,
    /// Row index, 0-based.
    pub row: i64,
    /// Column index, 0-based.
    pub col: i64,
}

/// Query of `GET /sessions`. Exactly one filter must be given.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionsQuery {
    /// Sessions in this status.
    pub status: Option<SessionStatus>,
    /// Sessions this player is seated in.
    pub player_id: Option<PlayerId>,
}

/// Query of `GET /leaderboard`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeaderboardQuery {
    /// Ordering, wins when absent.
    pub order: Option<RankingOrder>,
    /// Maximum entries, the configured default when absent.
    pub limit: Option<usize>,
}

/// Error response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Stable machine-readable code.
    pub code: ErrorCode,
    /// Human-readable detail.
    pub message: String,
}

/// A failed request, rendered as an [`ErrorBody`].
#[derive(Debug, Clone, Display, Error)]
#[display("{}: {}", code, message)]
pub struct ApiError {
    /// Stable machine-readable code.
    pub code: ErrorCode,
    /// Human-readable detail.
    pub message: String,
}

impl ApiError {
    /// Malformed or contradictory request.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::InvalidRequest,
            message: message.into(),
        }
    }

    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        status_for(self.code)
    }
}

/// Maps an error code to its HTTP status.
pub fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::InvalidState
        | ErrorCode::SelfJoin
        | ErrorCode::NotYourTurn
        | ErrorCode::NameConflict => StatusCode::CONFLICT,
        ErrorCode::IllegalMove => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorCode::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        Self {
            code: err.code(),
            message: err.kind().to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::invalid_request(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::invalid_request(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::invalid_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(code = %self.code, message = %self.message, "Request failed");
        } else {
            debug!(code = %self.code, message = %self.message, "Request rejected");
        }
        let body = ErrorBody {
            code: self.code,
            message: self.message,
        };
        (status, Json(body)).into_response()
    }
}

/// Runs a store call on the blocking pool.
async fn blocking<T, F>(call: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, EngineError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(call)
        .await
        .map_err(|e| ApiError {
            code: ErrorCode::Unavailable,
            message: format!("worker task failed: {}", e),
        })?
        .map_err(ApiError::from)
}

fn log_request(req: Request<Body>) -> Request<Body> {
    debug!(method = %req.method(), uri = %req.uri(), "Incoming HTTP request");
    req
}

/// Builds the REST router.
#[instrument(skip(state))]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/players", post(register_player))
        .route("/players/{id}", get(get_player))
        .route("/sessions", post(create_session).get(list_sessions))
        .route("/sessions/{id}", get(get_session))
        .route("/sessions/{id}/join", post(join_session))
        .route("/sessions/{id}/moves", post(make_move).get(list_moves))
        .route("/leaderboard", get(leaderboard))
        .layer(ServiceBuilder::new().map_request(log_request))
        .with_state(state)
}

#[instrument(skip_all)]
async fn register_player(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Player>), ApiError> {
    let Json(request) = payload?;
    let lifecycle = state.lifecycle.clone();
    let player = blocking(move || lifecycle.register_player(&request.name)).await?;
    Ok((StatusCode::CREATED, Json(player)))
}

#[instrument(skip_all)]
async fn get_player(
    State(state): State<AppState>,
    id: Result<Path<PlayerId>, PathRejection>,
) -> Result<Json<Player>, ApiError> {
    let Path(player_id) = id?;
    let lifecycle = state.lifecycle.clone();
    Ok(Json(blocking(move || lifecycle.player(player_id)).await?))
}

#[instrument(skip_all)]
async fn create_session(
    State(state): State<AppState>,
    payload: Result<Json<SeatRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Session>), ApiError> {
    let Json(request) = payload?;
    let lifecycle = state.lifecycle.clone();
    let session = blocking(move || lifecycle.create_session(request.player_id)).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

#[instrument(skip_all)]
async fn list_sessions(
    State(state): State<AppState>,
    query: Result<Query<SessionsQuery>, QueryRejection>,
) -> Result<Json<Vec<Session>>, ApiError> {
    let Query(query) = query?;
    let lifecycle = state.lifecycle.clone();
    let sessions = match (query.status, query.player_id) {
        (Some(status), None) => blocking(move || lifecycle.sessions_by_status(status)).await?,
        (None, Some(player_id)) => {
            blocking(move || lifecycle.sessions_for_player(player_id)).await?
        }
        _ => {
            return Err(ApiError::invalid_request(
                "exactly one of `status` or `player_id` is required",
            ));
        }
    };
    Ok(Json(sessions))
}

#[instrument(skip_all)]
async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Session>, ApiError> {
    let lifecycle = state.lifecycle.clone();
    Ok(Json(blocking(move || lifecycle.session(&session_id)).await?))
}

#[instrument(skip_all)]
async fn join_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    payload: Result<Json<SeatRequest>, JsonRejection>,
) -> Result<Json<Session>, ApiError> {
    let Json(request) = payload?;
    let lifecycle = state.lifecycle.clone();
    let session = blocking(move || lifecycle.join_session(&session_id, request.player_id)).await?;
    Ok(Json(session))
}

#[instrument(skip_all)]
async fn make_move(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    payload: Result<Json<MoveRequest>, JsonRejection>,
) -> Result<Json<Session>, ApiError> {
    let Json(request) = payload?;
    let lifecycle = state.lifecycle.clone();
    let session = blocking(move || {
        lifecycle.make_move(&session_id, request.player_id, request.row, request.col)
    })
    .await?;
    Ok(Json(session))
}

#[instrument(skip_all)]
async fn list_moves(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Vec<MoveRecord>>, ApiError> {
    let lifecycle = state.lifecycle.clone();
    Ok(Json(blocking(move || lifecycle.moves(&session_id)).await?))
}

#[instrument(skip_all)]
async fn leaderboard(
    State(state): State<AppState>,
    query: Result<Query<LeaderboardQuery>, QueryRejection>,
) -> Result<Json<Vec<LeaderboardEntry>>, ApiError> {
    let Query(query) = query?;
    let order = query.order.unwrap_or_default();
    let limit = query.limit.unwrap_or(state.leaderboard_limit);
    if limit == 0 {
        return Err(ApiError::invalid_request("`limit` must be at least 1"));
    }
    let lifecycle = state.lifecycle.clone();
    Ok(Json(blocking(move || lifecycle.leaderboard(order, limit)).await?))
}
