//! In-process tests for the REST router.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use http_body_util::BodyExt;
use noughts_engine::{
    ErrorCode, LeaderboardEntry, Lifecycle, MemoryStore, MoveRecord, Player, Session,
    SessionStatus,
};
use noughts_server::{AppState, ErrorBody, router};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tower::ServiceExt;

fn app() -> Router {
    let lifecycle = Lifecycle::new(Arc::new(MemoryStore::new()));
    router(AppState::new(lifecycle, 3))
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Vec<u8>) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request");

    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes()
        .to_vec();
    (status, bytes)
}

async fn call<T: DeserializeOwned>(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    expected: StatusCode,
) -> T {
    let (status, bytes) = send(app, method, uri, body).await;
    assert_eq!(status, expected, "body: {}", String::from_utf8_lossy(&bytes));
    serde_json::from_slice(&bytes).expect("json body")
}

async fn fail(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, ErrorBody) {
    let (status, bytes) = send(app, method, uri, body).await;
    assert!(!status.is_success(), "unexpected success");
    let body = serde_json::from_slice(&bytes).expect("error body");
    (status, body)
}

async fn register(app: &Router, name: &str) -> Player {
    call(app, Method::POST, "/players", Some(json!({ "name": name })), StatusCode::CREATED).await
}

async fn started(app: &Router) -> (Player, Player, Session) {
    let ann = register(app, "Ann").await;
    let bo = register(app, "Bo").await;
    let session: Session = call(
        app,
        Method::POST,
        "/sessions",
        Some(json!({ "player_id": ann.id() })),
        StatusCode::CREATED,
    )
    .await;
    let session: Session = call(
        app,
        Method::POST,
        &format!("/sessions/{}/join", session.id()),
        Some(json!({ "player_id": bo.id() })),
        StatusCode::OK,
    )
    .await;
    (ann, bo, session)
}

async fn play(app: &Router, session: &Session, player: &Player, row: i64, col: i64) -> Session {
    call(
        app,
        Method::POST,
        &format!("/sessions/{}/moves", session.id()),
        Some(json!({ "player_id": player.id(), "row": row, "col": col })),
        StatusCode::OK,
    )
    .await
}

#[tokio::test]
async fn test_full_game_over_http() {
    let app = app();
    let (ann, bo, session) = started(&app).await;
    assert_eq!(*session.status(), SessionStatus::InProgress);

    play(&app, &session, &ann, 0, 0).await;
    play(&app, &session, &bo, 1, 1).await;
    play(&app, &session, &ann, 0, 1).await;
    play(&app, &session, &bo, 2, 2).await;
    let done = play(&app, &session, &ann, 0, 2).await;

    assert_eq!(*done.status(), SessionStatus::Won);
    assert_eq!(*done.winner(), Some(*ann.id()));
    assert_eq!(*done.move_count(), 5);

    let moves: Vec<MoveRecord> = call(
        &app,
        Method::GET,
        &format!("/sessions/{}/moves", session.id()),
        None,
        StatusCode::OK,
    )
    .await;
    let seqs: Vec<i32> = moves.iter().map(|m| *m.seq()).collect();
    assert_eq!(seqs, [1, 2, 3, 4, 5]);

    let player: Player = call(
        &app,
        Method::GET,
        &format!("/players/{}", ann.id()),
        None,
        StatusCode::OK,
    )
    .await;
    assert_eq!(*player.wins(), 1);
    assert_eq!(*player.moves_in_wins(), 5);

    let board: Vec<LeaderboardEntry> =
        call(&app, Method::GET, "/leaderboard?order=efficiency", None, StatusCode::OK).await;
    assert_eq!(board.len(), 1);
    assert_eq!(board[0].name(), "Ann");
    assert_eq!(*board[0].score(), 5.0);
}

#[tokio::test]
async fn test_error_codes_and_statuses() {
    let app = app();
    let (ann, bo, session) = started(&app).await;
    let moves_uri = format!("/sessions/{}/moves", session.id());

    let (status, body) = fail(
        &app,
        Method::POST,
        &moves_uri,
        Some(json!({ "player_id": bo.id(), "row": 0, "col": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body.code, ErrorCode::NotYourTurn);

    let (status, body) = fail(
        &app,
        Method::POST,
        &moves_uri,
        Some(json!({ "player_id": ann.id(), "row": -1, "col": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body.code, ErrorCode::IllegalMove);

    let (status, body) = fail(
        &app,
        Method::POST,
        &format!("/sessions/{}/join", session.id()),
        Some(json!({ "player_id": bo.id() })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body.code, ErrorCode::InvalidState);

    let (status, body) = fail(&app, Method::GET, "/sessions/no-such-session", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body.code, ErrorCode::NotFound);

    let (status, body) = fail(&app, Method::POST, "/players", Some(json!({ "name": "Ann" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body.code, ErrorCode::NameConflict);
}

#[tokio::test]
async fn test_self_join_is_rejected() {
    let app = app();
    let ann = register(&app, "Ann").await;
    let session: Session = call(
        &app,
        Method::POST,
        "/sessions",
        Some(json!({ "player_id": ann.id() })),
        StatusCode::CREATED,
    )
    .await;

    let (status, body) = fail(
        &app,
        Method::POST,
        &format!("/sessions/{}/join", session.id()),
        Some(json!({ "player_id": ann.id() })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body.code, ErrorCode::SelfJoin);
}

#[tokio::test]
async fn test_malformed_requests_are_invalid() {
    let app = app();

    let (status, body) = fail(&app, Method::POST, "/players", Some(json!({ "nom": "Ann" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.code, ErrorCode::InvalidRequest);

    let (status, body) = fail(&app, Method::POST, "/players", Some(json!({ "name": "   " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.code, ErrorCode::InvalidRequest);

    let (status, body) = fail(&app, Method::GET, "/players/not-a-number", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.code, ErrorCode::InvalidRequest);

    let (status, body) = fail(&app, Method::GET, "/sessions", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.code, ErrorCode::InvalidRequest);

    let (status, body) = fail(&app, Method::GET, "/leaderboard?order=speed", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.code, ErrorCode::InvalidRequest);

    let (status, body) = fail(&app, Method::GET, "/leaderboard?limit=0", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.code, ErrorCode::InvalidRequest);
}

#[tokio::test]
async fn test_session_listings() {
    let app = app();
    let (ann, _bo, _session) = started(&app).await;
    let _waiting: Session = call(
        &app,
        Method::POST,
        "/sessions",
        Some(json!({ "player_id": ann.id() })),
        StatusCode::CREATED,
    )
    .await;

    let waiting: Vec<Session> =
        call(&app, Method::GET, "/sessions?status=waiting", None, StatusCode::OK).await;
    assert_eq!(waiting.len(), 1);

    let in_progress: Vec<Session> =
        call(&app, Method::GET, "/sessions?status=in_progress", None, StatusCode::OK).await;
    assert_eq!(in_progress.len(), 1);

    let mine: Vec<Session> = call(
        &app,
        Method::GET,
        &format!("/sessions?player_id={}", ann.id()),
        None,
        StatusCode::OK,
    )
    .await;
    assert_eq!(mine.len(), 2);
}

#[tokio::test]
async fn test_empty_leaderboard() {
    let app = app();
    register(&app, "Ann").await;
    let board: Vec<LeaderboardEntry> =
        call(&app, Method::GET, "/leaderboard", None, StatusCode::OK).await;
    assert!(board.is_empty());
}
