//! Scenario suite shared by every store backend.

#![allow(dead_code)]

use std::sync::Barrier;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use noughts_engine::{
    EngineErrorKind, ErrorCode, Player, RankingOrder, Session, SessionStatus, SessionStore,
    leaderboard,
};
use noughts_grid::occupied_count;

/// Registers two players and returns a started session between them.
pub fn started_session(store: &dyn SessionStore, a: &str, b: &str) -> (Player, Player, Session) {
    let first = store.register_player(a).expect("register first");
    let second = store.register_player(b).expect("register second");
    let session = store.create_session(*first.id()).expect("create");
    let session = store
        .join_session(session.id(), *second.id())
        .expect("join");
    (first, second, session)
}

/// Plays `(is_first, row, col)` moves and checks the move count after each.
pub fn play(store: &dyn SessionStore, session: &Session, moves: &[(bool, i64, i64)]) -> Session {
    let first = *session.first_player();
    let second = session.second_player().expect("second seated");
    let mut current = session.clone();
    for &(is_first, row, col) in moves {
        let player = if is_first { first } else { second };
        current = store
            .apply_move(session.id(), player, row, col)
            .expect("legal move");
        assert_eq!(
            *current.move_count() as usize,
            occupied_count(current.grid()),
            "move count must equal occupied cells"
        );
    }
    current
}

pub const TOP_ROW_WIN: [(bool, i64, i64); 5] = [
    (true, 0, 0),
    (false, 1, 1),
    (true, 0, 1),
    (false, 1, 0),
    (true, 0, 2),
];

// Ends as [[1,2,1],[1,2,2],[2,1,1]] with no completed line.
const DRAW: [(bool, i64, i64); 9] = [
    (true, 0, 0),
    (false, 1, 1),
    (true, 0, 2),
    (false, 0, 1),
    (true, 2, 1),
    (false, 1, 2),
    (true, 1, 0),
    (false, 2, 0),
    (true, 2, 2),
];

pub fn scenario_a_top_row_win(store: &dyn SessionStore) {
    let (ann, bo, session) = started_session(store, "Ann", "Bo");
    let done = play(store, &session, &TOP_ROW_WIN);

    assert_eq!(*done.status(), SessionStatus::Won);
    assert_eq!(*done.winner(), Some(*ann.id()));
    assert_eq!(*done.current_turn(), None);
    assert_eq!(done.grid().to_values(), [[1, 1, 1], [2, 2, 0], [0, 0, 0]]);

    let ann = store.get_player(*ann.id()).expect("ann");
    assert_eq!(*ann.wins(), 1);
    assert_eq!(*ann.moves_in_wins(), 5);

    let bo = store.get_player(*bo.id()).expect("bo");
    assert_eq!(*bo.wins(), 0);
    assert_eq!(*bo.moves_in_wins(), 0);
}

pub fn scenario_b_draw(store: &dyn SessionStore) {
    let (ann, bo, session) = started_session(store, "Ann", "Bo");
    let done = play(store, &session, &DRAW);

    assert_eq!(*done.status(), SessionStatus::Drawn);
    assert_eq!(*done.winner(), None);
    assert_eq!(*done.current_turn(), None);
    assert_eq!(*done.move_count(), 9);
    assert_eq!(done.grid().to_values(), [[1, 2, 1], [1, 2, 2], [2, 1, 1]]);

    for id in [*ann.id(), *bo.id()] {
        let player = store.get_player(id).expect("player");
        assert_eq!(*player.wins(), 0);
        assert_eq!(*player.moves_in_wins(), 0);
    }
}

pub fn scenario_c_join_in_progress(store: &dyn SessionStore) {
    let (_, _, session) = started_session(store, "Ann", "Bo");
    let cy = store.register_player("Cy").expect("register");

    let err = store
        .join_session(session.id(), *cy.id())
        .expect_err("join of started session");
    assert_eq!(err.code(), ErrorCode::InvalidState);

    let unchanged = store.get_session(session.id()).expect("get");
    assert_eq!(unchanged, session);
}

pub fn scenario_d_same_cell_race(store: &dyn SessionStore) {
    let (ann, _, session) = started_session(store, "Ann", "Bo");
    let barrier = Barrier::new(2);

    let results: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..2)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    store.apply_move(session.id(), *ann.id(), 1, 1)
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("thread"))
            .collect::<Vec<_>>()
    });

    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one racer wins: {results:?}");
    let loser = results
        .iter()
        .find_map(|r| r.as_ref().err())
        .expect("one failure");
    assert_eq!(loser.code(), ErrorCode::IllegalMove);
    assert_eq!(
        loser.kind(),
        &EngineErrorKind::CellOccupied { row: 1, col: 1 }
    );

    let after = store.get_session(session.id()).expect("get");
    assert_eq!(*after.move_count(), 1);
    assert_eq!(after.grid().to_values(), [[0, 0, 0], [0, 1, 0], [0, 0, 0]]);
    assert_eq!(store.list_moves(session.id()).expect("moves").len(), 1);
}

pub fn concurrent_joins_seat_one_player(store: &dyn SessionStore) {
    let host = store.register_player("Host").expect("register");
    let guests: Vec<_> = (0..4)
        .map(|i| store.register_player(&format!("Guest{i}")).expect("register"))
        .collect();
    let session = store.create_session(*host.id()).expect("create");
    let barrier = Barrier::new(guests.len());

    let results: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = guests
            .iter()
            .map(|guest| {
                let barrier = &barrier;
                let session_id = session.id().as_str();
                scope.spawn(move || {
                    barrier.wait();
                    store.join_session(session_id, *guest.id())
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("thread"))
            .collect::<Vec<_>>()
    });

    let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(winners.len(), 1);
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert_eq!(err.code(), ErrorCode::InvalidState);
    }

    let seated = store.get_session(session.id()).expect("get");
    assert_eq!(*seated.status(), SessionStatus::InProgress);
    assert_eq!(seated.second_player(), winners[0].second_player());
    assert_eq!(*seated.current_turn(), Some(*host.id()));
}

pub fn replayed_winning_move_is_invalid_state(store: &dyn SessionStore) {
    let (ann, _, session) = started_session(store, "Ann", "Bo");
    play(store, &session, &TOP_ROW_WIN);

    for _ in 0..3 {
        let err = store
            .apply_move(session.id(), *ann.id(), 0, 2)
            .expect_err("replay");
        assert_eq!(err.code(), ErrorCode::InvalidState);
    }

    let ann = store.get_player(*ann.id()).expect("ann");
    assert_eq!(*ann.wins(), 1);
    assert_eq!(*ann.moves_in_wins(), 5);
}

pub fn rule_violations_leave_session_unchanged(store: &dyn SessionStore) {
    let (ann, bo, session) = started_session(store, "Ann", "Bo");

    let err = store.apply_move(session.id(), *bo.id(), 0, 0).expect_err("turn");
    assert_eq!(err.code(), ErrorCode::NotYourTurn);

    let err = store.apply_move(session.id(), *ann.id(), 3, 0).expect_err("bounds");
    assert_eq!(err.code(), ErrorCode::IllegalMove);
    assert!(matches!(err.kind(), EngineErrorKind::OutOfBounds { row: 3, col: 0 }));

    let stranger = store.register_player("Stranger").expect("register");
    let err = store
        .apply_move(session.id(), *stranger.id(), 0, 0)
        .expect_err("stranger");
    assert_eq!(err.code(), ErrorCode::NotYourTurn);

    let err = store.apply_move("no-such-session", *ann.id(), 0, 0).expect_err("missing");
    assert_eq!(err.code(), ErrorCode::NotFound);

    assert_eq!(store.get_session(session.id()).expect("get"), session);
    assert!(store.list_moves(session.id()).expect("moves").is_empty());
}

pub fn waiting_session_rules(store: &dyn SessionStore) {
    let ann = store.register_player("Ann").expect("register");
    let session = store.create_session(*ann.id()).expect("create");
    assert_eq!(*session.status(), SessionStatus::Waiting);
    assert_eq!(*session.current_turn(), Some(*ann.id()));
    assert_eq!(*session.second_player(), None);

    let err = store.apply_move(session.id(), *ann.id(), 0, 0).expect_err("not started");
    assert_eq!(err.code(), ErrorCode::InvalidState);

    let err = store.join_session(session.id(), *ann.id()).expect_err("self join");
    assert_eq!(err.code(), ErrorCode::SelfJoin);

    let err = store.join_session(session.id(), 9_999).expect_err("unknown player");
    assert_eq!(err.code(), ErrorCode::NotFound);

    let err = store.join_session("missing", *ann.id()).expect_err("unknown session");
    assert_eq!(err.code(), ErrorCode::NotFound);

    let err = store.create_session(9_999).expect_err("unknown creator");
    assert_eq!(err.code(), ErrorCode::NotFound);

    assert_eq!(store.get_session(session.id()).expect("get"), session);
}

pub fn move_records_are_sequential(store: &dyn SessionStore) {
    let (ann, bo, session) = started_session(store, "Ann", "Bo");
    play(store, &session, &TOP_ROW_WIN);

    let moves = store.list_moves(session.id()).expect("moves");
    let seqs: Vec<_> = moves.iter().map(|m| *m.seq()).collect();
    assert_eq!(seqs, [1, 2, 3, 4, 5]);

    let players: Vec<_> = moves.iter().map(|m| *m.player_id()).collect();
    assert_eq!(players, [*ann.id(), *bo.id(), *ann.id(), *bo.id(), *ann.id()]);
    assert_eq!((*moves[4].row(), *moves[4].col()), (0, 2));

    let err = store.list_moves("missing").expect_err("missing");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

pub fn registration_rules(store: &dyn SessionStore) {
    let ann = store.register_player("Ann").expect("register");
    assert_eq!(ann.name(), "Ann");
    assert_eq!(*ann.wins(), 0);

    let err = store.register_player("Ann").expect_err("duplicate");
    assert_eq!(err.code(), ErrorCode::NameConflict);

    let err = store.register_player("   ").expect_err("blank");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);

    let found = store.find_player_by_name("Ann").expect("lookup");
    assert_eq!(found.as_ref().map(|p| *p.id()), Some(*ann.id()));
    assert!(store.find_player_by_name("Nobody").expect("lookup").is_none());

    let err = store.get_player(9_999).expect_err("missing");
    assert_eq!(err.code(), ErrorCode::NotFound);

    let bo = store.register_player("Bo").expect("register");
    assert!(bo.id() > ann.id());
}

pub fn listings(store: &dyn SessionStore) {
    let (ann, bo, started) = started_session(store, "Ann", "Bo");
    let waiting = store.create_session(*ann.id()).expect("create");
    let cy = store.register_player("Cy").expect("register");
    let cy_session = store.create_session(*cy.id()).expect("create");

    let waiting_ids: Vec<_> = store
        .list_sessions_by_status(SessionStatus::Waiting)
        .expect("list")
        .into_iter()
        .map(|s| s.id().clone())
        .collect();
    assert_eq!(waiting_ids.len(), 2);
    assert!(waiting_ids.contains(waiting.id()));
    assert!(waiting_ids.contains(cy_session.id()));

    let in_progress = store
        .list_sessions_by_status(SessionStatus::InProgress)
        .expect("list");
    assert_eq!(in_progress.len(), 1);
    assert_eq!(in_progress[0].id(), started.id());

    assert_eq!(store.list_sessions_for_player(*ann.id()).expect("list").len(), 2);
    assert_eq!(store.list_sessions_for_player(*bo.id()).expect("list").len(), 1);
    assert!(store.list_sessions_by_status(SessionStatus::Won).expect("list").is_empty());

    // Touching a session moves it to the front.
    let ann_sessions = store.list_sessions_for_player(*ann.id()).expect("list");
    let touched = store
        .apply_move(started.id(), *ann.id(), 0, 0)
        .expect("move");
    let ann_sessions_after = store.list_sessions_for_player(*ann.id()).expect("list");
    assert_eq!(ann_sessions.len(), ann_sessions_after.len());
    assert_eq!(ann_sessions_after[0].id(), touched.id());
}

pub fn scenario_e_empty_leaderboard(store: &dyn SessionStore) {
    store.register_player("Ann").expect("register");
    store.register_player("Bo").expect("register");

    let ranked = store.ranked_players().expect("ranked");
    assert!(ranked.is_empty());
    assert!(leaderboard(&ranked, RankingOrder::Wins, 3).is_empty());
    assert!(leaderboard(&ranked, RankingOrder::Efficiency, 3).is_empty());
}

/// Many independent games in parallel; aggregates must add up exactly and
/// a concurrent reader never sees `wins` without its `moves_in_wins`.
pub fn parallel_sessions_keep_stats_consistent(store: &dyn SessionStore) {
    let ann = store.register_player("Ann").expect("register");
    let bo = store.register_player("Bo").expect("register");
    let games = 8;
    let done = AtomicBool::new(false);

    let snapshots = thread::scope(|scope| {
        let reader = scope.spawn(|| {
            let mut snapshots = 0;
            loop {
                let finished = done.load(Ordering::SeqCst);
                let seen = store.get_player(*ann.id()).expect("read ann");
                assert_eq!(
                    *seen.moves_in_wins(),
                    *seen.wins() * 5,
                    "wins and moves_in_wins observed out of step"
                );
                snapshots += 1;
                if finished {
                    break snapshots;
                }
            }
        });

        let mut players = Vec::new();
        for _ in 0..games {
            players.push(scope.spawn(|| {
                let session = store.create_session(*ann.id()).expect("create");
                let session = store.join_session(session.id(), *bo.id()).expect("join");
                play(store, &session, &TOP_ROW_WIN);
            }));
        }
        for handle in players {
            handle.join().expect("game thread");
        }
        done.store(true, Ordering::SeqCst);
        reader.join().expect("reader thread")
    });
    assert!(snapshots > 0);

    let ann = store.get_player(*ann.id()).expect("ann");
    assert_eq!(*ann.wins(), games);
    assert_eq!(*ann.moves_in_wins(), games * 5);

    let won = store.list_sessions_by_status(SessionStatus::Won).expect("list");
    assert_eq!(won.len(), games as usize);

    let board = leaderboard(&store.ranked_players().expect("ranked"), RankingOrder::Efficiency, 3);
    assert_eq!(board.len(), 1);
    assert_eq!(board[0].name(), "Ann");
    assert_eq!(*board[0].score(), 5.0);
}
