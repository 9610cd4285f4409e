//! Tests for the turn controller.

use std::sync::{Arc, Mutex};
use strictly_board::{
    Board, Event, EventKind, FnListener, FnRules, GameSession, Loc, ManualScheduler, Move,
    MoveOutcome, PieceId, Player, PlayerId, RelocateRules, Rules, SessionError,
};

fn two_player_session() -> (GameSession<RelocateRules>, Arc<Mutex<Vec<Event>>>) {
    let mut session = GameSession::new(
        "session-test",
        Board::new(3, 3),
        RelocateRules,
        Arc::new(ManualScheduler::new()),
    );
    session
        .wire_players(vec![Player::new(0, "White", 1), Player::new(1, "Black", 1)])
        .unwrap();
    session.place_piece(PieceId::new(0, 0), Loc::new(0, 0)).unwrap();
    session.place_piece(PieceId::new(1, 0), Loc::new(2, 2)).unwrap();

    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    session.subscribe(Arc::new(FnListener(move |event: &Event| {
        sink.lock().unwrap().push(event.clone());
    })));
    (session, log)
}

#[test]
fn test_two_player_scenario() {
    let (mut session, log) = two_player_session();
    assert_eq!(session.current_player_id(), Some(0));

    assert!(session.submit_move(Move::between(0, 0, 1, 1)));
    assert_eq!(session.move_count(), 1);
    assert_eq!(session.current_player_id(), Some(1));

    let events = log.lock().unwrap();
    assert_eq!(events.len(), 1);
    match &events[0].kind {
        EventKind::Move(mv) => {
            assert_eq!(mv.dest_row(), 1);
            assert_eq!(mv.dest_column(), 1);
            assert_eq!(mv.source_row(), 0);
            assert_eq!(mv.source_column(), 0);
            assert!(!mv.pebble_killed());
            assert_eq!(mv.moved, Some(PieceId::new(0, 0)));
        }
        other => panic!("expected move event, got {:?}", other),
    }
    assert_eq!(events[0].session, "session-test");
}

#[test]
fn test_rejected_move_changes_nothing() {
    let (mut session, log) = two_player_session();
    session.attach_timer(1, 10).unwrap();
    session.start_timer().unwrap();
    let generation = session.timer().unwrap().generation();

    // Empty source cell.
    let outcome = session.submit_move_detailed(Move::between(1, 1, 0, 1));
    assert_eq!(outcome, MoveOutcome::Rejected);
    assert_eq!(session.move_count(), 0);
    assert_eq!(session.current_player_id(), Some(0));
    assert_eq!(session.timer().unwrap().generation(), generation);
    assert_eq!(session.timer_remaining(0), Some(10));
    assert!(log.lock().unwrap().is_empty());
    assert_eq!(session.piece_at(0, 0).unwrap().id(), PieceId::new(0, 0));
}

#[test]
fn test_history_matches_accepted_moves() {
    let (mut session, _log) = two_player_session();
    let script = [
        (Move::between(0, 0, 0, 1), true),
        (Move::between(0, 0, 1, 0), false),
        (Move::between(2, 2, 2, 1), true),
        (Move::between(0, 1, 0, 1), false),
        (Move::between(0, 1, 1, 1), true),
    ];
    let mut accepted = Vec::new();
    for (mv, expected) in script {
        assert_eq!(session.submit_move(mv), expected, "move {}", mv);
        if expected {
            accepted.push(mv);
        }
    }
    assert_eq!(session.move_count(), accepted.len());
    for (index, mv) in accepted.iter().enumerate() {
        let recorded = session.move_at(index).unwrap();
        assert_eq!((recorded.src, recorded.dst), (mv.src, mv.dst));
    }
    assert!(session.move_at(accepted.len()).is_none());
}

#[test]
fn test_capture_updates_stats_and_history() {
    let (mut session, log) = two_player_session();
    assert!(session.submit_move(Move::between(0, 0, 2, 2)));

    assert_eq!(session.history()[0].captured, Some(PieceId::new(1, 0)));
    assert_eq!(session.stats(1).unwrap().live_pieces(), 0);
    assert_eq!(session.stats(1).unwrap().killed_pieces(), &[PieceId::new(1, 0)]);
    assert_eq!(session.stats(0).unwrap().live_pieces(), 1);
    assert_eq!(session.piece_at(2, 2).unwrap().owner(), 0);

    let events = log.lock().unwrap();
    match &events[0].kind {
        EventKind::Move(mv) => {
            assert!(mv.pebble_killed());
            assert_eq!(mv.killed, Some(PieceId::new(1, 0)));
        }
        other => panic!("expected move event, got {:?}", other),
    }
}

struct CountingRules {
    wiped_out: Arc<Mutex<Vec<PlayerId>>>,
}

impl Rules for CountingRules {
    fn handle(&mut self, board: &mut Board, mv: &Move) -> bool {
        RelocateRules.handle(board, mv)
    }

    fn on_player_lost_all_pieces(&mut self, loser: PlayerId) {
        self.wiped_out.lock().unwrap().push(loser);
    }
}

#[test]
fn test_lost_all_pieces_hook() {
    let wiped_out = Arc::new(Mutex::new(Vec::new()));
    let mut session = GameSession::new(
        "hook",
        Board::new(1, 3),
        CountingRules {
            wiped_out: Arc::clone(&wiped_out),
        },
        Arc::new(ManualScheduler::new()),
    );
    session
        .wire_players(vec![Player::new(0, "Ann", 1), Player::new(1, "Bob", 2)])
        .unwrap();
    session.place_piece(PieceId::new(0, 0), Loc::new(0, 0)).unwrap();
    session.place_piece(PieceId::new(1, 0), Loc::new(0, 1)).unwrap();
    session.place_piece(PieceId::new(1, 1), Loc::new(0, 2)).unwrap();

    assert!(session.submit_move(Move::between(0, 0, 0, 1)));
    assert!(wiped_out.lock().unwrap().is_empty());
    assert!(session.submit_move(Move::between(0, 2, 0, 1)));
    assert_eq!(*wiped_out.lock().unwrap(), vec![0]);
}

#[test]
fn test_resignation_ends_session() {
    let (mut session, log) = two_player_session();
    let event = session.accept_resignation(1);
    assert_eq!(event.kind, EventKind::Finish { winner: 1 });
    assert!(session.is_dead());

    assert_eq!(
        session.submit_move_detailed(Move::between(0, 0, 1, 1)),
        MoveOutcome::SessionFinished
    );
    assert!(!session.submit_move(Move::between(0, 0, 1, 1)));
    assert_eq!(session.move_count(), 0);
    assert_eq!(log.lock().unwrap().len(), 1);
}

#[test]
fn test_listener_finishing_game_blocks_next_move() {
    let (mut session, _log) = two_player_session();
    let events = Arc::clone(session.events());
    session.subscribe(Arc::new(FnListener(move |event: &Event| {
        if let EventKind::Move(mv) = &event.kind {
            if mv.pebble_killed() {
                events.mark_dead();
            }
        }
    })));

    assert!(session.submit_move(Move::between(0, 0, 2, 2)));
    assert!(session.is_dead());
    assert!(!session.submit_move(Move::between(2, 2, 1, 1)));
}

#[test]
fn test_stop_game_detaches_timer() {
    let scheduler = Arc::new(ManualScheduler::new());
    let mut session = GameSession::new("stop", Board::new(2, 2), RelocateRules, scheduler.clone());
    session
        .wire_players(vec![Player::new(0, "Ann", 1), Player::new(1, "Bob", 1)])
        .unwrap();
    session.attach_timer(1, 5).unwrap();
    session.start_timer().unwrap();

    session.stop_game();
    assert!(session.is_dead());
    assert!(session.timer().is_none());
    assert_eq!(session.timer_remaining(0), None);

    scheduler.advance(10);
    assert_eq!(scheduler.pending(), 0);
}

#[test]
fn test_deliver_move_checks_turn_credit() {
    let (mut session, _log) = two_player_session();
    assert!(session.player(0).unwrap().is_turn());
    assert!(!session.player(1).unwrap().is_turn());

    assert_eq!(
        session.deliver_move(1, Move::between(2, 2, 2, 1)),
        Err(SessionError::InvalidTurn { player: 1 })
    );
    assert_eq!(
        session.deliver_move(7, Move::between(2, 2, 2, 1)),
        Err(SessionError::UnknownPlayer(7))
    );

    // A rejected move keeps the credit.
    assert_eq!(session.deliver_move(0, Move::between(1, 1, 2, 1)), Ok(false));
    assert!(session.player(0).unwrap().is_turn());

    assert_eq!(session.deliver_move(0, Move::between(0, 0, 0, 1)), Ok(true));
    assert!(!session.player(0).unwrap().is_turn());
    assert!(session.player(1).unwrap().is_turn());
    assert_eq!(session.deliver_move(1, Move::between(2, 2, 2, 1)), Ok(true));
}

#[test]
fn test_wire_players_validates_roster() {
    let mut session = GameSession::new(
        "wire",
        Board::new(2, 2),
        RelocateRules,
        Arc::new(ManualScheduler::new()),
    );
    assert_eq!(session.wire_players(vec![]), Err(SessionError::EmptyRoster));
    assert_eq!(session.current_player_id(), None);

    let wired = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&wired);
    session.subscribe(Arc::new(FnListener(move |event: &Event| {
        if event.kind == EventKind::PlayerWire {
            *counter.lock().unwrap() += 1;
        }
    })));
    session.wire_players(vec![Player::new(0, "Solo", 1)]).unwrap();
    assert_eq!(*wired.lock().unwrap(), 1);
    assert_eq!(session.current_player_id(), Some(0));
}

#[test]
fn test_custom_rules_closure() {
    // Only horizontal moves are legal.
    let rules = FnRules(|board: &mut Board, mv: &Move| {
        mv.src.row == mv.dst.row && board.relocate(mv.src, mv.dst).is_ok()
    });
    let scheduler = Arc::new(ManualScheduler::new());
    let mut session = GameSession::new("fn", Board::new(2, 3), rules, scheduler);
    session.wire_players(vec![Player::new(0, "Ann", 1)]).unwrap();
    session.place_piece(PieceId::new(0, 0), Loc::new(0, 0)).unwrap();

    assert!(!session.submit_move(Move::between(0, 0, 1, 0)));
    assert!(session.submit_move(Move::between(0, 0, 0, 2)));
    assert_eq!(session.board().find(PieceId::new(0, 0)), Some(Loc::new(0, 2)));
}

#[test]
fn test_publish_other_reaches_handlers() {
    let (session, log) = two_player_session();
    let event = session.publish_other(7, serde_json::json!({ "note": "promotion" }));
    assert_eq!(event.tag().to_string(), "Other");
    let events = log.lock().unwrap();
    match &events[0].kind {
        EventKind::Other(custom) => {
            assert_eq!(custom.code, 7);
            assert_eq!(custom.payload["note"], "promotion");
        }
        other => panic!("expected custom event, got {:?}", other),
    }
}

#[test]
fn test_piece_status_is_mutable() {
    let (mut session, _log) = two_player_session();
    session.piece_mut(PieceId::new(0, 0)).unwrap().set_status(3);
    assert_eq!(session.piece_at(0, 0).unwrap().status(), 3);
    assert_eq!(session.piece(PieceId::new(1, 0)).unwrap().status(), 0);
    assert!(session.piece(PieceId::new(1, 9)).is_none());
}

#[test]
fn test_king_step_rules_from_geometry() {
    use strictly_board::geometry::{are_adjacent, is_corner_cell};

    let rules = FnRules(|board: &mut Board, mv: &Move| {
        are_adjacent(mv.src, mv.dst)
            && board.holder_at(mv.dst).is_none()
            && board.relocate(mv.src, mv.dst).is_ok()
    });
    let scheduler = Arc::new(ManualScheduler::new());
    let mut session = GameSession::new("king", Board::new(3, 3), rules, scheduler);
    session.wire_players(vec![Player::new(0, "Ann", 1)]).unwrap();
    session.place_piece(PieceId::new(0, 0), Loc::new(0, 0)).unwrap();

    assert!(!session.submit_move(Move::between(0, 0, 2, 2)));
    assert!(session.submit_move(Move::between(0, 0, 1, 1)));
    assert!(session.submit_move(Move::between(1, 1, 2, 2)));
    let at = session.board().find(PieceId::new(0, 0)).unwrap();
    assert!(is_corner_cell(at, 3, 3));
}

/// Relocates like [`RelocateRules`]; a move whose source equals its
/// destination drops Bob's first piece back onto that cell.
struct DropRules {
    wiped_out: Arc<Mutex<Vec<PlayerId>>>,
}

impl Rules for DropRules {
    fn handle(&mut self, board: &mut Board, mv: &Move) -> bool {
        if mv.src != mv.dst {
            return RelocateRules.handle(board, mv);
        }
        match board.cell_at_mut(mv.dst) {
            Some(cell) if cell.is_empty() => {
                cell.set_holder(Some(PieceId::new(1, 0)));
                true
            }
            _ => false,
        }
    }

    fn on_player_lost_all_pieces(&mut self, loser: PlayerId) {
        self.wiped_out.lock().unwrap().push(loser);
    }
}

#[test]
fn test_recaptured_piece_counted_once() {
    let wiped_out = Arc::new(Mutex::new(Vec::new()));
    let mut session = GameSession::new(
        "drop",
        Board::new(1, 4),
        DropRules {
            wiped_out: Arc::clone(&wiped_out),
        },
        Arc::new(ManualScheduler::new()),
    );
    session
        .wire_players(vec![Player::new(0, "Ann", 1), Player::new(1, "Bob", 2)])
        .unwrap();
    session.place_piece(PieceId::new(0, 0), Loc::new(0, 0)).unwrap();
    session.place_piece(PieceId::new(1, 0), Loc::new(0, 1)).unwrap();
    session.place_piece(PieceId::new(1, 1), Loc::new(0, 3)).unwrap();

    assert!(session.submit_move(Move::between(0, 0, 0, 1)));
    assert_eq!(session.stats(1).unwrap().live_pieces(), 1);

    // Bob drops the captured piece back in.
    assert!(session.submit_move(Move::between(0, 2, 0, 2)));
    assert_eq!(session.stats(1).unwrap().live_pieces(), 2);
    assert!(session.stats(1).unwrap().killed_pieces().is_empty());

    assert!(session.submit_move(Move::between(0, 1, 0, 2)));
    let stats = session.stats(1).unwrap();
    assert_eq!(stats.live_pieces(), 1);
    assert_eq!(stats.killed_pieces(), &[PieceId::new(1, 0)]);
    assert_eq!(session.history()[2].captured, Some(PieceId::new(1, 0)));
    assert_eq!(session.board().find(PieceId::new(1, 1)), Some(Loc::new(0, 3)));
    assert!(wiped_out.lock().unwrap().is_empty());
}
