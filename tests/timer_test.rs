//! Tests for per-player countdown clocks.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use strictly_board::{
    Board, Event, EventDispatcher, EventKind, FnListener, GameSession, Loc, ManualScheduler, Move,
    PieceId, Player, RelocateRules, TimerPhase, TimerTick, TokioScheduler, TurnTimer,
};

struct Fixture {
    timer: TurnTimer,
    scheduler: Arc<ManualScheduler>,
    log: Arc<Mutex<Vec<EventKind>>>,
}

fn fixture(players: usize, frequency: u32, time: u32) -> Fixture {
    let scheduler = Arc::new(ManualScheduler::new());
    let events = Arc::new(EventDispatcher::new("timer-test".to_string()));
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    events.subscribe(Arc::new(FnListener(move |event: &Event| {
        sink.lock().unwrap().push(event.kind.clone());
    })));
    let timer = TurnTimer::new(players, frequency, scheduler.clone(), events);
    timer.reset_all(time);
    Fixture {
        timer,
        scheduler,
        log,
    }
}

#[test]
fn test_single_tick_eliminates() {
    let f = fixture(1, 1, 1);
    f.timer.start(0).unwrap();
    assert_eq!(f.scheduler.advance(1), 1);

    let log = f.log.lock().unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(
        log[0],
        EventKind::TimerTick(TimerTick {
            player: 0,
            new_value: 0,
            generation: 1,
        })
    );
    assert_eq!(
        log[1],
        EventKind::Elimination {
            player: 0,
            generation: 1,
        }
    );
    assert_eq!(f.timer.player_time(0), Some(0));
    assert_eq!(f.scheduler.pending(), 0);
}

#[test]
fn test_double_switch_invalidates_first_tick() {
    let f = fixture(2, 1, 5);
    f.timer.switch_to(0).unwrap();
    f.timer.switch_to(1).unwrap();
    assert_eq!(f.scheduler.pending(), 2);

    f.scheduler.advance(1);
    assert_eq!(f.timer.player_time(0), Some(5));
    assert_eq!(f.timer.player_time(1), Some(4));

    let log = f.log.lock().unwrap();
    assert_eq!(log.len(), 1);
    assert!(matches!(log[0], EventKind::TimerTick(TimerTick { player: 1, .. })));
}

#[test]
fn test_pause_after_switch_drops_tick() {
    let f = fixture(2, 1, 5);
    f.timer.start(0).unwrap();
    f.timer.switch_to(1).unwrap();
    f.timer.pause();
    assert_eq!(f.timer.phase(), TimerPhase::Paused(1));

    f.scheduler.advance(3);
    assert_eq!(f.timer.player_time(0), Some(5));
    assert_eq!(f.timer.player_time(1), Some(5));
    assert!(f.log.lock().unwrap().is_empty());
    assert_eq!(f.scheduler.pending(), 0);
}

#[test]
fn test_restart_resumes_countdown() {
    let f = fixture(1, 2, 10);
    f.timer.start(0).unwrap();
    f.scheduler.advance(2);
    assert_eq!(f.timer.player_time(0), Some(9));

    f.timer.pause();
    f.scheduler.advance(6);
    assert_eq!(f.timer.player_time(0), Some(9));

    f.timer.restart().unwrap();
    f.scheduler.advance(4);
    assert_eq!(f.timer.player_time(0), Some(7));
}

#[test]
fn test_ticks_follow_frequency() {
    let f = fixture(1, 3, 10);
    f.timer.start(0).unwrap();
    f.scheduler.advance(2);
    assert_eq!(f.timer.player_time(0), Some(10));
    f.scheduler.advance(1);
    assert_eq!(f.timer.player_time(0), Some(9));
    f.scheduler.advance(9);
    assert_eq!(f.timer.player_time(0), Some(6));
}

#[test]
fn test_session_moves_hand_clock_over() {
    let scheduler = Arc::new(ManualScheduler::new());
    let mut session = GameSession::new("clock", Board::new(2, 2), RelocateRules, scheduler.clone());
    session
        .wire_players(vec![Player::new(0, "Ann", 1), Player::new(1, "Bob", 1)])
        .unwrap();
    session.place_piece(PieceId::new(0, 0), Loc::new(0, 0)).unwrap();
    session.attach_timer(1, 10).unwrap();
    session.start_timer().unwrap();

    scheduler.advance(2);
    assert_eq!(session.timer_remaining(0), Some(8));

    assert!(session.submit_move(Move::between(0, 0, 1, 1)));
    assert_eq!(session.timer().unwrap().current_player_id(), Some(1));

    scheduler.advance(3);
    assert_eq!(session.timer_remaining(0), Some(8));
    assert_eq!(session.timer_remaining(1), Some(7));
}

#[test]
fn test_finished_session_freezes_clock() {
    let scheduler = Arc::new(ManualScheduler::new());
    let mut session =
        GameSession::new("frozen", Board::new(1, 1), RelocateRules, scheduler.clone());
    session.wire_players(vec![Player::new(0, "Ann", 0)]).unwrap();
    session.attach_timer(1, 10).unwrap();
    session.start_timer().unwrap();
    scheduler.advance(1);

    session.accept_resignation(0);
    scheduler.advance(5);
    assert_eq!(session.timer_remaining(0), Some(9));
}

#[tokio::test]
async fn test_tokio_clock_runs_out() {
    let scheduler = Arc::new(TokioScheduler::current(Duration::from_millis(1)).unwrap());
    let events = Arc::new(EventDispatcher::new("tokio".to_string()));
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    events.subscribe(Arc::new(FnListener(move |event: &Event| {
        let _ = tx.send(event.kind.clone());
    })));

    let timer = TurnTimer::new(1, 1, scheduler, events);
    timer.reset_all(3).start(0).unwrap();

    let mut ticks = Vec::new();
    loop {
        let kind = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        match kind {
            EventKind::TimerTick(tick) => ticks.push(tick.new_value),
            EventKind::Elimination { player, .. } => {
                assert_eq!(player, 0);
                break;
            }
            other => panic!("unexpected event {:?}", other),
        }
    }
    assert_eq!(ticks, vec![2, 1, 0]);
}
