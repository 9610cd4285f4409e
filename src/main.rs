//! Strictly Board - demo CLI
//!
//! Drives a board session from the command line: a scripted game on a
//! manual clock, or real-time countdown clocks on tokio.

#![warn(missing_docs)]

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use strictly_board::{
    Board, BoardEventHandler, Event, EventKind, FnListener, GameSession, ManualScheduler, Move,
    MoveEvent, PieceId, Player, PlayerId, RelocateRules, SessionConfig, TokioScheduler, format_hms,
};
use tracing::{debug, info, instrument, warn};
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

    match cli.command {
        Command::Play { config, moves } => run_play(config, moves),
        Command::Clock {
            players,
            seconds,
            tick_ms,
        } => run_clock(players, seconds, tick_ms).await,
    }
}

/// Logs the events of a scripted game.
struct MoveLogger;

impl BoardEventHandler for MoveLogger {
    fn on_move(&self, event: &Event, mv: &MoveEvent) {
        info!(
            event_id = event.id,
            from = %mv.src,
            to = %mv.dst,
            captured = mv.pebble_killed(),
            "Move"
        );
    }

    fn on_finish(&self, _event: &Event, winner: PlayerId) {
        info!(winner, "Game finished");
    }

    fn on_elimination(&self, _event: &Event, player: PlayerId) {
        warn!(player, "Player ran out of time");
    }
}

/// Play a scripted session
#[instrument(skip(moves), fields(moves = moves.len()))]
fn run_play(config: Option<PathBuf>, moves: Vec<Move>) -> Result<()> {
    let config = match config {
        Some(path) => SessionConfig::from_file(path)?,
        None => SessionConfig::default(),
    };

    let scheduler = Arc::new(ManualScheduler::new());
    let mut session = GameSession::from_config("demo", &config, RelocateRules, scheduler.clone())?;
    session.subscribe_handler(MoveLogger);
    lay_out_pieces(&mut session)?;
    if session.timer().is_some() {
        session.start_timer()?;
    }
    println!("{}\n", session.board().display());

    let moves = if moves.is_empty() {
        info!("No moves given, playing the built-in script");
        demo_script()
    } else {
        moves
    };

    for requested in moves {
        if session.is_dead() {
            info!("Session finished, remaining moves skipped");
            break;
        }
        let player = session
            .current_player_id()
            .context("Session has no roster")?;
        let mv = Move::on_board(session.board(), requested.src, requested.dst);
        if !session.deliver_move(player, mv)? {
            warn!(player, %mv, "Move rejected");
            continue;
        }
        if let Some(timer) = session.timer() {
            scheduler.advance(u64::from(timer.frequency()));
        }
        println!("{}\n", session.board().display());
    }

    for player in session.players() {
        let id = *player.id();
        let stats = session.stats(id).context("Missing player stats")?;
        let clock = session
            .timer_remaining(id)
            .map(format_hms)
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{}: {} live, {} lost, clock {}",
            player.name(),
            stats.live_pieces(),
            stats.killed_pieces().len(),
            clock
        );
    }
    println!("{} moves played", session.move_count());
    Ok(())
}

/// Places every player's pieces row by row, player after player.
fn lay_out_pieces(session: &mut GameSession<RelocateRules>) -> Result<()> {
    let pieces: Vec<PieceId> = session
        .players()
        .iter()
        .flat_map(|player| player.pieces().iter().map(|piece| piece.id()))
        .collect();
    for (offset, piece) in pieces.into_iter().enumerate() {
        let loc = session
            .board()
            .loc_of(offset)
            .context("Board too small for the configured pieces")?;
        session.place_piece(piece, loc)?;
    }
    debug!("Pieces laid out");
    Ok(())
}

fn demo_script() -> Vec<Move> {
    vec![
        Move::between(0, 0, 1, 0),
        Move::between(0, 1, 1, 1),
        Move::between(1, 0, 1, 1),
    ]
}

/// Run real-time countdown clocks
#[instrument]
async fn run_clock(players: usize, seconds: u32, tick_ms: u64) -> Result<()> {
    let scheduler = Arc::new(TokioScheduler::current(Duration::from_millis(tick_ms))?);
    let mut session = GameSession::new(
        "clock",
        Board::new(1, players.max(1)),
        RelocateRules,
        scheduler,
    );
    session.wire_players(
        (0..players)
            .map(|id| Player::new(id, format!("Player {}", id + 1), 0))
            .collect(),
    )?;
    session.attach_timer(1, seconds)?;

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    session.subscribe(Arc::new(FnListener(move |event: &Event| {
        let _ = tx.send(event.clone());
    })));
    session.start_timer()?;
    info!(players, seconds, "Clocks running");

    while let Some(event) = rx.recv().await {
        match event.kind {
            EventKind::TimerTick(tick) => {
                info!(player = tick.player, remaining = %format_hms(tick.new_value), "Tick");
            }
            EventKind::Elimination { player, .. } => {
                info!(player, "Time is up");
                let next = player + 1;
                if next < players {
                    session.timer().context("Timer detached")?.switch_to(next)?;
                } else {
                    session.stop_game();
                    break;
                }
            }
            _ => {}
        }
    }
    info!("All clocks expired");
    Ok(())
}
