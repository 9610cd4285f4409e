//! Command-line interface for strictly_board.

use clap::{Parser, Subcommand};
use strictly_board::{Loc, Move};

/// Strictly Board - turn-based board session engine
#[derive(Parser, Debug)]
#[command(name = "strictly_board")]
#[command(about = "Turn-based board game session engine", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play a scripted session and print the board after every move
    Play {
        /// Path to a session config file (TOML). Defaults apply when omitted.
        #[arg(short, long)]
        config: Option<std::path::PathBuf>,

        /// Moves as `row,col:row,col`, played in turn order
        #[arg(short = 'm', long = "move", value_parser = parse_move)]
        moves: Vec<Move>,
    },

    /// Run per-player countdown clocks in real time
    Clock {
        /// Number of players
        #[arg(short, long, default_value = "2")]
        players: usize,

        /// Seconds on each player's clock
        #[arg(short, long, default_value = "5")]
        seconds: u32,

        /// Milliseconds per clock unit
        #[arg(long, default_value = "1000")]
        tick_ms: u64,
    },
}

/// Parses `row,col:row,col` into a move.
pub fn parse_move(raw: &str) -> Result<Move, String> {
    let (src, dst) = raw
        .split_once(':')
        .ok_or_else(|| format!("Expected `row,col:row,col`, got `{}`", raw))?;
    Ok(Move::new(parse_loc(src)?, parse_loc(dst)?))
}

fn parse_loc(raw: &str) -> Result<Loc, String> {
    let (row, col) = raw
        .split_once(',')
        .ok_or_else(|| format!("Expected `row,col`, got `{}`", raw))?;
    let row = row
        .trim()
        .parse()
        .map_err(|e| format!("Bad row `{}`: {}", row, e))?;
    let col = col
        .trim()
        .parse()
        .map_err(|e| format!("Bad column `{}`: {}", col, e))?;
    Ok(Loc::new(row, col))
}
