//! Session configuration loaded from TOML.

use crate::error::ConfigError;
use derive_getters::Getters;
use derive_new::new;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, instrument, warn};

/// Shape of a session: board, roster and optional clock.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize, new)]
pub struct SessionConfig {
    /// Board rows.
    #[serde(default = "default_board_height")]
    board_height: usize,

    /// Board columns.
    #[serde(default = "default_board_width")]
    board_width: usize,

    /// Pieces allocated to every player when the roster is wired.
    #[serde(default = "default_pieces_per_player")]
    pieces_per_player: usize,

    /// Player names in turn order.
    #[serde(default = "default_players")]
    players: Vec<String>,

    /// Per-player countdown clock; absent means untimed.
    #[serde(default)]
    timer: Option<TimerConfig>,
}

/// Countdown clock settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Getters, Serialize, Deserialize, new)]
pub struct TimerConfig {
    /// Scheduler units between ticks.
    #[serde(default = "default_frequency")]
    frequency: u32,

    /// Units every player starts with.
    #[serde(default = "default_initial_time")]
    initial_time: u32,

    /// Wall-clock length of one scheduler unit in milliseconds.
    #[serde(default = "default_tick_ms")]
    tick_ms: u64,
}

fn default_board_height() -> usize {
    3
}

fn default_board_width() -> usize {
    3
}

fn default_pieces_per_player() -> usize {
    1
}

fn default_players() -> Vec<String> {
    vec!["White".to_string(), "Black".to_string()]
}

fn default_frequency() -> u32 {
    1
}

fn default_initial_time() -> u32 {
    300
}

fn default_tick_ms() -> u64 {
    1000
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            board_height: default_board_height(),
            board_width: default_board_width(),
            pieces_per_player: default_pieces_per_player(),
            players: default_players(),
            timer: None,
        }
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            frequency: default_frequency(),
            initial_time: default_initial_time(),
            tick_ms: default_tick_ms(),
        }
    }
}

impl SessionConfig {
    /// Loads configuration from a TOML file and validates it.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml(&content)?;
        info!(
            players = config.players.len(),
            height = config.board_height,
            width = config.board_width,
            timed = config.timer.is_some(),
            "Config loaded successfully"
        );
        Ok(config)
    }

    /// Parses configuration from TOML text and validates it.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that a session can be built from this configuration.
    #[instrument(skip(self))]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.players.is_empty() {
            warn!("No players configured");
            return Err(ConfigError::new("At least one player is required"));
        }
        if self.board_height == 0 || self.board_width == 0 {
            return Err(ConfigError::new(format!(
                "Board must have at least one cell, got {}x{}",
                self.board_height, self.board_width
            )));
        }
        let cells = self.board_height.saturating_mul(self.board_width);
        let pieces = self.pieces_per_player.saturating_mul(self.players.len());
        if pieces > cells {
            return Err(ConfigError::new(format!(
                "{} pieces do not fit on {} cells",
                pieces, cells
            )));
        }
        if let Some(timer) = &self.timer {
            if timer.frequency == 0 {
                return Err(ConfigError::new("Timer frequency must be positive"));
            }
            if timer.tick_ms == 0 {
                return Err(ConfigError::new("Timer tick length must be positive"));
            }
        }
        Ok(())
    }
}
