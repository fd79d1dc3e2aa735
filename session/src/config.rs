//! Runtime configuration for a chessflow session.
//!
//! Every value has a compile-time default and can be overridden through a
//! dedicated environment variable. Command-line flags on the binary take
//! precedence over both.

use chess::PlayerSide;
use std::path::PathBuf;

use crate::difficulty::DifficultyLevel;

/// Difficulty level of the first game.
const DEFAULT_START_LEVEL: u8 = 10;

/// Side the human plays.
const DEFAULT_HUMAN_SIDE: PlayerSide = PlayerSide::White;

/// Directory for the rolling log files.
const DEFAULT_LOG_DIR: &str = "logs";

/// Get the starting difficulty level.
///
/// Priority:
/// 1. `CHESSFLOW_START_LEVEL` env variable if set (clamped into 1..=20, falls
///    back to the default if it is not a number)
/// 2. `10` as fallback
pub fn get_start_level() -> DifficultyLevel {
    parse_start_level(std::env::var("CHESSFLOW_START_LEVEL").ok().as_deref())
}

/// Get the side the human plays.
///
/// Priority:
/// 1. `CHESSFLOW_HUMAN_SIDE` env variable if set to `white` or `black`
/// 2. White as fallback
pub fn get_human_side() -> PlayerSide {
    parse_human_side(std::env::var("CHESSFLOW_HUMAN_SIDE").ok().as_deref())
}

/// Get the log directory.
///
/// Priority:
/// 1. `CHESSFLOW_LOG_DIR` env variable if set
/// 2. `logs` as fallback
pub fn get_log_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("CHESSFLOW_LOG_DIR") {
        return PathBuf::from(dir);
    }

    PathBuf::from(DEFAULT_LOG_DIR)
}

/// Explicit Stockfish binary, if configured through `CHESSFLOW_STOCKFISH_PATH`.
/// Without it the engine crate searches the usual install locations.
pub fn get_stockfish_path() -> Option<PathBuf> {
    std::env::var("CHESSFLOW_STOCKFISH_PATH").ok().map(PathBuf::from)
}

fn parse_start_level(raw: Option<&str>) -> DifficultyLevel {
    raw.and_then(|s| s.trim().parse::<u8>().ok())
        .map(DifficultyLevel::new)
        .unwrap_or(DifficultyLevel::new(DEFAULT_START_LEVEL))
}

fn parse_human_side(raw: Option<&str>) -> PlayerSide {
    raw.and_then(|s| s.trim().parse().ok())
        .unwrap_or(DEFAULT_HUMAN_SIDE)
}

/// What a session needs to know before its first game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub human_side: PlayerSide,
    pub start_level: DifficultyLevel,
}

impl SessionConfig {
    pub fn from_env() -> Self {
        Self {
            human_side: get_human_side(),
            start_level: get_start_level(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            human_side: DEFAULT_HUMAN_SIDE,
            start_level: DifficultyLevel::new(DEFAULT_START_LEVEL),
        }
    }
}
