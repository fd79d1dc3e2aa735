//! Move-search capability for the game flow controller.
//!
//! [`SearchEngine`] is the provider seam; [`EngineBridge`] owns a provider on
//! a worker task and enforces the one-outstanding-request rule.

pub mod bridge;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod random;
pub mod stockfish;
pub mod uci;

pub use bridge::{EngineBridge, EngineFactory, EngineFuture, EngineReply, Ticket};
pub use random::RandomMover;
pub use stockfish::{StockfishConfig, StockfishEngine};
pub use uci::{UciError, UciMessage};

use async_trait::async_trait;
use cozy_chess::Move;

/// Lowest strength a search request may carry.
pub const MIN_STRENGTH: u8 = 1;
/// Highest strength a search request may carry.
pub const MAX_STRENGTH: u8 = 20;

/// A provider of best moves.
///
/// Moves are returned in UCI notation (castling as a two-square king move).
#[async_trait]
pub trait SearchEngine: Send + 'static {
    /// Change the strength used by subsequent searches.
    async fn set_strength(&mut self, level: u8) -> Result<(), EngineError>;

    /// Search `fen` at `strength` and return the chosen move.
    async fn request_move(&mut self, fen: &str, strength: u8) -> Result<Move, EngineError>;

    /// Release the provider's resources. Called once when its worker stops.
    async fn shutdown(&mut self) {}
}

/// Commands sent to a UCI engine process
#[derive(Debug, Clone)]
pub enum EngineCommand {
    SetPosition { fen: String },
    SetOption { name: String, value: Option<String> },
    Go(GoParams),
    Quit,
}

/// Parameters for the "go" command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoParams {
    pub movetime: Option<u64>, // Move time in milliseconds
    pub depth: Option<u8>,     // Search depth
}

impl GoParams {
    /// Search effort for a strength level: shallow fixed depths at the bottom
    /// of the range, growing time budgets above it.
    pub fn for_strength(strength: u8) -> Self {
        match strength {
            0..=3 => Self {
                depth: Some(4),
                ..Default::default()
            },
            4..=7 => Self {
                depth: Some(8),
                ..Default::default()
            },
            8..=12 => Self {
                movetime: Some(500),
                ..Default::default()
            },
            13..=17 => Self {
                movetime: Some(1000),
                ..Default::default()
            },
            _ => Self {
                movetime: Some(2000),
                ..Default::default()
            },
        }
    }
}

/// Events received from a UCI engine process
#[derive(Debug, Clone)]
pub enum EngineEvent {
    Ready,
    BestMove(Move),
    NoMove,
    Info(EngineInfo),
}

/// Engine analysis information
#[derive(Debug, Clone, Default)]
pub struct EngineInfo {
    pub depth: Option<u8>,
    pub seldepth: Option<u8>,
    pub time_ms: Option<u64>,
    pub nodes: Option<u64>,
    pub score: Option<Score>,
    pub pv: Vec<Move>, // Principal variation
    pub nps: Option<u64>,
}

#[derive(Debug, Clone)]
pub enum Score {
    Centipawns(i32),
    Mate(i8), // Negative for being mated
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    #[error("A search request is already outstanding")]
    Busy,
    #[error("Engine unavailable: {0}")]
    Unavailable(String),
    #[error("No legal moves in position")]
    NoLegalMoves,
    #[error("Invalid position: {0}")]
    InvalidPosition(String),
    #[error("Failed to start engine: {0}")]
    Spawn(String),
    #[error("UCI error: {0}")]
    Uci(String),
}

impl From<UciError> for EngineError {
    fn from(e: UciError) -> Self {
        Self::Uci(e.to_string())
    }
}
