use super::snapshot::SessionSnapshot;
use super::state::Outcome;
use crate::difficulty::{DifficultyLevel, HumanResult};

/// Events broadcast from the session to all subscribers.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The board position changed (a move was applied or a game started).
    PositionChanged(SessionSnapshot),
    /// The game ended; `level` is the difficulty for the next game.
    GameOver {
        outcome: Outcome,
        result: HumanResult,
        level: DifficultyLevel,
        estimated_rating: u32,
    },
    /// The session cannot continue this game; the host should offer a new one.
    Fatal(String),
}
