use chess::{GameStatus, PlayerSide};
use serde::Serialize;

use super::state::PendingInteraction;
use crate::difficulty::DifficultyLevel;

/// Serializable view of a session at one instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub fen: String,
    pub side_to_move: PlayerSide,
    pub human_side: PlayerSide,
    pub state: &'static str,
    pub pending: PendingInteraction,
    pub status: GameStatus,
    pub level: DifficultyLevel,
    pub estimated_rating: u32,
}
