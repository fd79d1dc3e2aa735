use chess::{DrawReason, GameStatus, PlayerSide};
use cozy_chess::Square;
use serde::{Deserialize, Serialize};

/// How a game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Checkmate { winner: PlayerSide },
    Draw(DrawReason),
}

impl Outcome {
    /// `None` while the game is still running.
    pub fn from_status(status: GameStatus) -> Option<Self> {
        match status {
            GameStatus::InProgress => None,
            GameStatus::Checkmate { winner } => Some(Self::Checkmate { winner }),
            GameStatus::Draw(reason) => Some(Self::Draw(reason)),
        }
    }
}

impl From<Outcome> for GameStatus {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Checkmate { winner } => GameStatus::Checkmate { winner },
            Outcome::Draw(reason) => GameStatus::Draw(reason),
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        GameStatus::from(*self).fmt(f)
    }
}

/// Where the controller is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    /// Human to move, board input enabled.
    Idle,
    /// Waiting on the promotion prompt for the pawn move `from` -> `to`.
    AwaitingPromotion { from: Square, to: Square },
    /// Opponent's move requested and not yet returned.
    AwaitingEngine,
    Terminal(Outcome),
}

/// Which external answer, if any, the session is suspended on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PendingInteraction {
    None,
    AwaitingEngineReply,
    AwaitingPromotionChoice,
}

impl FlowState {
    pub fn pending(&self) -> PendingInteraction {
        match self {
            Self::AwaitingEngine => PendingInteraction::AwaitingEngineReply,
            Self::AwaitingPromotion { .. } => PendingInteraction::AwaitingPromotionChoice,
            Self::Idle | Self::Terminal(_) => PendingInteraction::None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AwaitingPromotion { .. } => "awaiting_promotion",
            Self::AwaitingEngine => "awaiting_engine",
            Self::Terminal(_) => "terminal",
        }
    }
}
