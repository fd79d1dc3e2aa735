//! Classifies raw board-surface events into game intents.

use cozy_chess::Square;
use std::time::{Duration, Instant};

/// A pointer press this long after the last board action is a background click.
pub const QUIESCENCE_WINDOW: Duration = Duration::from_millis(50);

/// Raw events as reported by the board surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawInput {
    /// A piece was picked up or clicked.
    MoveInputStarted { square: Square, at: Instant },
    /// The pointer is dragging over a square.
    MovingOverSquare { square: Square, at: Instant },
    /// The piece was dropped (or the second click landed) on `to`.
    ValidateMoveInput { from: Square, to: Square, at: Instant },
    /// The board dropped an in-progress gesture.
    MoveInputCanceled { at: Instant },
    /// A pointer press anywhere on the page.
    PointerDown { at: Instant },
}

/// Why an event was classified as noise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoiseKind {
    Hover,
    /// Press belonging to a gesture the board is already reporting.
    InGesture,
    /// Press on the background, well after any board action.
    Background,
}

/// Semantic intent handed to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    SelectionStarted(Square),
    MoveAttempted { from: Square, to: Square },
    Cancelled,
    Noise(NoiseKind),
}

/// Tracks the time of the last board action; nothing else.
#[derive(Debug, Clone, Default)]
pub struct InputGate {
    last_board_action: Option<Instant>,
}

impl InputGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn classify(&mut self, raw: RawInput) -> Intent {
        match raw {
            RawInput::MoveInputStarted { square, at } => {
                self.last_board_action = Some(at);
                Intent::SelectionStarted(square)
            }
            RawInput::ValidateMoveInput { from, to, at } => {
                self.last_board_action = Some(at);
                Intent::MoveAttempted { from, to }
            }
            RawInput::MoveInputCanceled { .. } => Intent::Cancelled,
            RawInput::MovingOverSquare { .. } => Intent::Noise(NoiseKind::Hover),
            RawInput::PointerDown { at } => {
                let recent = self
                    .last_board_action
                    .is_some_and(|last| at.saturating_duration_since(last) <= QUIESCENCE_WINDOW);
                if recent {
                    Intent::Noise(NoiseKind::InGesture)
                } else {
                    Intent::Noise(NoiseKind::Background)
                }
            }
        }
    }

    pub fn last_board_action(&self) -> Option<Instant> {
        self.last_board_action
    }
}
