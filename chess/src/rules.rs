//! The rules-validation capability consumed by the game flow controller.

use cozy_chess::{Move, Square};

use crate::game::GameError;
use crate::types::{GameStatus, PlayerSide, Position};

/// Move legality, move application and termination detection.
///
/// Moves cross this boundary in UCI notation: castling is the king moving
/// two squares. Implementations must never panic on bad input.
pub trait RulesEngine: Send {
    /// Legal moves, optionally restricted to those starting on `from`.
    /// Empty once the game is over.
    fn legal_moves(&self, from: Option<Square>) -> Vec<Move>;

    /// Play `mv`, returning the new position.
    ///
    /// Fails with [`GameError::IllegalMove`] for illegal input and with
    /// [`GameError::AmbiguousPromotion`] when a pawn reaches the last rank
    /// without a promotion piece. A failed apply leaves the position as it was.
    fn apply(&mut self, mv: Move) -> Result<Position, GameError>;

    fn status(&self) -> GameStatus;

    /// Side to move.
    fn turn(&self) -> PlayerSide;

    fn position(&self) -> Position;

    /// Return to the starting position.
    fn reset(&mut self);
}
