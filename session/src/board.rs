//! The board-input surface the session drives.

use chess::{PlayerSide, Position};
use cozy_chess::{Move, Square};

/// Rendering and input side of the board, implemented by the host UI.
///
/// Calls are fire-and-forget. The promotion prompt's answer comes back to the
/// session as a [`crate::PromotionChoice`] input.
pub trait Board: Send {
    fn set_position(&mut self, position: &Position, animate: bool);

    /// Accept move input for `side`'s pieces.
    fn enable_input(&mut self, side: PlayerSide);

    fn disable_input(&mut self);

    fn show_legal_move_markers(&mut self, moves: &[Move]);

    fn clear_legal_move_markers(&mut self);

    /// Arrows and other annotations that do not survive a new action.
    fn clear_transient_markers(&mut self);

    fn prompt_promotion(&mut self, square: Square, side: PlayerSide);
}
