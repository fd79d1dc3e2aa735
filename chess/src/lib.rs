//! Rules adapter for the game flow controller.
//!
//! Wraps cozy-chess behind the [`RulesEngine`] trait and owns the
//! project-level chess vocabulary: [`Position`], [`GameStatus`],
//! [`PlayerSide`] and [`PieceKind`].

pub mod board_display;
pub mod fen;
pub mod game;
pub mod rules;
pub mod types;

pub use board_display::{DisplayBoard, DisplayBoardError};
pub use chess_common::*;
pub use fen::FenError;
pub use game::{Game, GameError, HistoryEntry, StartPosition};
pub use rules::RulesEngine;
pub use types::{DrawReason, GameStatus, PieceKind, PlayerSide, Position};
