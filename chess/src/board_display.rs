//! Lightweight board representation for rendering from FEN.

use cozy_chess::Square;

use crate::types::{PieceKind, PlayerSide, Position};

/// An 8x8 board for display purposes only.
#[derive(Debug, Clone, Default)]
pub struct DisplayBoard {
    squares: [[Option<(PieceKind, PlayerSide)>; 8]; 8],
}

impl DisplayBoard {
    /// Parse the board placement from a FEN string.
    pub fn from_fen(fen: &str) -> Result<Self, DisplayBoardError> {
        let placement = fen
            .split_whitespace()
            .next()
            .ok_or(DisplayBoardError::InvalidFen)?;

        let mut squares = [[None; 8]; 8];
        let ranks: Vec<&str> = placement.split('/').collect();
        if ranks.len() != 8 {
            return Err(DisplayBoardError::InvalidFen);
        }

        for (rank_idx, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - rank_idx;
            let mut file = 0usize;
            for c in rank_str.chars() {
                if file > 7 {
                    return Err(DisplayBoardError::InvalidFen);
                }
                if let Some(skip) = c.to_digit(10) {
                    file += skip as usize;
                } else {
                    let side = if c.is_uppercase() {
                        PlayerSide::White
                    } else {
                        PlayerSide::Black
                    };
                    let kind = PieceKind::from_char(c).ok_or(DisplayBoardError::InvalidPiece(c))?;
                    squares[rank][file] = Some((kind, side));
                    file += 1;
                }
            }
        }

        Ok(DisplayBoard { squares })
    }

    pub fn from_position(position: &Position) -> Result<Self, DisplayBoardError> {
        Self::from_fen(position.as_fen())
    }

    pub fn piece_at(&self, file: u8, rank: u8) -> Option<(PieceKind, PlayerSide)> {
        if file > 7 || rank > 7 {
            return None;
        }
        self.squares[rank as usize][file as usize]
    }

    /// Render as text, from `perspective`'s side of the table.
    ///
    /// Squares in `marked` that hold no piece are drawn as `*`, occupied
    /// marked squares get brackets.
    pub fn render(&self, perspective: PlayerSide, marked: &[Square]) -> String {
        let ranks: Vec<u8> = match perspective {
            PlayerSide::White => (0..8).rev().collect(),
            PlayerSide::Black => (0..8).collect(),
        };
        let files: Vec<u8> = match perspective {
            PlayerSide::White => (0..8).collect(),
            PlayerSide::Black => (0..8).rev().collect(),
        };

        let mut out = String::new();
        for &rank in &ranks {
            out.push_str(&format!("{} ", rank + 1));
            for &file in &files {
                let is_marked = marked
                    .iter()
                    .any(|sq| sq.file() as u8 == file && sq.rank() as u8 == rank);
                let cell = match (self.piece_at(file, rank), is_marked) {
                    (Some((kind, side)), marked) => {
                        let c = match side {
                            PlayerSide::White => kind.to_char_upper(),
                            PlayerSide::Black => kind.to_char_lower(),
                        };
                        if marked {
                            format!("[{}]", c)
                        } else {
                            format!(" {} ", c)
                        }
                    }
                    (None, true) => " * ".to_string(),
                    (None, false) => " . ".to_string(),
                };
                out.push_str(&cell);
            }
            out.push('\n');
        }
        out.push_str("  ");
        for &file in &files {
            out.push_str(&format!(" {} ", (b'a' + file) as char));
        }
        out.push('\n');
        out
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DisplayBoardError {
    #[error("Invalid FEN string")]
    InvalidFen,
    #[error("Invalid piece character: {0}")]
    InvalidPiece(char),
}
