use chess_common::{convert_cozy_castling_to_uci, convert_uci_castling_to_cozy, format_square};
use cozy_chess::{Board, Color, Move, Piece, Square};
use std::collections::HashMap;

use crate::rules::RulesEngine;
use crate::types::{DrawReason, GameStatus, PlayerSide, Position};

/// Main game state wrapper around cozy-chess Board
#[derive(Debug, Clone)]
pub struct Game {
    position: Board,
    history: Vec<HistoryEntry>,
    /// Occurrence count per position hash, for threefold repetition.
    repetitions: HashMap<u64, u8>,
    start_position: StartPosition,
}

/// Record of one played move.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    /// The move in UCI notation (castling as a two-square king move).
    pub mv: Move,
    pub piece: Piece,
    pub piece_color: Color,
    pub captured: Option<Piece>,
    pub san: String,
    /// FEN after this move
    pub fen: String,
}

/// Starting position of the game
#[derive(Debug, Clone)]
pub enum StartPosition {
    Standard,
    Fen(String),
}

impl Game {
    /// Create a new game from the standard starting position
    pub fn new() -> Self {
        Self::from_board(Board::default(), StartPosition::Standard)
    }

    /// Create a game from a FEN string
    pub fn from_fen(fen: &str) -> Result<Self, GameError> {
        let position = crate::fen::parse_fen(fen)?;
        Ok(Self::from_board(position, StartPosition::Fen(fen.to_string())))
    }

    fn from_board(position: Board, start_position: StartPosition) -> Self {
        let mut repetitions = HashMap::new();
        repetitions.insert(position.hash(), 1);
        Self {
            position,
            history: Vec::new(),
            repetitions,
            start_position,
        }
    }

    /// Get the current board position
    pub fn board(&self) -> &Board {
        &self.position
    }

    /// Get the move history
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Make a move on the board. Accepts UCI castling notation.
    pub fn make_move(&mut self, mv: Move) -> Result<HistoryEntry, GameError> {
        if self.status().is_over() {
            return Err(GameError::IllegalMove);
        }

        let legal = self.cozy_moves();
        let cozy_mv = convert_uci_castling_to_cozy(mv, &legal);

        if !legal.contains(&cozy_mv) {
            let promotes_here = legal
                .iter()
                .any(|m| m.from == mv.from && m.to == mv.to && m.promotion.is_some());
            if mv.promotion.is_none() && promotes_here {
                return Err(GameError::AmbiguousPromotion);
            }
            return Err(GameError::IllegalMove);
        }

        let piece = self
            .position
            .piece_on(cozy_mv.from)
            .ok_or(GameError::IllegalMove)?;
        let piece_color = self.position.side_to_move();
        let is_castle = self.is_castle(cozy_mv);
        let captured = if is_castle {
            None
        } else {
            self.position.piece_on(cozy_mv.to)
        };

        let uci_mv = convert_cozy_castling_to_uci(cozy_mv, is_castle);
        let san = generate_san(piece, uci_mv, captured.is_some(), is_castle);

        self.position
            .try_play(cozy_mv)
            .map_err(|_| GameError::IllegalMove)?;
        *self.repetitions.entry(self.position.hash()).or_insert(0) += 1;

        let entry = HistoryEntry {
            mv: uci_mv,
            piece,
            piece_color,
            captured,
            san,
            fen: self.to_fen(),
        };
        self.history.push(entry.clone());

        Ok(entry)
    }

    /// Legal moves in cozy-chess notation (castling as king-takes-rook).
    fn cozy_moves(&self) -> Vec<Move> {
        let mut moves = Vec::new();
        self.position.generate_moves(|mvs| {
            moves.extend(mvs);
            false
        });
        moves
    }

    fn is_castle(&self, mv: Move) -> bool {
        self.position.piece_on(mv.from) == Some(Piece::King)
            && self.position.color_on(mv.to) == Some(self.position.side_to_move())
    }

    /// Get the side to move
    pub fn side_to_move(&self) -> Color {
        self.position.side_to_move()
    }

    /// Export position to FEN string
    pub fn to_fen(&self) -> String {
        crate::fen::format_fen(&self.position)
    }

    fn repetition_count(&self) -> u8 {
        self.repetitions
            .get(&self.position.hash())
            .copied()
            .unwrap_or(0)
    }
}

impl RulesEngine for Game {
    fn legal_moves(&self, from: Option<Square>) -> Vec<Move> {
        if self.status().is_over() {
            return Vec::new();
        }
        self.cozy_moves()
            .into_iter()
            .filter(|mv| from.is_none_or(|sq| mv.from == sq))
            .map(|mv| convert_cozy_castling_to_uci(mv, self.is_castle(mv)))
            .collect()
    }

    fn apply(&mut self, mv: Move) -> Result<Position, GameError> {
        self.make_move(mv)?;
        Ok(Position::from_board(&self.position))
    }

    fn status(&self) -> GameStatus {
        let board = &self.position;
        let has_moves = board.generate_moves(|_| true);
        if !has_moves {
            return if board.checkers().is_empty() {
                GameStatus::Draw(DrawReason::Stalemate)
            } else {
                GameStatus::Checkmate {
                    winner: PlayerSide::from(!board.side_to_move()),
                }
            };
        }
        if board.halfmove_clock() >= 100 {
            return GameStatus::Draw(DrawReason::FiftyMoveRule);
        }
        if self.repetition_count() >= 3 {
            return GameStatus::Draw(DrawReason::ThreefoldRepetition);
        }
        if insufficient_material(board) {
            return GameStatus::Draw(DrawReason::InsufficientMaterial);
        }
        GameStatus::InProgress
    }

    fn turn(&self) -> PlayerSide {
        PlayerSide::from(self.position.side_to_move())
    }

    fn position(&self) -> Position {
        Position::from_board(&self.position)
    }

    fn reset(&mut self) {
        let start = match &self.start_position {
            StartPosition::Standard => Some(Board::default()),
            StartPosition::Fen(fen) => crate::fen::parse_fen(fen).ok(),
        };
        // A stored FEN was validated on construction, so the fallback is unreachable in practice.
        let board = start.unwrap_or_default();
        *self = Self::from_board(board, self.start_position.clone());
    }
}

/// Neither side can possibly deliver mate: bare kings, a single minor piece,
/// or only bishops that all stand on one square colour.
fn insufficient_material(board: &Board) -> bool {
    let heavy = board.pieces(Piece::Pawn) | board.pieces(Piece::Rook) | board.pieces(Piece::Queen);
    if !heavy.is_empty() {
        return false;
    }

    let knights = board.pieces(Piece::Knight);
    let bishops = board.pieces(Piece::Bishop);
    if knights.len() + bishops.len() <= 1 {
        return true;
    }
    if !knights.is_empty() {
        return false;
    }

    let mut shades = bishops
        .into_iter()
        .map(|sq| (sq.file() as u8 + sq.rank() as u8) % 2);
    match shades.next() {
        Some(first) => shades.all(|shade| shade == first),
        None => true,
    }
}

/// Generate simplified SAN notation for a move (no check or disambiguation suffixes)
fn generate_san(piece: Piece, mv: Move, is_capture: bool, is_castle: bool) -> String {
    if is_castle {
        return if (mv.to.file() as u8) > (mv.from.file() as u8) {
            "O-O".to_string()
        } else {
            "O-O-O".to_string()
        };
    }

    let mut san = String::new();
    match piece {
        Piece::Pawn => {
            if is_capture {
                san.push(chess_common::format_file(mv.from.file()));
            }
        }
        other => san.push(chess_common::format_piece_upper(other)),
    }
    if is_capture {
        san.push('x');
    }
    san.push_str(&format_square(mv.to));
    if let Some(promo) = mv.promotion {
        san.push('=');
        san.push(chess_common::format_piece_upper(promo));
    }
    san
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("Illegal move")]
    IllegalMove,
    #[error("Promotion piece required")]
    AmbiguousPromotion,
    #[error("FEN parse error: {0}")]
    FenError(#[from] crate::fen::FenError),
}
