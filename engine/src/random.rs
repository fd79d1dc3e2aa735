//! Uniform random opponent with an injected RNG.

use crate::{EngineError, SearchEngine};
use async_trait::async_trait;
use chess_common::convert_cozy_castling_to_uci;
use cozy_chess::{Board, Move, Piece};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Picks uniformly among the legal moves. Strength is accepted and ignored.
pub struct RandomMover<R> {
    rng: R,
}

impl RandomMover<StdRng> {
    /// Deterministic mover: the same seed replays the same game.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }
}

impl<R: Rng + Send + 'static> RandomMover<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }
}

#[async_trait]
impl<R: Rng + Send + 'static> SearchEngine for RandomMover<R> {
    async fn set_strength(&mut self, _level: u8) -> Result<(), EngineError> {
        Ok(())
    }

    async fn request_move(&mut self, fen: &str, _strength: u8) -> Result<Move, EngineError> {
        let board: Board = fen
            .parse()
            .map_err(|_| EngineError::InvalidPosition(fen.to_string()))?;

        let mut moves = Vec::new();
        board.generate_moves(|mvs| {
            moves.extend(mvs);
            false
        });
        if moves.is_empty() {
            return Err(EngineError::NoLegalMoves);
        }

        let mv = moves[self.rng.random_range(0..moves.len())];
        let is_castle = board.piece_on(mv.from) == Some(Piece::King)
            && board.color_on(mv.to) == Some(board.side_to_move());
        Ok(convert_cozy_castling_to_uci(mv, is_castle))
    }
}
