//! Resolution of pawn moves that need a piece choice.

use chess::{PieceKind, RulesEngine};
use cozy_chess::{Move, Square};

/// Answer from the promotion prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromotionChoice {
    Piece(PieceKind),
    Cancelled,
}

/// Stateless: the one outstanding interaction is tracked by the session's
/// `AwaitingPromotion` state.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromotionResolver;

impl PromotionResolver {
    /// True iff some legal move from `from` to `to` carries a promotion piece.
    pub fn needs_resolution<R: RulesEngine + ?Sized>(&self, rules: &R, from: Square, to: Square) -> bool {
        rules
            .legal_moves(Some(from))
            .iter()
            .any(|mv| mv.to == to && mv.promotion.is_some())
    }

    /// The fully determined move for `choice`, or `None` on cancellation or
    /// when the piece is not a legal promotion here. Never applies the move.
    pub fn resolve<R: RulesEngine + ?Sized>(
        &self,
        rules: &R,
        from: Square,
        to: Square,
        choice: PromotionChoice,
    ) -> Option<Move> {
        let PromotionChoice::Piece(kind) = choice else {
            tracing::debug!("Promotion cancelled");
            return None;
        };

        let piece = cozy_chess::Piece::from(kind);
        let resolved = rules
            .legal_moves(Some(from))
            .into_iter()
            .find(|mv| mv.to == to && mv.promotion == Some(piece));
        if resolved.is_none() {
            tracing::warn!(?kind, "Promotion choice does not match a legal move");
        }
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess::{parse_square, Game};

    fn sq(s: &str) -> Square {
        parse_square(s).unwrap()
    }

    fn promo_game() -> Game {
        Game::from_fen("3r4/4P3/8/8/8/8/k7/4K3 w - - 0 1").unwrap()
    }

    #[test]
    fn test_needs_resolution_on_last_rank() {
        let game = promo_game();
        let resolver = PromotionResolver;
        assert!(resolver.needs_resolution(&game, sq("e7"), sq("e8")));
        assert!(resolver.needs_resolution(&game, sq("e7"), sq("d8")));
        assert!(!resolver.needs_resolution(&game, sq("e1"), sq("e2")));
        assert!(!resolver.needs_resolution(&game, sq("e7"), sq("f8")));
    }

    #[test]
    fn test_not_needed_for_ordinary_pawn_push() {
        let game = Game::new();
        assert!(!PromotionResolver.needs_resolution(&game, sq("e2"), sq("e4")));
    }

    #[test]
    fn test_resolve_with_piece() {
        let game = promo_game();
        let mv = PromotionResolver
            .resolve(&game, sq("e7"), sq("d8"), PromotionChoice::Piece(PieceKind::Knight))
            .unwrap();
        assert_eq!(mv.from, sq("e7"));
        assert_eq!(mv.to, sq("d8"));
        assert_eq!(mv.promotion, Some(cozy_chess::Piece::Knight));
    }

    #[test]
    fn test_resolve_cancelled() {
        let game = promo_game();
        assert_eq!(
            PromotionResolver.resolve(&game, sq("e7"), sq("e8"), PromotionChoice::Cancelled),
            None
        );
    }

    #[test]
    fn test_resolve_rejects_king() {
        let game = promo_game();
        assert_eq!(
            PromotionResolver.resolve(&game, sq("e7"), sq("e8"), PromotionChoice::Piece(PieceKind::King)),
            None
        );
    }
}
