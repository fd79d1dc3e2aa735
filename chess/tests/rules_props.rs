//! Property tests for the rules adapter.

use chess::{Game, GameError, RulesEngine};
use cozy_chess::{Move, Square};
use proptest::prelude::*;

/// Play a pseudo-random game by picking legal moves by index.
fn play_by_indices(picks: &[usize]) -> Game {
    let mut game = Game::new();
    for &pick in picks {
        let moves = game.legal_moves(None);
        if moves.is_empty() {
            break;
        }
        let mv = moves[pick % moves.len()];
        game.apply(mv).expect("legal move must apply");
    }
    game
}

fn square(index: usize) -> Square {
    Square::index(index % 64)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Status computed after an apply does not change when recomputed.
    #[test]
    fn prop_status_is_stable(picks in prop::collection::vec(any::<usize>(), 0..60)) {
        let game = play_by_indices(&picks);
        let first = game.status();
        prop_assert_eq!(first, game.status());
        prop_assert_eq!(first.is_over(), game.legal_moves(None).is_empty());
    }

    /// A rejected move never changes the position.
    #[test]
    fn prop_rejected_move_keeps_position(
        picks in prop::collection::vec(any::<usize>(), 0..30),
        from in 0usize..64,
        to in 0usize..64,
    ) {
        let mut game = play_by_indices(&picks);
        let candidate = Move { from: square(from), to: square(to), promotion: None };
        let before = game.position();
        match game.apply(candidate) {
            Ok(_) => prop_assert!(before != game.position()),
            Err(GameError::IllegalMove) | Err(GameError::AmbiguousPromotion) => {
                prop_assert_eq!(before, game.position());
            }
            Err(other) => prop_assert!(false, "unexpected error {:?}", other),
        }
    }

    /// Every move offered for a square starts on that square and applies cleanly.
    #[test]
    fn prop_square_moves_are_applicable(
        picks in prop::collection::vec(any::<usize>(), 0..30),
        from in 0usize..64,
    ) {
        let game = play_by_indices(&picks);
        for mv in game.legal_moves(Some(square(from))) {
            prop_assert_eq!(mv.from, square(from));
            let mut copy = game.clone();
            prop_assert!(copy.apply(mv).is_ok());
        }
    }
}
