mod common;

use std::time::{Duration, Instant};

use chess::{PieceKind, PlayerSide, Position};
use chess_session::{
    FlowState, Intent, PendingInteraction, PromotionChoice, RawInput, SessionError, SessionEvent,
};
use common::{config, harness, mv, sq, BoardCall};
use engine::mock::MockCall;
use engine::EngineError;

const PROMOTION_FEN: &str = "3r4/4P3/8/8/8/8/k7/4K3 w - - 0 1";

fn attempt(from: &str, to: &str) -> Intent {
    Intent::MoveAttempted {
        from: sq(from),
        to: sq(to),
    }
}

/// Piece placement and side to move, without the clocks and en passant field.
fn placement(fen: &str) -> String {
    fen.split_whitespace().take(2).collect::<Vec<_>>().join(" ")
}

async fn wait_for_requests(script: &engine::mock::Script, n: usize) {
    for _ in 0..100 {
        if script.request_count() >= n {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("engine never saw request {}", n);
}

#[tokio::test]
async fn test_new_session_waits_for_white() {
    let h = harness(None, config(PlayerSide::White, 10));
    assert_eq!(h.session.state(), FlowState::Idle);
    assert_eq!(h.session.pending(), PendingInteraction::None);
    assert_eq!(h.fen(), Position::STARTING_FEN);
    assert!(h.board.input_enabled());
    assert_eq!(h.script.request_count(), 0);
}

#[tokio::test]
async fn test_selection_shows_legal_targets() {
    let mut h = harness(None, config(PlayerSide::White, 10));
    h.board.clear();

    h.session.handle_intent(Intent::SelectionStarted(sq("e2"))).unwrap();

    let shown: Vec<_> = h
        .board
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            BoardCall::ShowMarkers(moves) => Some(moves),
            _ => None,
        })
        .collect();
    assert_eq!(shown.len(), 1);
    let mut targets: Vec<_> = shown[0].iter().map(|m| m.to).collect();
    targets.sort_by_key(|s| *s as usize);
    assert_eq!(targets, vec![sq("e3"), sq("e4")]);
    assert_eq!(h.session.state(), FlowState::Idle);
}

#[tokio::test]
async fn test_selection_without_moves_shows_nothing() {
    let mut h = harness(None, config(PlayerSide::White, 10));
    h.board.clear();

    h.session.handle_intent(Intent::SelectionStarted(sq("e7"))).unwrap();
    h.session.handle_intent(Intent::SelectionStarted(sq("e4"))).unwrap();

    assert!(!h
        .board
        .calls()
        .iter()
        .any(|c| matches!(c, BoardCall::ShowMarkers(_))));
}

#[tokio::test]
async fn test_opening_move_requests_engine() {
    let mut h = harness(None, config(PlayerSide::White, 10));

    h.session.handle_intent(attempt("e2", "e4")).unwrap();

    let expected = h.fen();
    assert_eq!(
        placement(&expected),
        "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b"
    );
    assert_eq!(h.session.state(), FlowState::AwaitingEngine);
    assert_eq!(h.session.pending(), PendingInteraction::AwaitingEngineReply);
    assert!(!h.board.input_enabled());
    assert_eq!(h.board.last_fen(), Some(expected.clone()));

    wait_for_requests(&h.script, 1).await;
    assert!(h.script.calls().contains(&MockCall::RequestMove {
        fen: expected,
        strength: 10,
    }));
}

#[tokio::test]
async fn test_engine_reply_returns_turn_to_human() {
    let mut h = harness(None, config(PlayerSide::White, 10));
    h.session.handle_intent(attempt("e2", "e4")).unwrap();

    h.engine_plays("e7e5").await.unwrap();

    assert_eq!(h.session.state(), FlowState::Idle);
    assert!(h.board.input_enabled());
    assert_eq!(h.session.position().side_to_move(), PlayerSide::White);
}

#[tokio::test]
async fn test_illegal_attempt_changes_nothing() {
    let mut h = harness(None, config(PlayerSide::White, 10));
    h.board.clear();

    h.session.handle_intent(attempt("e2", "e5")).unwrap();

    assert_eq!(h.session.state(), FlowState::Idle);
    assert_eq!(h.fen(), Position::STARTING_FEN);
    assert!(h.board.calls().contains(&BoardCall::ClearTransient));
    assert!(!h
        .board
        .calls()
        .iter()
        .any(|c| matches!(c, BoardCall::SetPosition { .. })));
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(h.script.request_count(), 0);
}

#[tokio::test]
async fn test_moves_during_engine_turn_are_ignored() {
    let mut h = harness(None, config(PlayerSide::White, 10));
    h.session.handle_intent(attempt("e2", "e4")).unwrap();
    let after_first = h.fen();

    h.session.handle_intent(attempt("d2", "d4")).unwrap();
    h.session.handle_intent(Intent::SelectionStarted(sq("d2"))).unwrap();

    assert_eq!(h.fen(), after_first);
    assert_eq!(h.session.state(), FlowState::AwaitingEngine);
    wait_for_requests(&h.script, 1).await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(h.script.request_count(), 1);
}

#[tokio::test]
async fn test_raw_moves_during_engine_turn_are_ignored() {
    let mut h = harness(None, config(PlayerSide::White, 10));
    h.session.handle_intent(attempt("e2", "e4")).unwrap();
    wait_for_requests(&h.script, 1).await;
    let after_first = h.fen();

    // Legal replies for Black, arriving through the raw path while the engine thinks.
    let start = Instant::now();
    h.session
        .handle_raw(RawInput::ValidateMoveInput {
            from: sq("e7"),
            to: sq("e5"),
            at: start,
        })
        .unwrap();
    h.session
        .handle_raw(RawInput::ValidateMoveInput {
            from: sq("d7"),
            to: sq("d5"),
            at: start + Duration::from_millis(10),
        })
        .unwrap();

    assert_eq!(h.fen(), after_first);
    assert_eq!(h.session.state(), FlowState::AwaitingEngine);
    assert_eq!(h.session.pending(), PendingInteraction::AwaitingEngineReply);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(h.script.request_count(), 1);
}

#[tokio::test]
async fn test_promotion_prompt_then_queen() {
    let mut h = harness(Some(PROMOTION_FEN), config(PlayerSide::White, 10));

    h.session.handle_intent(attempt("e7", "e8")).unwrap();

    assert_eq!(
        h.session.state(),
        FlowState::AwaitingPromotion {
            from: sq("e7"),
            to: sq("e8")
        }
    );
    assert_eq!(h.session.pending(), PendingInteraction::AwaitingPromotionChoice);
    assert!(h
        .board
        .calls()
        .contains(&BoardCall::PromptPromotion(sq("e8"), PlayerSide::White)));
    assert!(!h.board.input_enabled());
    assert_eq!(h.fen(), PROMOTION_FEN);

    h.session
        .on_promotion_choice(PromotionChoice::Piece(PieceKind::Queen))
        .unwrap();

    assert_eq!(h.fen(), "3rQ3/8/8/8/8/8/k7/4K3 b - - 0 1");
    assert_eq!(h.session.state(), FlowState::AwaitingEngine);
}

#[tokio::test]
async fn test_promotion_capture_with_knight() {
    let mut h = harness(Some(PROMOTION_FEN), config(PlayerSide::White, 10));

    h.session.handle_intent(attempt("e7", "d8")).unwrap();
    h.session
        .on_promotion_choice(PromotionChoice::Piece(PieceKind::Knight))
        .unwrap();

    assert_eq!(h.fen(), "3N4/8/8/8/8/8/k7/4K3 b - - 0 1");
}

#[tokio::test]
async fn test_promotion_cancel_restores_position() {
    let mut h = harness(Some(PROMOTION_FEN), config(PlayerSide::White, 10));
    h.session.handle_intent(attempt("e7", "e8")).unwrap();

    h.session.on_promotion_choice(PromotionChoice::Cancelled).unwrap();

    assert_eq!(h.session.state(), FlowState::Idle);
    assert_eq!(h.fen(), PROMOTION_FEN);
    assert_eq!(h.board.last_fen().as_deref(), Some(PROMOTION_FEN));
    assert!(h.board.input_enabled());
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(h.script.request_count(), 0);
}

#[tokio::test]
async fn test_promotion_choice_without_prompt_is_ignored() {
    let mut h = harness(None, config(PlayerSide::White, 10));
    h.session
        .on_promotion_choice(PromotionChoice::Piece(PieceKind::Queen))
        .unwrap();
    assert_eq!(h.session.state(), FlowState::Idle);
    assert_eq!(h.fen(), Position::STARTING_FEN);
}

#[tokio::test]
async fn test_input_ignored_while_promotion_pending() {
    let mut h = harness(Some(PROMOTION_FEN), config(PlayerSide::White, 10));
    h.session.handle_intent(attempt("e7", "e8")).unwrap();

    h.session.handle_intent(attempt("e1", "d1")).unwrap();

    assert!(matches!(
        h.session.state(),
        FlowState::AwaitingPromotion { .. }
    ));
    assert_eq!(h.fen(), PROMOTION_FEN);
}

#[tokio::test]
async fn test_human_black_waits_for_engine_first() {
    let mut h = harness(None, config(PlayerSide::Black, 10));

    assert_eq!(h.session.state(), FlowState::AwaitingEngine);
    assert!(!h.board.input_enabled());
    wait_for_requests(&h.script, 1).await;

    h.engine_plays("e2e4").await.unwrap();

    assert_eq!(h.session.state(), FlowState::Idle);
    assert!(h.board.input_enabled());
    assert!(h.board.calls().contains(&BoardCall::EnableInput(PlayerSide::Black)));
}

#[tokio::test]
async fn test_inconsistent_engine_move_is_fatal() {
    let mut h = harness(None, config(PlayerSide::White, 10));
    h.session.handle_intent(attempt("e2", "e4")).unwrap();
    h.drain_events();

    let err = h.engine_plays("e2e3").await.unwrap_err();

    assert!(matches!(err, SessionError::InconsistentEngineMove { ref mv, .. } if mv == "e2e3"));
    assert_eq!(h.session.state(), FlowState::AwaitingEngine);
    assert!(!h.board.input_enabled());
    assert!(h
        .drain_events()
        .iter()
        .any(|e| matches!(e, SessionEvent::Fatal(_))));

    // Board input stays dead until a new game.
    h.session.handle_intent(attempt("d2", "d4")).unwrap();
    assert_eq!(h.session.state(), FlowState::AwaitingEngine);
}

#[tokio::test]
async fn test_engine_failure_is_fatal() {
    let mut h = harness(None, config(PlayerSide::White, 10));
    h.session.handle_intent(attempt("e2", "e4")).unwrap();

    h.script.fail(EngineError::Unavailable("crashed".to_string()));
    let reply = tokio::time::timeout(Duration::from_secs(5), h.session.next_engine_reply())
        .await
        .unwrap();
    let err = h.session.on_engine_reply(reply).unwrap_err();

    assert!(matches!(err, SessionError::EngineUnavailable(_)));
    assert_eq!(h.session.state(), FlowState::AwaitingEngine);
}

#[tokio::test]
async fn test_new_game_replaces_hung_engine() {
    let mut h = harness(None, config(PlayerSide::White, 10));
    h.session.handle_intent(attempt("e2", "e4")).unwrap();
    // Nothing is scripted: the engine never answers this search.
    wait_for_requests(&h.script, 1).await;

    h.session.new_game().unwrap();
    assert_eq!(h.session.state(), FlowState::Idle);
    assert_eq!(h.fen(), Position::STARTING_FEN);
    assert_eq!(h.script.started(), 2);

    h.session.handle_intent(attempt("d2", "d4")).unwrap();
    h.engine_plays("d7d5").await.unwrap();

    assert_eq!(
        placement(&h.fen()),
        "rnbqkbnr/ppp1pppp/8/3p4/3P4/8/PPP1PPPP/RNBQKBNR w"
    );
    assert_eq!(h.session.state(), FlowState::Idle);
}

#[tokio::test]
async fn test_repeated_new_games_while_engine_moves_first() {
    let mut h = harness(None, config(PlayerSide::Black, 10));
    assert_eq!(h.session.state(), FlowState::AwaitingEngine);

    for _ in 0..8 {
        h.session.new_game().unwrap();
        assert_eq!(h.session.state(), FlowState::AwaitingEngine);
    }
    assert_eq!(h.script.started(), 9);

    h.engine_plays("e2e4").await.unwrap();
    assert_eq!(
        placement(&h.fen()),
        "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b"
    );
    assert_eq!(h.session.state(), FlowState::Idle);
}

#[tokio::test]
async fn test_new_game_after_engine_failure_is_playable() {
    let mut h = harness(None, config(PlayerSide::White, 10));
    h.session.handle_intent(attempt("e2", "e4")).unwrap();
    h.script.fail(EngineError::Unavailable("crashed".to_string()));
    let reply = tokio::time::timeout(Duration::from_secs(5), h.session.next_engine_reply())
        .await
        .unwrap();
    assert!(h.session.on_engine_reply(reply).is_err());
    assert!(!h.board.input_enabled());

    h.session.new_game().unwrap();
    assert_eq!(h.session.state(), FlowState::Idle);
    assert!(h.board.input_enabled());
    assert_eq!(h.script.started(), 2);

    h.session.handle_intent(attempt("g1", "f3")).unwrap();
    h.engine_plays("g8f6").await.unwrap();
    assert_eq!(h.session.state(), FlowState::Idle);
}

#[tokio::test]
async fn test_cancel_clears_markers() {
    let mut h = harness(None, config(PlayerSide::White, 10));
    h.session.handle_intent(Intent::SelectionStarted(sq("g1"))).unwrap();
    h.board.clear();

    let now = Instant::now();
    h.session.handle_raw(RawInput::MoveInputCanceled { at: now }).unwrap();

    assert_eq!(h.board.calls(), vec![BoardCall::ClearMarkers]);
}

#[tokio::test]
async fn test_pointer_noise_never_moves_pieces() {
    let mut h = harness(None, config(PlayerSide::White, 10));
    let start = Instant::now();

    h.session
        .handle_raw(RawInput::MoveInputStarted {
            square: sq("e2"),
            at: start,
        })
        .unwrap();
    h.board.clear();
    h.session
        .handle_raw(RawInput::PointerDown {
            at: start + Duration::from_millis(5),
        })
        .unwrap();
    h.session
        .handle_raw(RawInput::MovingOverSquare {
            square: sq("e4"),
            at: start + Duration::from_millis(10),
        })
        .unwrap();
    assert!(h.board.calls().is_empty());

    h.session
        .handle_raw(RawInput::PointerDown {
            at: start + Duration::from_secs(2),
        })
        .unwrap();
    assert_eq!(h.board.calls(), vec![BoardCall::ClearTransient]);
    assert_eq!(h.fen(), Position::STARTING_FEN);
    assert_eq!(h.session.state(), FlowState::Idle);
}

#[tokio::test]
async fn test_position_events_carry_snapshots() {
    let mut h = harness(None, config(PlayerSide::White, 10));
    h.session.handle_intent(attempt("g1", "f3")).unwrap();

    let events = h.drain_events();
    let snapshot = events
        .iter()
        .find_map(|e| match e {
            SessionEvent::PositionChanged(s) => Some(s.clone()),
            _ => None,
        })
        .expect("position event");

    assert_eq!(snapshot.side_to_move, PlayerSide::Black);
    assert_eq!(snapshot.human_side, PlayerSide::White);
    assert_eq!(snapshot.level.get(), 10);
    assert!(snapshot.fen.parse::<Position>().is_ok());

    let json = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(json["human_side"], "white");
    assert_eq!(json["level"], 10);
}
