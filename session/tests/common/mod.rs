#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chess::{Game, PlayerSide, Position, RulesEngine};
use chess_session::{Board, DifficultyLevel, GameSession, SessionConfig, SessionEvent};
use cozy_chess::{Move, Square};
use engine::mock::{ScriptedEngine, Script};
use engine::EngineBridge;
use tokio::sync::broadcast;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardCall {
    SetPosition { fen: String, animate: bool },
    EnableInput(PlayerSide),
    DisableInput,
    ShowMarkers(Vec<Move>),
    ClearMarkers,
    ClearTransient,
    PromptPromotion(Square, PlayerSide),
}

/// Board double that records every call. Clones share one log.
#[derive(Clone, Default)]
pub struct RecordingBoard {
    calls: Arc<Mutex<Vec<BoardCall>>>,
}

impl RecordingBoard {
    pub fn calls(&self) -> Vec<BoardCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Whether the most recent enable/disable call was an enable.
    pub fn input_enabled(&self) -> bool {
        self.calls()
            .iter()
            .rev()
            .find_map(|c| match c {
                BoardCall::EnableInput(_) => Some(true),
                BoardCall::DisableInput => Some(false),
                _ => None,
            })
            .unwrap_or(false)
    }

    pub fn last_fen(&self) -> Option<String> {
        self.calls().iter().rev().find_map(|c| match c {
            BoardCall::SetPosition { fen, .. } => Some(fen.clone()),
            _ => None,
        })
    }

    fn push(&self, call: BoardCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Board for RecordingBoard {
    fn set_position(&mut self, position: &Position, animate: bool) {
        self.push(BoardCall::SetPosition {
            fen: position.as_fen().to_string(),
            animate,
        });
    }

    fn enable_input(&mut self, side: PlayerSide) {
        self.push(BoardCall::EnableInput(side));
    }

    fn disable_input(&mut self) {
        self.push(BoardCall::DisableInput);
    }

    fn show_legal_move_markers(&mut self, moves: &[Move]) {
        self.push(BoardCall::ShowMarkers(moves.to_vec()));
    }

    fn clear_legal_move_markers(&mut self) {
        self.push(BoardCall::ClearMarkers);
    }

    fn clear_transient_markers(&mut self) {
        self.push(BoardCall::ClearTransient);
    }

    fn prompt_promotion(&mut self, square: Square, side: PlayerSide) {
        self.push(BoardCall::PromptPromotion(square, side));
    }
}

pub struct Harness {
    pub session: GameSession<Game, RecordingBoard>,
    pub board: RecordingBoard,
    pub script: Script,
    pub events: broadcast::Receiver<SessionEvent>,
}

pub fn config(side: PlayerSide, level: u8) -> SessionConfig {
    SessionConfig {
        human_side: side,
        start_level: DifficultyLevel::new(level),
    }
}

/// Session on `fen` (or the standard start) with a scripted engine.
/// Must run inside a tokio runtime.
pub fn harness(fen: Option<&str>, config: SessionConfig) -> Harness {
    let game = match fen {
        Some(fen) => Game::from_fen(fen).unwrap(),
        None => Game::new(),
    };
    let board = RecordingBoard::default();
    let (engine, script) = ScriptedEngine::new();
    let bridge =
        EngineBridge::spawn(engine, config.start_level.get()).with_restart(script.factory());
    let session = GameSession::new(config, game, board.clone(), bridge).unwrap();
    let events = session.subscribe();
    Harness {
        session,
        board,
        script,
        events,
    }
}

impl Harness {
    /// Script the engine's answer and feed it through the session.
    pub async fn engine_plays(&mut self, mv: &str) -> Result<(), chess_session::SessionError> {
        self.script.reply(mv.parse().unwrap());
        let reply = tokio::time::timeout(Duration::from_secs(5), self.session.next_engine_reply())
            .await
            .expect("engine reply");
        self.session.on_engine_reply(reply)
    }

    pub fn fen(&self) -> String {
        self.session.rules().position().as_fen().to_string()
    }

    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        let mut out = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            out.push(event);
        }
        out
    }
}

pub fn sq(s: &str) -> Square {
    s.parse().unwrap()
}

pub fn mv(s: &str) -> Move {
    s.parse().unwrap()
}
