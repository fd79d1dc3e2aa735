mod actor;
mod commands;
mod events;
mod handle;
mod snapshot;
mod state;

pub use actor::{run_session, spawn_session};
pub use commands::{SessionError, SessionInput};
pub use events::SessionEvent;
pub use handle::SessionHandle;
pub use snapshot::SessionSnapshot;
pub use state::{FlowState, Outcome, PendingInteraction};

use chess::{format_uci_move, GameStatus, PlayerSide, Position, RulesEngine};
use cozy_chess::{Move, Square};
use engine::{EngineBridge, EngineReply};
use tokio::sync::broadcast;

use crate::board::Board;
use crate::config::SessionConfig;
use crate::difficulty::{DifficultyController, DifficultyLevel, HumanResult};
use crate::input_gate::{InputGate, Intent, NoiseKind, RawInput};
use crate::promotion::{PromotionChoice, PromotionResolver};

const EVENT_CAPACITY: usize = 64;

/// One human-vs-engine session: a sequence of games sharing a difficulty level.
///
/// Every input is handled to completion before the next one is looked at.
/// The only suspension points are the two explicit waiting states,
/// [`FlowState::AwaitingPromotion`] and [`FlowState::AwaitingEngine`].
pub struct GameSession<R, B> {
    id: String,
    rules: R,
    board: B,
    engine: EngineBridge,
    gate: InputGate,
    promotion: PromotionResolver,
    difficulty: DifficultyController,
    human_side: PlayerSide,
    state: FlowState,
    engine_faulted: bool,
    event_tx: broadcast::Sender<SessionEvent>,
}

impl<R: RulesEngine, B: Board> GameSession<R, B> {
    /// Set up the board for the rules engine's current position and, when the
    /// engine moves first, request its move.
    pub fn new(
        config: SessionConfig,
        rules: R,
        board: B,
        mut engine: EngineBridge,
    ) -> Result<Self, SessionError> {
        let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);
        engine.set_strength(config.start_level.get());

        let mut session = Self {
            id: uuid::Uuid::new_v4().to_string(),
            rules,
            board,
            engine,
            gate: InputGate::new(),
            promotion: PromotionResolver,
            difficulty: DifficultyController::new(config.start_level),
            human_side: config.human_side,
            state: FlowState::Idle,
            engine_faulted: false,
            event_tx,
        };

        tracing::info!(
            id = %session.id,
            human = %session.human_side,
            level = session.difficulty.level().get(),
            "Session started"
        );
        session.begin_game()?;
        Ok(session)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn pending(&self) -> PendingInteraction {
        self.state.pending()
    }

    pub fn position(&self) -> Position {
        self.rules.position()
    }

    pub fn status(&self) -> GameStatus {
        self.rules.status()
    }

    pub fn difficulty(&self) -> DifficultyLevel {
        self.difficulty.level()
    }

    pub fn human_side(&self) -> PlayerSide {
        self.human_side
    }

    pub fn board(&self) -> &B {
        &self.board
    }

    pub fn rules(&self) -> &R {
        &self.rules
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let position = self.rules.position();
        let level = self.difficulty.level();
        SessionSnapshot {
            session_id: self.id.clone(),
            fen: position.as_fen().to_string(),
            side_to_move: self.rules.turn(),
            human_side: self.human_side,
            state: self.state.name(),
            pending: self.state.pending(),
            status: self.rules.status(),
            level,
            estimated_rating: level.estimated_rating(),
        }
    }

    /// Classify a raw board event and act on the resulting intent.
    pub fn handle_raw(&mut self, raw: RawInput) -> Result<(), SessionError> {
        let intent = self.gate.classify(raw);
        self.handle_intent(intent)
    }

    pub fn handle_intent(&mut self, intent: Intent) -> Result<(), SessionError> {
        match (self.state, intent) {
            (_, Intent::Noise(NoiseKind::Background)) => {
                self.board.clear_transient_markers();
                Ok(())
            }
            (_, Intent::Noise(_)) => Ok(()),
            (FlowState::Idle, Intent::SelectionStarted(square)) => {
                self.show_moves_from(square);
                Ok(())
            }
            (FlowState::Idle, Intent::MoveAttempted { from, to }) => self.attempt_move(from, to),
            (FlowState::Idle, Intent::Cancelled) => {
                self.board.clear_legal_move_markers();
                Ok(())
            }
            (state, intent) => {
                tracing::debug!(?state, ?intent, "Ignoring input");
                Ok(())
            }
        }
    }

    /// Answer to the promotion prompt. Ignored unless a prompt is open.
    pub fn on_promotion_choice(&mut self, choice: PromotionChoice) -> Result<(), SessionError> {
        let FlowState::AwaitingPromotion { from, to } = self.state else {
            tracing::debug!(?choice, state = self.state.name(), "No promotion pending");
            return Ok(());
        };

        let Some(mv) = self.promotion.resolve(&self.rules, from, to, choice) else {
            self.restore_human_turn();
            return Ok(());
        };

        match self.rules.apply(mv) {
            Ok(position) => self.after_move(position),
            Err(e) => {
                tracing::warn!(mv = %format_uci_move(mv), "Resolved promotion rejected: {}", e);
                self.restore_human_turn();
                Ok(())
            }
        }
    }

    /// Wait for the engine's answer to the outstanding request.
    /// Pending forever when none is outstanding.
    pub async fn next_engine_reply(&mut self) -> EngineReply {
        self.engine.next_reply().await
    }

    pub fn on_engine_reply(&mut self, reply: EngineReply) -> Result<(), SessionError> {
        if self.state != FlowState::AwaitingEngine {
            tracing::warn!(
                ticket = reply.ticket,
                state = self.state.name(),
                "Discarding engine reply outside AwaitingEngine"
            );
            return Ok(());
        }

        let mv = match reply.result {
            Ok(mv) => mv,
            Err(e) => return Err(self.fail(SessionError::EngineUnavailable(e))),
        };

        tracing::debug!(mv = %format_uci_move(mv), ticket = reply.ticket, "Engine replied");
        match self.rules.apply(mv) {
            Ok(position) => self.after_move(position),
            Err(e) => Err(self.fail(SessionError::InconsistentEngineMove {
                mv: format_uci_move(mv),
                reason: e.to_string(),
            })),
        }
    }

    /// Start a fresh game at the current difficulty level. Accepted in any
    /// state. An engine that still owes a reply, or has failed, is replaced
    /// before the new game starts.
    pub fn new_game(&mut self) -> Result<(), SessionError> {
        let abandoned = self.engine.abandon();
        if abandoned.is_some() || self.engine_faulted || self.engine.is_stopped() {
            if let Err(e) = self.engine.restart() {
                return Err(self.fail(SessionError::EngineUnavailable(e)));
            }
            self.engine_faulted = false;
        }

        self.rules.reset();
        self.board.clear_legal_move_markers();
        self.board.clear_transient_markers();
        tracing::info!(level = self.difficulty.level().get(), "New game");
        self.begin_game()
    }

    /// Shut the engine down. The session takes no further engine moves.
    pub async fn shutdown(&mut self) {
        self.board.disable_input();
        self.engine.shutdown().await;
        tracing::info!("Session engine stopped");
    }

    fn begin_game(&mut self) -> Result<(), SessionError> {
        let position = self.rules.position();
        self.board.disable_input();
        self.board.set_position(&position, false);

        if let Some(outcome) = Outcome::from_status(self.rules.status()) {
            tracing::info!(?outcome, "Starting position is already decided");
            self.state = FlowState::Terminal(outcome);
            self.publish_position();
            return Ok(());
        }

        if self.rules.turn() == self.human_side {
            self.state = FlowState::Idle;
            self.board.enable_input(self.human_side);
            self.publish_position();
            Ok(())
        } else {
            self.publish_position();
            self.request_engine_move()
        }
    }

    fn show_moves_from(&mut self, square: Square) {
        self.board.clear_legal_move_markers();
        let moves = self.rules.legal_moves(Some(square));
        if !moves.is_empty() {
            self.board.show_legal_move_markers(&moves);
        }
    }

    fn attempt_move(&mut self, from: Square, to: Square) -> Result<(), SessionError> {
        self.board.clear_legal_move_markers();

        if self.promotion.needs_resolution(&self.rules, from, to) {
            tracing::debug!(%from, %to, "Promotion choice needed");
            self.state = FlowState::AwaitingPromotion { from, to };
            self.board.disable_input();
            self.board.prompt_promotion(to, self.human_side);
            return Ok(());
        }

        let mv = Move {
            from,
            to,
            promotion: None,
        };
        match self.rules.apply(mv) {
            Ok(position) => self.after_move(position),
            Err(e) => {
                tracing::debug!(mv = %format_uci_move(mv), "Rejected move: {}", e);
                self.board.clear_transient_markers();
                Ok(())
            }
        }
    }

    /// Shared tail of every applied move, human or engine.
    fn after_move(&mut self, position: Position) -> Result<(), SessionError> {
        self.board.disable_input();
        self.board.set_position(&position, true);
        self.publish_position();

        if let Some(outcome) = Outcome::from_status(self.rules.status()) {
            self.finish(outcome);
            return Ok(());
        }

        if self.rules.turn() == self.human_side {
            self.state = FlowState::Idle;
            self.board.enable_input(self.human_side);
            Ok(())
        } else {
            self.request_engine_move()
        }
    }

    fn request_engine_move(&mut self) -> Result<(), SessionError> {
        self.state = FlowState::AwaitingEngine;
        self.board.disable_input();

        let fen = self.rules.position().as_fen().to_string();
        let level = self.difficulty.level().get();
        match self.engine.request_best_move(fen, level) {
            Ok(ticket) => {
                tracing::debug!(ticket, level, "Requested engine move");
                Ok(())
            }
            Err(e) => Err(self.fail(SessionError::EngineUnavailable(e))),
        }
    }

    fn finish(&mut self, outcome: Outcome) {
        let result = match outcome {
            Outcome::Checkmate { winner } if winner == self.human_side => HumanResult::Win,
            Outcome::Checkmate { .. } => HumanResult::Loss,
            Outcome::Draw(_) => HumanResult::Draw,
        };

        let level = self.difficulty.on_game_end(result);
        self.engine.set_strength(level.get());
        self.state = FlowState::Terminal(outcome);
        self.board.disable_input();

        tracing::info!(?outcome, ?result, level = level.get(), "Game over");
        let _ = self.event_tx.send(SessionEvent::GameOver {
            outcome,
            result,
            level,
            estimated_rating: level.estimated_rating(),
        });
    }

    /// Back to the human's turn with the position untouched.
    fn restore_human_turn(&mut self) {
        self.state = FlowState::Idle;
        self.board.set_position(&self.rules.position(), true);
        self.board.enable_input(self.human_side);
    }

    /// The game cannot go on. Input stays disabled until `new_game`.
    fn fail(&mut self, error: SessionError) -> SessionError {
        tracing::error!("Session fault: {}", error);
        self.engine_faulted = true;
        self.state = FlowState::AwaitingEngine;
        self.board.disable_input();
        let _ = self.event_tx.send(SessionEvent::Fatal(error.to_string()));
        error
    }

    fn publish_position(&self) {
        let _ = self
            .event_tx
            .send(SessionEvent::PositionChanged(self.snapshot()));
    }
}
