//! Game flow controller for human-vs-engine chess.
//!
//! A [`GameSession`] turns raw board events into intents, runs them against
//! the rules engine, asks the engine for replies, and adapts the engine's
//! strength between games. [`spawn_session`] puts a session on its own actor
//! task and hands back a [`SessionHandle`].

pub mod board;
pub mod config;
pub mod difficulty;
pub mod input_gate;
pub mod promotion;
pub mod session;

pub use board::Board;
pub use config::SessionConfig;
pub use difficulty::{DifficultyController, DifficultyLevel, HumanResult};
pub use input_gate::{InputGate, Intent, NoiseKind, RawInput, QUIESCENCE_WINDOW};
pub use promotion::{PromotionChoice, PromotionResolver};
pub use session::{
    run_session, spawn_session, FlowState, GameSession, Outcome, PendingInteraction,
    SessionError, SessionEvent, SessionHandle, SessionInput, SessionSnapshot,
};
