use engine::EngineError;
use tokio::sync::{broadcast, oneshot};

use super::events::SessionEvent;
use super::snapshot::SessionSnapshot;
use crate::input_gate::RawInput;
use crate::promotion::PromotionChoice;

#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionError {
    /// The engine proposed a move the rules engine rejects.
    #[error("Engine proposed move {mv} which the rules reject: {reason}")]
    InconsistentEngineMove { mv: String, reason: String },
    #[error("Engine unavailable: {0}")]
    EngineUnavailable(#[from] EngineError),
    #[error("Session actor closed")]
    Closed,
}

/// Inputs processed by the session actor, one at a time.
pub enum SessionInput {
    Raw(RawInput),
    Promotion(PromotionChoice),
    NewGame,
    GetSnapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
    Subscribe {
        reply: oneshot::Sender<(SessionSnapshot, broadcast::Receiver<SessionEvent>)>,
    },
    /// Stop the actor and the engine. Acknowledged once the engine is down.
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}
