use tokio::sync::{broadcast, mpsc, oneshot};

use super::commands::{SessionError, SessionInput};
use super::events::SessionEvent;
use super::snapshot::SessionSnapshot;
use crate::input_gate::RawInput;
use crate::promotion::PromotionChoice;

/// Cheap, cloneable handle to a session actor.
#[derive(Clone)]
pub struct SessionHandle {
    id: String,
    input_tx: mpsc::Sender<SessionInput>,
}

impl SessionHandle {
    pub(crate) fn new(id: String, input_tx: mpsc::Sender<SessionInput>) -> Self {
        Self { id, input_tx }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub async fn send_raw(&self, raw: RawInput) -> Result<(), SessionError> {
        self.send(SessionInput::Raw(raw)).await
    }

    pub async fn choose_promotion(&self, choice: PromotionChoice) -> Result<(), SessionError> {
        self.send(SessionInput::Promotion(choice)).await
    }

    pub async fn new_game(&self) -> Result<(), SessionError> {
        self.send(SessionInput::NewGame).await
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionInput::GetSnapshot { reply: tx }).await?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    /// Current snapshot plus a receiver for everything after it.
    pub async fn subscribe(
        &self,
    ) -> Result<(SessionSnapshot, broadcast::Receiver<SessionEvent>), SessionError> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionInput::Subscribe { reply: tx }).await?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    /// Stop the session and wait until its engine has been shut down.
    pub async fn shutdown(&self) -> Result<(), SessionError> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionInput::Shutdown { reply: tx }).await?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    async fn send(&self, input: SessionInput) -> Result<(), SessionError> {
        self.input_tx
            .send(input)
            .await
            .map_err(|_| SessionError::Closed)
    }
}
