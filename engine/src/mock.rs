//! Scripted search engine for tests - only compiled in test mode or with the mock feature

use crate::{EngineError, SearchEngine};
use async_trait::async_trait;
use cozy_chess::Move;
use crate::bridge::{EngineFactory, EngineFuture};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

type Answers = Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<Result<Move, EngineError>>>>;

/// Calls recorded by [`ScriptedEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    SetStrength(u8),
    RequestMove { fen: String, strength: u8 },
    Shutdown,
}

/// Engine whose answers are fed in by the test through a [`Script`].
///
/// Each `request_move` waits for the next scripted answer, so a test decides
/// exactly when the reply lands. Engines made from the same script share
/// one answer queue, so a restarted engine picks up where the last one hung.
pub struct ScriptedEngine {
    answers: Answers,
    call_log: Arc<Mutex<Vec<MockCall>>>,
}

/// Test-side controls for a [`ScriptedEngine`].
#[derive(Clone)]
pub struct Script {
    answers_tx: mpsc::UnboundedSender<Result<Move, EngineError>>,
    answers: Answers,
    call_log: Arc<Mutex<Vec<MockCall>>>,
    started: Arc<AtomicUsize>,
}

impl ScriptedEngine {
    pub fn new() -> (Self, Script) {
        let (tx, rx) = mpsc::unbounded_channel();
        let script = Script {
            answers_tx: tx,
            answers: Arc::new(tokio::sync::Mutex::new(rx)),
            call_log: Arc::new(Mutex::new(Vec::new())),
            started: Arc::new(AtomicUsize::new(0)),
        };
        (script.engine(), script)
    }
}

impl Script {
    /// A fresh engine driven by this script.
    pub fn engine(&self) -> ScriptedEngine {
        self.started.fetch_add(1, Ordering::SeqCst);
        ScriptedEngine {
            answers: self.answers.clone(),
            call_log: self.call_log.clone(),
        }
    }

    /// Restart factory handing out engines driven by this script.
    pub fn factory(&self) -> EngineFactory {
        let script = self.clone();
        Box::new(move || -> EngineFuture {
            let engine = script.engine();
            Box::pin(async move { Ok::<_, EngineError>(Box::new(engine) as Box<dyn SearchEngine>) })
        })
    }

    /// Number of engines made from this script, the first one included.
    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    /// Queue a move as the answer to the next request.
    pub fn reply(&self, mv: Move) {
        let _ = self.answers_tx.send(Ok(mv));
    }

    /// Queue a failure as the answer to the next request.
    pub fn fail(&self, error: EngineError) {
        let _ = self.answers_tx.send(Err(error));
    }

    /// Get recorded calls for verification
    pub fn calls(&self) -> Vec<MockCall> {
        self.call_log.lock().unwrap().clone()
    }

    /// Number of searches requested so far.
    pub fn request_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, MockCall::RequestMove { .. }))
            .count()
    }
}

#[async_trait]
impl SearchEngine for ScriptedEngine {
    async fn set_strength(&mut self, level: u8) -> Result<(), EngineError> {
        self.call_log.lock().unwrap().push(MockCall::SetStrength(level));
        Ok(())
    }

    async fn request_move(&mut self, fen: &str, strength: u8) -> Result<Move, EngineError> {
        self.call_log.lock().unwrap().push(MockCall::RequestMove {
            fen: fen.to_string(),
            strength,
        });
        match self.answers.lock().await.recv().await {
            Some(answer) => answer,
            None => Err(EngineError::Unavailable("script dropped".to_string())),
        }
    }

    async fn shutdown(&mut self) {
        self.call_log.lock().unwrap().push(MockCall::Shutdown);
    }
}
