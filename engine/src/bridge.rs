//! Single-outstanding-request bridge between the session and a search engine.
//!
//! The engine lives on its own worker task. Requests are ticketed so that a
//! reply belonging to an abandoned request is never mistaken for the answer
//! to a newer one. A bridge built with a restart factory can throw away a
//! hung or failed worker and start over with a fresh engine.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use cozy_chess::Move;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::{EngineError, SearchEngine, MAX_STRENGTH, MIN_STRENGTH};

/// Identifies one search request.
pub type Ticket = u64;

/// A search engine still being started.
pub type EngineFuture =
    Pin<Box<dyn Future<Output = Result<Box<dyn SearchEngine>, EngineError>> + Send>>;

/// Produces a fresh engine each time the bridge restarts its worker.
pub type EngineFactory = Box<dyn FnMut() -> EngineFuture + Send>;

/// The worker's answer to a search request.
#[derive(Debug)]
pub struct EngineReply {
    pub ticket: Ticket,
    pub result: Result<Move, EngineError>,
}

struct SearchRequest {
    ticket: Ticket,
    fen: String,
    strength: u8,
}

enum WorkerMessage {
    Search(SearchRequest),
    Shutdown,
}

/// Owning handle to an engine worker.
pub struct EngineBridge {
    request_tx: mpsc::Sender<WorkerMessage>,
    reply_rx: mpsc::Receiver<EngineReply>,
    worker: JoinHandle<()>,
    factory: Option<EngineFactory>,
    strength: u8,
    outstanding: Option<Ticket>,
    next_ticket: Ticket,
}

const QUEUE_DEPTH: usize = 4;
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

impl EngineBridge {
    /// Move `engine` onto a worker task. Must be called inside a tokio runtime.
    pub fn spawn<E: SearchEngine>(engine: E, strength: u8) -> Self {
        let ready: EngineFuture =
            Box::pin(async move { Ok::<_, EngineError>(Box::new(engine) as Box<dyn SearchEngine>) });
        let (request_tx, reply_rx, worker) = start_worker(ready);

        Self {
            request_tx,
            reply_rx,
            worker,
            factory: None,
            strength: strength.clamp(MIN_STRENGTH, MAX_STRENGTH),
            outstanding: None,
            next_ticket: 1,
        }
    }

    /// Allow [`restart`](Self::restart) to replace the worker with an engine
    /// made by `factory`.
    pub fn with_restart(mut self, factory: EngineFactory) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Strength the next request will use unless it names its own.
    pub fn strength(&self) -> u8 {
        self.strength
    }

    /// Change the strength for the next request. A search already running
    /// keeps the strength it was issued with.
    pub fn set_strength(&mut self, level: u8) {
        self.strength = level.clamp(MIN_STRENGTH, MAX_STRENGTH);
        tracing::debug!(strength = self.strength, "Engine strength set for next request");
    }

    /// Whether a reply is still owed.
    pub fn is_busy(&self) -> bool {
        self.outstanding.is_some()
    }

    /// Whether the worker has gone away and no request can reach it.
    pub fn is_stopped(&self) -> bool {
        self.request_tx.is_closed()
    }

    /// Issue a search without waiting for it. Fails with
    /// [`EngineError::Busy`] if a previous request has not been answered.
    #[tracing::instrument(level = "debug", skip(self, fen))]
    pub fn request_best_move(&mut self, fen: String, strength: u8) -> Result<Ticket, EngineError> {
        if self.outstanding.is_some() {
            return Err(EngineError::Busy);
        }
        self.set_strength(strength);

        let ticket = self.next_ticket;
        let request = SearchRequest {
            ticket,
            fen,
            strength: self.strength,
        };
        self.request_tx
            .try_send(WorkerMessage::Search(request))
            .map_err(|e| match e {
                // Abandoned searches still sit in the queue: the worker is stuck.
                mpsc::error::TrySendError::Full(_) => {
                    EngineError::Unavailable("engine request queue full".to_string())
                }
                mpsc::error::TrySendError::Closed(_) => {
                    EngineError::Unavailable("engine worker stopped".to_string())
                }
            })?;

        self.next_ticket += 1;
        self.outstanding = Some(ticket);
        tracing::debug!(ticket, strength = self.strength, "Search requested");
        Ok(ticket)
    }

    /// Wait for the reply to the outstanding request.
    ///
    /// Pending forever when nothing is outstanding, so it can sit in a
    /// `select!` arm. Cancel safe.
    pub async fn next_reply(&mut self) -> EngineReply {
        let Some(ticket) = self.outstanding else {
            return std::future::pending().await;
        };

        loop {
            match self.reply_rx.recv().await {
                Some(reply) if reply.ticket == ticket => {
                    self.outstanding = None;
                    return reply;
                }
                Some(stale) => {
                    tracing::warn!(ticket = stale.ticket, "Discarding stale engine reply");
                }
                None => {
                    self.outstanding = None;
                    return EngineReply {
                        ticket,
                        result: Err(EngineError::Unavailable(
                            "engine worker stopped".to_string(),
                        )),
                    };
                }
            }
        }
    }

    /// Stop waiting for the outstanding request. Its reply, if it ever
    /// comes, is dropped.
    pub fn abandon(&mut self) -> Option<Ticket> {
        let abandoned = self.outstanding.take();
        if let Some(ticket) = abandoned {
            tracing::info!(ticket, "Abandoned outstanding search");
        }
        abandoned
    }

    /// Drop the current worker, whatever it is doing, and start a new one
    /// from the restart factory. Any outstanding request is abandoned and
    /// queued searches are discarded.
    pub fn restart(&mut self) -> Result<(), EngineError> {
        let Some(factory) = self.factory.as_mut() else {
            return Err(EngineError::Unavailable(
                "engine cannot be restarted".to_string(),
            ));
        };
        let engine = factory();

        self.abandon();
        self.worker.abort();
        let (request_tx, reply_rx, worker) = start_worker(engine);
        self.request_tx = request_tx;
        self.reply_rx = reply_rx;
        self.worker = worker;
        tracing::info!(strength = self.strength, "Engine worker restarted");
        Ok(())
    }

    /// Stop the worker and let the engine release its resources. A worker
    /// stuck in a search is aborted after a grace period.
    pub async fn shutdown(&mut self) {
        self.abandon();
        if self.worker.is_finished() {
            return;
        }
        // A full queue means the worker is stuck; the grace period covers it.
        let _ = self.request_tx.try_send(WorkerMessage::Shutdown);
        if tokio::time::timeout(SHUTDOWN_GRACE, &mut self.worker).await.is_err() {
            tracing::warn!("Engine worker did not stop in time, aborting");
            self.worker.abort();
        }
    }
}

fn start_worker(
    engine: EngineFuture,
) -> (
    mpsc::Sender<WorkerMessage>,
    mpsc::Receiver<EngineReply>,
    JoinHandle<()>,
) {
    let (request_tx, request_rx) = mpsc::channel(QUEUE_DEPTH);
    let (reply_tx, reply_rx) = mpsc::channel(QUEUE_DEPTH);
    let worker = tokio::spawn(
        run_worker(engine, request_rx, reply_tx).instrument(tracing::info_span!("engine_worker")),
    );
    (request_tx, reply_rx, worker)
}

async fn run_worker(
    engine: EngineFuture,
    mut request_rx: mpsc::Receiver<WorkerMessage>,
    reply_tx: mpsc::Sender<EngineReply>,
) {
    let mut engine = match engine.await {
        Ok(engine) => engine,
        Err(e) => {
            tracing::error!("Engine failed to start: {}", e);
            refuse_searches(e, request_rx, reply_tx).await;
            return;
        }
    };
    tracing::info!("Engine worker started");
    let mut applied_strength = None;

    while let Some(WorkerMessage::Search(request)) = request_rx.recv().await {
        let SearchRequest {
            ticket,
            fen,
            strength,
        } = request;

        let result = async {
            if applied_strength != Some(strength) {
                engine.set_strength(strength).await?;
                applied_strength = Some(strength);
            }
            engine.request_move(&fen, strength).await
        }
        .await;

        if let Err(ref e) = result {
            tracing::error!(ticket, "Search failed: {}", e);
        }
        if reply_tx.send(EngineReply { ticket, result }).await.is_err() {
            break;
        }
    }

    engine.shutdown().await;
    tracing::info!("Engine worker exiting");
}

/// Answer every search with the start-up error until told to stop.
async fn refuse_searches(
    error: EngineError,
    mut request_rx: mpsc::Receiver<WorkerMessage>,
    reply_tx: mpsc::Sender<EngineReply>,
) {
    while let Some(WorkerMessage::Search(request)) = request_rx.recv().await {
        let reply = EngineReply {
            ticket: request.ticket,
            result: Err(error.clone()),
        };
        if reply_tx.send(reply).await.is_err() {
            break;
        }
    }
}
