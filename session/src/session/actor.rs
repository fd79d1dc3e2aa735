use chess::RulesEngine;
use tokio::sync::mpsc;
use tracing::Instrument;

use super::commands::SessionInput;
use super::handle::SessionHandle;
use super::GameSession;
use crate::board::Board;

const INPUT_QUEUE_DEPTH: usize = 32;

/// Move `session` onto its own actor task and return a handle to it.
pub fn spawn_session<R, B>(session: GameSession<R, B>) -> SessionHandle
where
    R: RulesEngine + 'static,
    B: Board + 'static,
{
    let (input_tx, input_rx) = mpsc::channel(INPUT_QUEUE_DEPTH);
    let handle = SessionHandle::new(session.id().to_string(), input_tx);
    tokio::spawn(run_session(session, input_rx));
    handle
}

/// The session actor loop.
/// Owns the session. Host inputs and engine replies are processed one at a time.
pub async fn run_session<R, B>(session: GameSession<R, B>, input_rx: mpsc::Receiver<SessionInput>)
where
    R: RulesEngine,
    B: Board,
{
    let session_id = session.id().to_string();
    run_session_inner(session, input_rx)
        .instrument(tracing::info_span!("session", id = %session_id))
        .await;
}

async fn run_session_inner<R, B>(
    mut session: GameSession<R, B>,
    mut input_rx: mpsc::Receiver<SessionInput>,
) where
    R: RulesEngine,
    B: Board,
{
    tracing::info!("Session actor started");

    loop {
        tokio::select! {
            biased;

            input = input_rx.recv() => {
                match input {
                    Some(SessionInput::Shutdown { reply }) => {
                        tracing::info!("Session actor shutting down");
                        session.shutdown().await;
                        let _ = reply.send(());
                        break;
                    }
                    None => {
                        tracing::info!("All handles dropped, shutting down");
                        session.shutdown().await;
                        break;
                    }
                    Some(input) => handle_input(&mut session, input),
                }
            }

            reply = session.next_engine_reply() => {
                if let Err(e) = session.on_engine_reply(reply) {
                    tracing::debug!("Engine reply ended in fault: {}", e);
                }
            }
        }
    }

    tracing::info!("Session actor exited");
}

fn handle_input<R, B>(session: &mut GameSession<R, B>, input: SessionInput)
where
    R: RulesEngine,
    B: Board,
{
    let result = match input {
        SessionInput::Raw(raw) => session.handle_raw(raw),
        SessionInput::Promotion(choice) => session.on_promotion_choice(choice),
        SessionInput::NewGame => session.new_game(),
        SessionInput::GetSnapshot { reply } => {
            let _ = reply.send(session.snapshot());
            Ok(())
        }
        SessionInput::Subscribe { reply } => {
            let _ = reply.send((session.snapshot(), session.subscribe()));
            Ok(())
        }
        SessionInput::Shutdown { .. } => Ok(()),
    };

    if let Err(e) = result {
        tracing::debug!("Input ended in fault: {}", e);
    }
}
