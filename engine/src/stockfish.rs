use crate::uci::{format_go_command, parse_uci_message, UciMessage};
use crate::{EngineCommand, EngineError, EngineEvent, GoParams, SearchEngine, MAX_STRENGTH};
use async_trait::async_trait;
use cozy_chess::Move;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Child;
use tokio::sync::mpsc;

/// A Stockfish child process driven over UCI.
pub struct StockfishEngine {
    process: Child,
    command_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
    strength: Option<u8>,
}

/// Configuration for engine performance tuning.
#[derive(Debug, Clone, Default)]
pub struct StockfishConfig {
    /// Explicit binary path; well-known locations are searched when unset.
    pub path: Option<PathBuf>,
    pub strength: Option<u8>,
}

/// Stockfish's own "Skill Level" option runs 0..=20.
fn skill_for_strength(strength: u8) -> u8 {
    strength.min(MAX_STRENGTH)
}

impl StockfishEngine {
    /// Spawn a new Stockfish instance with full configuration.
    #[tracing::instrument(level = "info")]
    pub async fn spawn_with_config(config: StockfishConfig) -> Result<Self, EngineError> {
        let path = match config.path.clone() {
            Some(path) => path,
            None => find_stockfish_path()
                .ok_or_else(|| EngineError::Spawn("Stockfish not found".to_string()))?,
        };
        tracing::info!("Found Stockfish at: {:?}", path);

        let mut process = tokio::process::Command::new(&path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                tracing::error!("Failed to spawn Stockfish: {}", e);
                EngineError::Spawn(e.to_string())
            })?;

        let mut stdin = process
            .stdin
            .take()
            .ok_or_else(|| EngineError::Spawn("Failed to get stdin".to_string()))?;
        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| EngineError::Spawn("Failed to get stdout".to_string()))?;

        write_line(&mut stdin, "uci\n").await?;

        let (command_tx, mut command_rx) = mpsc::channel::<EngineCommand>(32);
        let (event_tx, mut event_rx) = mpsc::channel::<EngineEvent>(32);

        // Output reader task
        tokio::spawn(async move {
            let mut reader = BufReader::new(stdout);
            let mut line = String::new();

            loop {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) => {
                        tracing::warn!("Stockfish stdout EOF - engine closed");
                        break;
                    }
                    Ok(_) => {
                        let trimmed = line.trim();
                        tracing::trace!("UCI << {}", trimmed);

                        let event = match parse_uci_message(trimmed) {
                            Ok(UciMessage::UciOk) | Ok(UciMessage::ReadyOk) => EngineEvent::Ready,
                            Ok(UciMessage::BestMove { mv, .. }) => {
                                tracing::info!("Received bestmove: {:?}", mv);
                                EngineEvent::BestMove(mv)
                            }
                            Ok(UciMessage::NoBestMove) => EngineEvent::NoMove,
                            Ok(UciMessage::Info(info)) => EngineEvent::Info(info),
                            Ok(UciMessage::Id { .. }) => continue,
                            Err(_) => {
                                tracing::trace!("Ignoring UCI line: {}", trimmed);
                                continue;
                            }
                        };

                        if event_tx.send(event).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::error!("Error reading from Stockfish stdout: {}", e);
                        break;
                    }
                }
            }
            tracing::info!("Output reader task exiting");
        });

        let wait_result = tokio::time::timeout(std::time::Duration::from_secs(10), async {
            while let Some(event) = event_rx.recv().await {
                if matches!(event, EngineEvent::Ready) {
                    return Ok(());
                }
            }
            Err(EngineError::Spawn(
                "Engine closed before sending uciok".to_string(),
            ))
        })
        .await;

        match wait_result {
            Ok(Ok(())) => tracing::debug!("Received uciok, engine ready"),
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                tracing::error!("Timeout waiting for uciok");
                return Err(EngineError::Spawn(
                    "Timeout waiting for engine to respond".to_string(),
                ));
            }
        }

        if let Some(strength) = config.strength {
            let skill = skill_for_strength(strength);
            write_line(&mut stdin, &format!("setoption name Skill Level value {}\n", skill))
                .await?;
        }
        write_line(&mut stdin, "isready\n").await?;

        // Command processor task: owns stdin from here on
        tokio::spawn(async move {
            while let Some(cmd) = command_rx.recv().await {
                let line = match cmd {
                    EngineCommand::SetPosition { ref fen } => {
                        tracing::debug!("Setting position: FEN={}", fen);
                        format!("position fen {}\n", fen)
                    }
                    EngineCommand::SetOption { ref name, ref value } => match value {
                        Some(val) => format!("setoption name {} value {}\n", name, val),
                        None => format!("setoption name {}\n", name),
                    },
                    EngineCommand::Go(ref params) => format_go_command(params),
                    EngineCommand::Quit => {
                        let _ = write_line(&mut stdin, "quit\n").await;
                        break;
                    }
                };

                if let Err(e) = write_line(&mut stdin, &line).await {
                    tracing::error!("Failed to write to engine: {}", e);
                    break;
                }
            }
            tracing::info!("Command processor task exiting");
        });

        tracing::info!("Stockfish engine spawned and initialized successfully");
        Ok(Self {
            process,
            command_tx,
            event_rx,
            strength: config.strength,
        })
    }

    /// Send a command to the engine
    pub async fn send_command(&self, cmd: EngineCommand) -> Result<(), EngineError> {
        tracing::debug!("Queueing command: {:?}", cmd);
        self.command_tx
            .send(cmd)
            .await
            .map_err(|_| EngineError::Unavailable("engine command channel closed".to_string()))
    }

    /// Receive an event from the engine
    pub async fn recv_event(&mut self) -> Option<EngineEvent> {
        self.event_rx.recv().await
    }
}

#[async_trait]
impl SearchEngine for StockfishEngine {
    async fn set_strength(&mut self, level: u8) -> Result<(), EngineError> {
        if self.strength == Some(level) {
            return Ok(());
        }
        tracing::info!("Setting skill level for strength {}", level);
        self.send_command(EngineCommand::SetOption {
            name: "Skill Level".to_string(),
            value: Some(skill_for_strength(level).to_string()),
        })
        .await?;
        self.strength = Some(level);
        Ok(())
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn request_move(&mut self, fen: &str, strength: u8) -> Result<Move, EngineError> {
        self.set_strength(strength).await?;
        self.send_command(EngineCommand::SetPosition {
            fen: fen.to_string(),
        })
        .await?;
        self.send_command(EngineCommand::Go(GoParams::for_strength(strength)))
            .await?;

        loop {
            match self.recv_event().await {
                Some(EngineEvent::BestMove(mv)) => return Ok(mv),
                Some(EngineEvent::NoMove) => return Err(EngineError::NoLegalMoves),
                Some(EngineEvent::Info(info)) => {
                    tracing::trace!(depth = ?info.depth, score = ?info.score, "search progress");
                }
                Some(EngineEvent::Ready) => {}
                None => {
                    return Err(EngineError::Unavailable(
                        "engine output closed".to_string(),
                    ))
                }
            }
        }
    }

    async fn shutdown(&mut self) {
        tracing::info!("Shutting down Stockfish");
        let _ = self.send_command(EngineCommand::Quit).await;
        let _ = tokio::time::timeout(std::time::Duration::from_secs(1), self.process.wait()).await;
        let _ = self.process.kill().await;
    }
}

async fn write_line(stdin: &mut tokio::process::ChildStdin, line: &str) -> Result<(), EngineError> {
    tracing::trace!("UCI >> {}", line.trim());
    stdin
        .write_all(line.as_bytes())
        .await
        .map_err(|e| EngineError::Unavailable(format!("Failed to write to stdin: {}", e)))?;
    stdin
        .flush()
        .await
        .map_err(|e| EngineError::Unavailable(format!("Failed to flush: {}", e)))
}

/// Find Stockfish executable in common locations
fn find_stockfish_path() -> Option<PathBuf> {
    let paths = [
        "/usr/local/bin/stockfish",
        "/usr/bin/stockfish",
        "/opt/homebrew/bin/stockfish",
        "/usr/games/stockfish",
        "stockfish", // In PATH
    ];

    paths
        .into_iter()
        .filter(|p| Path::new(p).exists() || *p == "stockfish")
        .find(|p| std::process::Command::new(p).arg("--help").output().is_ok())
        .map(PathBuf::from)
}
