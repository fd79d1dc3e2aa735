//! chessflow: play chess against an adaptive engine from the terminal.
//!
//! The binary is a thin host around a `chess_session` actor:
//!
//! 1. Picks an opponent (`--engine stockfish`, falling back to the random
//!    mover when no Stockfish binary can be started, or `--engine random`).
//! 2. Draws the board on stdout through [`terminal_board::TerminalBoard`].
//! 3. Turns each line typed on stdin into board events for the session.
//!
//! Logs go to a daily rolling file under `CHESSFLOW_LOG_DIR` (default
//! `logs/`) since stdout is the board.

use std::time::Instant;

use anyhow::Context;
use chess::{Game, PlayerSide};
use chess_session::{
    config, spawn_session, DifficultyLevel, GameSession, PendingInteraction, PromotionChoice,
    RawInput, SessionConfig, SessionEvent, SessionHandle,
};
use clap::{Parser, ValueEnum};
use engine::{
    EngineBridge, EngineError, EngineFactory, EngineFuture, RandomMover, SearchEngine,
    StockfishConfig, StockfishEngine,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod terminal_board;

use commands::{parse_command, Command, CommandError};
use terminal_board::TerminalBoard;

/// Command-line arguments. Flags override the `CHESSFLOW_*` environment.
#[derive(Parser)]
#[command(name = "chessflow", about = "Play chess against an engine that adapts to you")]
struct Cli {
    /// Opponent to play against.
    #[arg(long, value_enum, default_value_t = EngineKind::Stockfish)]
    engine: EngineKind,

    /// Starting difficulty, 1 to 20.
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=20))]
    level: Option<u8>,

    /// Side you play: white or black.
    #[arg(long)]
    side: Option<PlayerSide>,

    /// Seed for the random opponent, for replayable games.
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EngineKind {
    Stockfish,
    Random,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = init_logging()?;

    let mut session_config = SessionConfig::from_env();
    if let Some(level) = cli.level {
        session_config.start_level = DifficultyLevel::new(level);
    }
    if let Some(side) = cli.side {
        session_config.human_side = side;
    }
    tracing::info!(?session_config, engine = ?cli.engine, "chessflow starting up");

    let bridge = spawn_engine(&cli, session_config.start_level.get()).await;
    let board = TerminalBoard::stdout(session_config.human_side);
    let session = GameSession::new(session_config, Game::new(), board, bridge)
        .context("failed to start the first game")?;
    let handle = spawn_session(session);

    let (_, events) = handle.subscribe().await?;
    tokio::spawn(report_events(events));

    println!("You play {}. Type 'help' for commands.", session_config.human_side);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_command(&line) {
            Ok(Command::Quit) => break,
            Ok(command) => dispatch(&handle, command).await?,
            Err(CommandError::Empty) => {}
            Err(e) => println!("{}", e),
        }
    }

    handle.shutdown().await.ok();
    tracing::info!("chessflow shutting down");
    Ok(())
}

fn init_logging() -> anyhow::Result<tracing_appender::non_blocking::WorkerGuard> {
    let log_dir = config::get_log_dir();
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("cannot create log directory {}", log_dir.display()))?;
    let file_appender = tracing_appender::rolling::daily(&log_dir, "chessflow");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    Ok(guard)
}

/// Start the requested opponent on its worker task. The bridge can restart
/// the same kind of opponent when a game is abandoned mid-search.
async fn spawn_engine(cli: &Cli, level: u8) -> EngineBridge {
    if let EngineKind::Stockfish = cli.engine {
        let stockfish_config = StockfishConfig {
            path: config::get_stockfish_path(),
            strength: Some(level),
        };
        match StockfishEngine::spawn_with_config(stockfish_config.clone()).await {
            Ok(engine) => {
                return EngineBridge::spawn(engine, level)
                    .with_restart(stockfish_factory(stockfish_config))
            }
            Err(e) => {
                tracing::warn!("Stockfish unavailable, using random mover: {}", e);
                println!("Stockfish unavailable ({}); playing the random mover instead.", e);
            }
        }
    }

    EngineBridge::spawn(random_mover(cli.seed), level).with_restart(random_factory(cli.seed))
}

fn random_mover(seed: Option<u64>) -> RandomMover<rand::rngs::StdRng> {
    match seed {
        Some(seed) => RandomMover::seeded(seed),
        None => RandomMover::from_entropy(),
    }
}

fn stockfish_factory(stockfish_config: StockfishConfig) -> EngineFactory {
    Box::new(move || -> EngineFuture {
        let stockfish_config = stockfish_config.clone();
        Box::pin(async move {
            let engine = StockfishEngine::spawn_with_config(stockfish_config).await?;
            Ok::<_, EngineError>(Box::new(engine) as Box<dyn SearchEngine>)
        })
    })
}

/// Each restart of a seeded mover gets the next seed, so a session replays.
fn random_factory(seed: Option<u64>) -> EngineFactory {
    let mut restarts = 0u64;
    Box::new(move || -> EngineFuture {
        restarts += 1;
        let mover = random_mover(seed.map(|s| s.wrapping_add(restarts)));
        Box::pin(async move { Ok::<_, EngineError>(Box::new(mover) as Box<dyn SearchEngine>) })
    })
}

/// Translate one command into session inputs, the way a pointer on a board
/// would have produced them.
async fn dispatch(handle: &SessionHandle, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Select(square) => {
            handle
                .send_raw(RawInput::MoveInputStarted {
                    square,
                    at: Instant::now(),
                })
                .await?;
        }
        Command::Move {
            from,
            to,
            promotion,
        } => {
            handle
                .send_raw(RawInput::MoveInputStarted {
                    square: from,
                    at: Instant::now(),
                })
                .await?;
            handle
                .send_raw(RawInput::ValidateMoveInput {
                    from,
                    to,
                    at: Instant::now(),
                })
                .await?;
            if let Some(kind) = promotion {
                handle.choose_promotion(PromotionChoice::Piece(kind)).await?;
            }
        }
        Command::Promote(kind) => {
            handle.choose_promotion(PromotionChoice::Piece(kind)).await?;
        }
        Command::Cancel => {
            let snapshot = handle.snapshot().await?;
            if snapshot.pending == PendingInteraction::AwaitingPromotionChoice {
                handle.choose_promotion(PromotionChoice::Cancelled).await?;
            } else {
                handle
                    .send_raw(RawInput::MoveInputCanceled { at: Instant::now() })
                    .await?;
            }
        }
        Command::NewGame => handle.new_game().await?,
        Command::Status => {
            let snapshot = handle.snapshot().await?;
            println!(
                "{} | {} to move | level {} (~{} Elo) | {}",
                snapshot.status,
                snapshot.side_to_move,
                snapshot.level,
                snapshot.estimated_rating,
                snapshot.fen
            );
        }
        Command::Help => println!("{}", commands::HELP),
        Command::Quit => {}
    }
    Ok(())
}

async fn report_events(mut events: broadcast::Receiver<SessionEvent>) {
    loop {
        match events.recv().await {
            Ok(SessionEvent::GameOver {
                outcome,
                level,
                estimated_rating,
                ..
            }) => {
                println!(
                    "Game over: {}. Next game at level {} (~{} Elo). Type 'new' to play again.",
                    outcome, level, estimated_rating
                );
            }
            Ok(SessionEvent::Fatal(message)) => {
                println!("The game cannot continue: {}. Type 'new' to start over.", message);
            }
            Ok(SessionEvent::PositionChanged(_)) => {}
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Event reporter lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
