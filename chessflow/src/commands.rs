//! Parsing of the line-based commands typed at the board prompt.

use chess::{parse_square, PieceKind};
use cozy_chess::Square;

/// One line of user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `e2`: pick up the piece on a square and show where it can go.
    Select(Square),
    /// `e2e4`, optionally with a promotion letter (`e7e8q`).
    Move {
        from: Square,
        to: Square,
        promotion: Option<PieceKind>,
    },
    /// `q`, `r`, `b` or `n` while the promotion prompt is open.
    Promote(PieceKind),
    Cancel,
    NewGame,
    Status,
    Help,
    Quit,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("empty input")]
    Empty,
    #[error("unrecognised command '{0}' (type 'help')")]
    Unrecognised(String),
}

pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let input = line.trim().to_ascii_lowercase();
    match input.as_str() {
        "" => return Err(CommandError::Empty),
        "cancel" | "c" => return Ok(Command::Cancel),
        "new" => return Ok(Command::NewGame),
        "status" | "s" => return Ok(Command::Status),
        "help" | "h" | "?" => return Ok(Command::Help),
        "quit" | "exit" => return Ok(Command::Quit),
        _ => {}
    }

    if input.len() == 1 {
        return input
            .chars()
            .next()
            .and_then(PieceKind::from_char)
            .filter(|kind| kind.is_promotion_target())
            .map(Command::Promote)
            .ok_or(CommandError::Unrecognised(input.clone()));
    }

    let unrecognised = || CommandError::Unrecognised(input.clone());
    match input.len() {
        2 => parse_square(&input).map(Command::Select).ok_or_else(unrecognised),
        4 | 5 => {
            let from = input.get(0..2).and_then(parse_square).ok_or_else(unrecognised)?;
            let to = input.get(2..4).and_then(parse_square).ok_or_else(unrecognised)?;
            let promotion = match input.chars().nth(4) {
                None => None,
                Some(c) => Some(
                    PieceKind::from_char(c)
                        .filter(|kind| kind.is_promotion_target())
                        .ok_or_else(unrecognised)?,
                ),
            };
            Ok(Command::Move {
                from,
                to,
                promotion,
            })
        }
        _ => Err(unrecognised()),
    }
}

pub const HELP: &str = "\
Commands:
  e2        select the piece on e2 and mark its moves
  e2e4      move (append q/r/b/n to promote, e.g. e7e8q)
  q r b n   answer the promotion prompt
  cancel    drop the selection or the promotion prompt
  new       start a new game at the current level
  status    show the session state
  quit      leave";
