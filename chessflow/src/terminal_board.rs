//! Text rendering of the board for a line-based terminal.

use std::io::Write;

use chess::{DisplayBoard, PlayerSide, Position};
use chess_session::Board;
use cozy_chess::{Move, Square};

/// Draws the board to `out` whenever something visible changes.
///
/// There is no pointer on a terminal: enabling input prints the prompt line
/// and disabling it prints nothing.
pub struct TerminalBoard<W> {
    out: W,
    perspective: PlayerSide,
    position: Position,
    markers: Vec<Square>,
}

impl TerminalBoard<std::io::Stdout> {
    pub fn stdout(perspective: PlayerSide) -> Self {
        Self::new(std::io::stdout(), perspective)
    }
}

impl<W: Write + Send> TerminalBoard<W> {
    pub fn new(out: W, perspective: PlayerSide) -> Self {
        Self {
            out,
            perspective,
            position: Position::starting(),
            markers: Vec::new(),
        }
    }

    #[cfg(test)]
    fn output(&self) -> &W {
        &self.out
    }

    fn redraw(&mut self) {
        let text = match DisplayBoard::from_position(&self.position) {
            Ok(board) => board.render(self.perspective, &self.markers),
            Err(e) => {
                tracing::error!("Cannot draw position {}: {}", self.position, e);
                return;
            }
        };
        self.print(&text);
    }

    fn print(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "{}", text).and_then(|_| self.out.flush()) {
            tracing::warn!("Terminal write failed: {}", e);
        }
    }
}

impl<W: Write + Send> Board for TerminalBoard<W> {
    fn set_position(&mut self, position: &Position, _animate: bool) {
        self.position = position.clone();
        self.markers.clear();
        self.redraw();
    }

    fn enable_input(&mut self, side: PlayerSide) {
        self.print(&format!("{} to move:", side));
    }

    fn disable_input(&mut self) {}

    fn show_legal_move_markers(&mut self, moves: &[Move]) {
        self.markers = moves.iter().map(|mv| mv.to).collect();
        self.redraw();
    }

    fn clear_legal_move_markers(&mut self) {
        if !self.markers.is_empty() {
            self.markers.clear();
            self.redraw();
        }
    }

    fn clear_transient_markers(&mut self) {}

    fn prompt_promotion(&mut self, square: Square, side: PlayerSide) {
        self.print(&format!(
            "Promote the {} pawn on {}: q, r, b or n (cancel to take it back)",
            side, square
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(board: &TerminalBoard<Vec<u8>>) -> String {
        String::from_utf8(board.output().clone()).unwrap()
    }

    #[test]
    fn test_markers_are_drawn() {
        let mut board = TerminalBoard::new(Vec::new(), PlayerSide::White);
        let moves = [
            "e2e3".parse::<Move>().unwrap(),
            "e2e4".parse::<Move>().unwrap(),
        ];
        board.show_legal_move_markers(&moves);

        let out = text(&board);
        assert!(out.contains("4  .  .  .  .  *"));
        assert!(out.contains("3  .  .  .  .  *"));
    }

    #[test]
    fn test_prompts() {
        let mut board = TerminalBoard::new(Vec::new(), PlayerSide::White);
        board.enable_input(PlayerSide::White);
        board.prompt_promotion(Square::E8, PlayerSide::White);

        let out = text(&board);
        assert!(out.contains("white to move:"));
        assert!(out.contains("pawn on e8"));
    }

    #[test]
    fn test_new_position_drops_markers() {
        let mut board = TerminalBoard::new(Vec::new(), PlayerSide::White);
        board.show_legal_move_markers(&["g1f3".parse::<Move>().unwrap()]);
        board.set_position(&Position::starting(), false);
        assert!(board.markers.is_empty());
    }
}
