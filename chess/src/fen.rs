use cozy_chess::Board;

/// Parse a FEN string into a Board
pub fn parse_fen(fen: &str) -> Result<Board, FenError> {
    let fields = fen.split_whitespace().count();
    if fields == 0 {
        return Err(FenError::InvalidFormat);
    }
    if fields != 6 {
        return Err(FenError::WrongFieldCount(fields));
    }

    fen.parse().map_err(|_| FenError::InvalidBoardLayout)
}

/// Format a Board as a FEN string
pub fn format_fen(board: &Board) -> String {
    board.to_string()
}

#[derive(Debug, thiserror::Error)]
pub enum FenError {
    #[error("Invalid FEN format")]
    InvalidFormat,
    #[error("Expected 6 FEN fields, found {0}")]
    WrongFieldCount(usize),
    #[error("Invalid board layout")]
    InvalidBoardLayout,
}
