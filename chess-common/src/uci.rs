//! UCI move notation and castling conversion.
//!
//! UCI writes castling as the king moving two squares (e1g1). cozy-chess
//! encodes it as the king capturing its own rook (e1h1). Everything that
//! leaves or enters the rules adapter goes through these helpers.

use cozy_chess::{File, Move, Rank, Square};

use crate::converters::{format_piece, format_square, parse_piece, parse_square};

/// Convert a UCI castling move (e1g1) to cozy-chess notation (e1h1).
///
/// Only converts when the king-takes-rook form is present in `legal_moves`;
/// anything else is returned unchanged.
pub fn convert_uci_castling_to_cozy(mv: Move, legal_moves: &[Move]) -> Move {
    let is_back_rank = matches!(mv.from.rank(), Rank::First | Rank::Eighth);
    let is_e_file = matches!(mv.from.file(), File::E);
    let is_g_or_c_file = matches!(mv.to.file(), File::G | File::C);

    let same_rank = mv.from.rank() == mv.to.rank();

    if is_back_rank && is_e_file && is_g_or_c_file && same_rank && mv.promotion.is_none() {
        let rook_file = if mv.to.file() == File::G { File::H } else { File::A };
        let converted = Move {
            from: mv.from,
            to: Square::new(rook_file, mv.from.rank()),
            promotion: None,
        };
        if legal_moves.contains(&converted) {
            return converted;
        }
    }

    mv
}

/// Convert a cozy-chess castling move (e1h1) back to UCI notation (e1g1).
///
/// `is_castle` tells whether the move is a king taking its own rook; the
/// caller knows the board, this module does not.
pub fn convert_cozy_castling_to_uci(mv: Move, is_castle: bool) -> Move {
    if !is_castle {
        return mv;
    }
    let king_file = if (mv.to.file() as u8) > (mv.from.file() as u8) {
        File::G
    } else {
        File::C
    };
    Move {
        from: mv.from,
        to: Square::new(king_file, mv.from.rank()),
        promotion: None,
    }
}

/// Format a move in UCI notation ("e2e4", "e7e8q").
pub fn format_uci_move(mv: Move) -> String {
    let mut s = format!("{}{}", format_square(mv.from), format_square(mv.to));
    if let Some(promo) = mv.promotion {
        s.push(format_piece(promo));
    }
    s
}

/// Parse a UCI move string. Returns `None` for anything malformed.
pub fn parse_uci_move(s: &str) -> Option<Move> {
    if !(s.len() == 4 || s.len() == 5) || !s.is_ascii() {
        return None;
    }
    let from = parse_square(&s[0..2])?;
    let to = parse_square(&s[2..4])?;
    let promotion = match s[4..].chars().next() {
        Some(c) => Some(parse_piece(c)?),
        None => None,
    };
    Some(Move { from, to, promotion })
}
