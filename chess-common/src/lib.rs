//! Shared square, piece and UCI notation helpers.
//!
//! Used by the rules adapter, the search-engine bridge and the terminal host
//! so that all of them agree on how moves are spelled on the wire.

pub mod converters;
pub mod uci;

pub use converters::*;
pub use uci::*;
