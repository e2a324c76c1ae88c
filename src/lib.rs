//! An agent for playing the board game 'Connect 4'
//!
//! Moves are chosen with a depth-limited negamax search with alpha-beta pruning.
//! Where the search runs out of depth, positions are estimated by playing random
//! games to the end.
//!
//! # Basic Usage
//!
//! ```
//! use connect4_engine::{bitboard::Position, search::{SearchConfig, Searcher}};
//!
//!# use std::error::Error;
//!# fn main() -> Result<(), Box<dyn Error>> {
//! // player 1 has three tiles stacked in the first column
//! let position = Position::from_moves("141414")?;
//! let mut searcher = Searcher::with_seed(SearchConfig { depth: 2, playouts: 20 }, 7);
//! let decision = searcher.make_best_move(&position).unwrap();
//!
//! assert_eq!(decision.column, 0);
//! assert!(decision.position.is_win_for_last_mover());
//!# Ok(())
//!# }
//! ```

use static_assertions::*;
pub use anyhow;

pub mod bitboard;

pub mod canonical;

pub mod transposition_table;

pub mod rollout;

pub mod search;

pub mod table;

mod test;

pub use bitboard::{Player, Position};
pub use canonical::CanonicalKey;
pub use search::{Decision, SearchConfig, Searcher};
pub use table::{load_table, parse_table, save_table, serialize_table, TableError};
pub use transposition_table::{Cache, SharedTranspositionTable, TranspositionTable};

/// The width of the game board in tiles
pub const WIDTH: usize = 7;

/// The height of the game board in tiles
pub const HEIGHT: usize = 6;

// ensure that the given dimensions fit in a u64 for the bitboard representation
const_assert!(WIDTH * (HEIGHT + 1) < 64);
