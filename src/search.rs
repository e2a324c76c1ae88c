//! An agent to choose Connect 4 moves
//!
//! The agent searches a fixed number of plies with negamax and alpha-beta pruning.
//! Finished games are scored exactly; positions at the horizon are estimated with
//! random playouts (see [`crate::rollout`]).

use log::{debug, trace};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;

use crate::{
    bitboard::Position, canonical::CanonicalKey, rollout::monte_carlo, transposition_table::*,
};

/// Score of a win found with no search depth remaining
///
/// Wins found earlier in the tree score a multiple of this. Monte Carlo estimates
/// are always smaller in magnitude.
pub const WIN_SCORE: i32 = 1_000;

/// Bound of the search window, safe to negate
pub const INFINITY: i32 = i32::MAX;

/// Tuning of the search
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SearchConfig {
    /// plies searched below each candidate move before falling back to playouts
    pub depth: u8,
    /// random games per legal move at each horizon position
    pub playouts: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            depth: 3,
            playouts: 1000,
        }
    }
}

/// A chosen move and its evaluation
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Decision {
    pub column: usize,
    /// the position after the move
    pub position: Position,
    /// score for the player making the move
    pub score: i32,
}

/// An agent to play Connect 4 positions
///
/// # Position Scoring
/// Scores are relative to the side to move. A position where the side to move has
/// already lost scores `-WIN_SCORE * (depth + 1)`, so wins found closer to the root
/// score higher and losses found closer to the root score lower. A draw scores 0.
/// Horizon positions score `-1`, `0` or `1` from their Monte Carlo estimate.
#[derive(Clone)]
pub struct Searcher<C: Cache = TranspositionTable> {
    config: SearchConfig,
    cache: C,
    rng: Xoshiro256PlusPlus,

    /// The number of nodes searched by this `Searcher` so far (for diagnostics only)
    pub node_count: usize,
}

impl Searcher<TranspositionTable> {
    /// Creates a new `Searcher` with an empty transposition table and a random seed
    pub fn new(config: SearchConfig) -> Self {
        Self::with_cache(config, TranspositionTable::new())
    }

    /// Creates a new `Searcher` with an empty transposition table and reproducible playouts
    pub fn with_seed(config: SearchConfig, seed: u64) -> Self {
        Self::with_cache_and_seed(config, TranspositionTable::new(), seed)
    }
}

impl<C: Cache> Searcher<C> {
    /// Creates a new `Searcher` with a given cache and a random seed
    pub fn with_cache(config: SearchConfig, cache: C) -> Self {
        Self {
            config,
            cache,
            rng: Xoshiro256PlusPlus::from_rng(&mut rand::rng()),
            node_count: 0,
        }
    }

    /// Creates a new `Searcher` with a given cache and reproducible playouts
    pub fn with_cache_and_seed(config: SearchConfig, cache: C, seed: u64) -> Self {
        Self {
            config,
            cache,
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
            node_count: 0,
        }
    }

    pub fn config(&self) -> SearchConfig {
        self.config
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut C {
        &mut self.cache
    }

    pub fn into_cache(self) -> C {
        self.cache
    }

    /// Performs game tree search
    ///
    /// Returns the score of `position` (see [Position Scoring]). The result is exact
    /// when it lies strictly inside `(alpha, beta)`; otherwise it is a bound on the
    /// exact score on the failing side.
    ///
    /// [Position Scoring]: #position-scoring
    pub fn search(&mut self, position: &Position, depth: u8, mut alpha: i32, mut beta: i32) -> i32 {
        self.node_count += 1;

        let key = CanonicalKey::of(position);
        if let Some(entry) = self.cache.get(&key) {
            if entry.depth >= depth {
                match entry.bound {
                    Bound::Exact => return entry.score,
                    Bound::Lower => alpha = alpha.max(entry.score),
                    Bound::Upper => beta = beta.min(entry.score),
                }
                // the stored bound already decides this window
                if alpha >= beta {
                    return entry.score;
                }
            }
        }

        if position.is_terminal() {
            return match position.winner() {
                // the winner is always the previous player
                Some(_) => -WIN_SCORE * (depth as i32 + 1),
                None => 0,
            };
        }

        if depth == 0 {
            let score = monte_carlo(position, self.config.playouts, &mut self.rng);
            self.cache.set(key, Entry::new(score, 0, Bound::Exact));
            return score;
        }

        let window_alpha = alpha;
        let mut best = -INFINITY;
        for (_column, child) in position.list_moves() {
            // the search window is flipped for the other player
            let score = -self.search(&child, depth - 1, -beta, -alpha);
            best = best.max(score);
            alpha = alpha.max(best);
            // a perfect opponent will not allow this branch
            if best >= beta {
                break;
            }
        }

        let bound = if best <= window_alpha {
            Bound::Upper
        } else if best >= beta {
            Bound::Lower
        } else {
            Bound::Exact
        };
        self.cache.set(key, Entry::new(best, depth, bound));
        best
    }

    /// Chooses the best move of `position`, or `None` if the game is over
    ///
    /// Ties go to the lowest column.
    pub fn make_best_move(&mut self, position: &Position) -> Option<Decision> {
        if position.is_terminal() {
            return None;
        }
        let depth = self.config.depth;

        let mut best: Option<Decision> = None;
        for (column, child) in position.list_moves() {
            let alpha = best.map_or(-INFINITY, |best| best.score);
            let score = -self.search(&child, depth, -INFINITY, -alpha);
            trace!("column {}: {}", column + 1, score);

            if best.map_or(true, |best| score > best.score) {
                best = Some(Decision {
                    column,
                    position: child,
                    score,
                });
            }
        }

        if let Some(decision) = best {
            debug!(
                "best move {} scoring {} after {} nodes",
                decision.column + 1,
                decision.score,
                self.node_count
            );
        }
        best
    }
}

impl Searcher<SharedTranspositionTable> {
    /// Chooses the best move like [`Searcher::make_best_move`], searching the
    /// candidate moves on the rayon thread pool
    ///
    /// Every candidate gets its own playout generator seeded from this searcher's,
    /// and all of them share the transposition table.
    pub fn make_best_move_parallel(&mut self, position: &Position) -> Option<Decision> {
        if position.is_terminal() {
            return None;
        }
        let depth = self.config.depth;

        let tasks: Vec<(usize, Position, Self)> = position
            .list_moves()
            .map(|(column, child)| {
                let seed = self.rng.random::<u64>();
                let searcher = Self::with_cache_and_seed(self.config, self.cache.clone(), seed);
                (column, child, searcher)
            })
            .collect();

        // collect keeps the column order for tie-breaking
        let results: Vec<(Decision, usize)> = tasks
            .into_par_iter()
            .map(|(column, child, mut searcher)| {
                let score = -searcher.search(&child, depth, -INFINITY, INFINITY);
                let decision = Decision {
                    column,
                    position: child,
                    score,
                };
                (decision, searcher.node_count)
            })
            .collect();

        let mut best: Option<Decision> = None;
        for (decision, node_count) in results {
            self.node_count += node_count;
            trace!("column {}: {}", decision.column + 1, decision.score);
            if best.map_or(true, |best| decision.score > best.score) {
                best = Some(decision);
            }
        }

        if let Some(decision) = best {
            debug!(
                "best move {} scoring {} after {} nodes",
                decision.column + 1,
                decision.score,
                self.node_count
            );
        }
        best
    }
}
