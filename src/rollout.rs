//! Monte Carlo estimates for positions at the search horizon

use rand::Rng;

use crate::{bitboard::Position, WIDTH};

/// Plays uniformly random legal moves until the game is over, returning the final position
pub fn random_playout<R: Rng + ?Sized>(position: &Position, rng: &mut R) -> Position {
    let mut position = *position;
    let mut columns = [0; WIDTH];

    while !position.is_terminal() {
        let mut count = 0;
        for column in 0..WIDTH {
            if position.is_valid_move(column) {
                columns[count] = column;
                count += 1;
            }
        }
        // a position still in play always has a free column
        position = position.apply_move(columns[rng.random_range(0..count)]);
    }
    position
}

/// Estimates whether `position` favours the side to move
///
/// Every legal move is followed by `playouts` random games. The results are summed
/// from the point of view of the side to move, and the sign of the best move's sum
/// is returned: `1` if it tends to win, `-1` if it tends to lose, `0` otherwise.
pub fn monte_carlo<R: Rng + ?Sized>(position: &Position, playouts: u32, rng: &mut R) -> i32 {
    let perspective = position.side_to_move().sign() as i64;

    let mut best: Option<i64> = None;
    for (_column, child) in position.list_moves() {
        let mut total = 0i64;
        for _ in 0..playouts {
            total += random_playout(&child, rng).outcome() as i64 * perspective;
        }
        best = Some(best.map_or(total, |best| best.max(total)));
    }

    best.map_or(0, |best| best.signum() as i32)
}
