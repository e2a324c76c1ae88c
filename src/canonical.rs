//! Mirror symmetry of the board
//!
//! A position and its horizontal mirror image have the same value, so the cache
//! stores both under one [`CanonicalKey`].

use crate::{bitboard::Position, HEIGHT, WIDTH};

// one column of a mask, sentinel included
const COLUMN_GROUP: u64 = (1 << (HEIGHT + 1)) - 1;

/// Reflects a tile mask so that column `c` becomes column `WIDTH - 1 - c`
pub const fn mirror(mask: u64) -> u64 {
    let mut mirrored = 0;
    let mut column = 0;
    while column < WIDTH {
        let group = (mask >> (column * (HEIGHT + 1))) & COLUMN_GROUP;
        mirrored |= group << ((WIDTH - 1 - column) * (HEIGHT + 1));
        column += 1;
    }
    mirrored
}

/// Cache identity of a position under mirror symmetry
///
/// Both masks always come from the same orientation: the key is the smaller of
/// `(p1, p2)` and `(mirror(p1), mirror(p2))`. Taking `min(mask, mirror(mask))` of
/// each player separately is not done on purpose, as it gives positions like `12`
/// and `16` the same key although they are not mirror images.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalKey {
    player_one_mask: u64,
    player_two_mask: u64,
}

impl CanonicalKey {
    pub fn of(position: &Position) -> Self {
        Self::from_masks(position.player_one_mask(), position.player_two_mask())
    }

    pub fn from_masks(player_one_mask: u64, player_two_mask: u64) -> Self {
        let original = (player_one_mask, player_two_mask);
        let mirrored = (mirror(player_one_mask), mirror(player_two_mask));
        let (player_one_mask, player_two_mask) = original.min(mirrored);
        Self {
            player_one_mask,
            player_two_mask,
        }
    }

    /// Canonical keys are fixed points of this function
    pub fn canonicalize(self) -> Self {
        Self::from_masks(self.player_one_mask, self.player_two_mask)
    }

    pub fn player_one_mask(&self) -> u64 {
        self.player_one_mask
    }

    pub fn player_two_mask(&self) -> u64 {
        self.player_two_mask
    }
}

impl From<&Position> for CanonicalKey {
    fn from(position: &Position) -> Self {
        Self::of(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mirror_swaps_outer_columns() {
        let left = Position::bottom_mask(0) | (Position::bottom_mask(0) << 1);
        let right = Position::bottom_mask(WIDTH - 1) | (Position::bottom_mask(WIDTH - 1) << 1);
        assert_eq!(mirror(left), right);
        assert_eq!(mirror(right), left);
    }

    #[test]
    fn mirror_is_an_involution() {
        let mask = 0b1010011_0000111_0000001_0110000_0000000_0011111_0000101;
        assert_eq!(mirror(mirror(mask)), mask);
    }

    #[test]
    fn middle_column_is_fixed() {
        let middle = Position::column_mask(WIDTH / 2);
        assert_eq!(mirror(middle), middle);
    }
}
