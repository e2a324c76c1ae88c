use anyhow::{anyhow, Result};

use std::fmt;

use crate::{canonical::mirror, HEIGHT, WIDTH};

pub(crate) mod static_masks {
    use crate::{HEIGHT, WIDTH};

    pub const fn bottom_mask() -> u64 {
        let mut mask = 0;
        let mut column = 0;
        while column < WIDTH {
            mask |= 1 << (column * (HEIGHT + 1));
            column += 1;
        }
        mask
    }
    pub const fn full_board_mask() -> u64 {
        bottom_mask() * ((1 << HEIGHT as u64) - 1)
    }
}

/// One of the two players. Player one always moves first.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Player {
    One,
    Two,
}

impl Player {
    /// `+1` for player one, `-1` for player two
    pub fn sign(self) -> i32 {
        match self {
            Player::One => 1,
            Player::Two => -1,
        }
    }

    pub fn opponent(self) -> Self {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
        }
    }

    fn index(self) -> usize {
        match self {
            Player::One => 0,
            Player::Two => 1,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Player::One => write!(f, "Player 1"),
            Player::Two => write!(f, "Player 2"),
        }
    }
}

/// An immutable Connect 4 position
///
/// Each player's tiles are a bitmap with one 7-bit group per column, bottom row
/// first. The top bit of every group is a sentinel and never set:
///
/// ```text
///  6 13 20 27 34 41 48
///  5 12 19 26 33 40 47
///  4 11 18 25 32 39 46
///  3 10 17 24 31 38 45
///  2  9 16 23 30 37 44
///  1  8 15 22 29 36 43
///  0  7 14 21 28 35 42
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Position {
    // tiles of player one and player two
    masks: [u64; 2],
    // number of tiles in each column
    heights: [u8; WIDTH],
    side_to_move: Player,
}

impl Position {
    pub fn new() -> Self {
        Self {
            masks: [0; 2],
            heights: [0; WIDTH],
            side_to_move: Player::One,
        }
    }

    /// Plays a sequence of 1-indexed column digits from the empty board, e.g. `"4453"`
    pub fn from_moves<S: AsRef<str>>(moves: S) -> Result<Self> {
        let mut position = Self::new();

        for column_char in moves.as_ref().chars() {
            match column_char.to_digit(10).map(|c| c as usize) {
                Some(column @ 1..=WIDTH) => {
                    let column = column - 1;
                    // no moves after the game is decided
                    if position.is_terminal() {
                        return Err(anyhow!("Invalid position, game is over"));
                    }
                    if !position.is_valid_move(column) {
                        return Err(anyhow!("Invalid move, column {} full", column + 1));
                    }
                    position = position.apply_move(column);
                }
                _ => return Err(anyhow!("could not parse '{}' as a valid move", column_char)),
            }
        }
        Ok(position)
    }

    /// Rebuilds a position from the tile masks of both players
    ///
    /// The side to move is derived from the tile counts.
    pub fn from_masks(player_one_mask: u64, player_two_mask: u64) -> Result<Self> {
        if player_one_mask & player_two_mask != 0 {
            return Err(anyhow!("players share tiles {:#x}", player_one_mask & player_two_mask));
        }
        let board_mask = player_one_mask | player_two_mask;
        if board_mask & !static_masks::full_board_mask() != 0 {
            return Err(anyhow!("tiles outside the board {:#x}", board_mask));
        }

        let mut heights = [0; WIDTH];
        for (column, height) in heights.iter_mut().enumerate() {
            let column_bits = (board_mask & Self::column_mask(column)) >> (column * (HEIGHT + 1));
            // tiles must be stacked from the bottom without gaps
            if column_bits & (column_bits + 1) != 0 {
                return Err(anyhow!("floating tile in column {}", column + 1));
            }
            *height = column_bits.count_ones() as u8;
        }

        let ones = player_one_mask.count_ones();
        let twos = player_two_mask.count_ones();
        let side_to_move = if ones == twos {
            Player::One
        } else if ones == twos + 1 {
            Player::Two
        } else {
            return Err(anyhow!(
                "impossible tile counts, player 1: {}, player 2: {}",
                ones,
                twos
            ));
        };

        Ok(Self {
            masks: [player_one_mask, player_two_mask],
            heights,
            side_to_move,
        })
    }

    pub fn player_one_mask(&self) -> u64 {
        self.masks[Player::One.index()]
    }

    pub fn player_two_mask(&self) -> u64 {
        self.masks[Player::Two.index()]
    }

    pub fn mask(&self, player: Player) -> u64 {
        self.masks[player.index()]
    }

    pub fn board_mask(&self) -> u64 {
        self.masks[0] | self.masks[1]
    }

    pub fn side_to_move(&self) -> Player {
        self.side_to_move
    }

    pub fn num_moves(&self) -> usize {
        self.board_mask().count_ones() as usize
    }

    /// Number of tiles in `column`
    pub fn height(&self, column: usize) -> usize {
        self.heights[column] as usize
    }

    pub fn top_mask(column: usize) -> u64 {
        1 << (column * (HEIGHT + 1) + (HEIGHT - 1))
    }

    pub fn bottom_mask(column: usize) -> u64 {
        1 << (column * (HEIGHT + 1))
    }

    pub fn column_mask(column: usize) -> u64 {
        ((1 << HEIGHT) - 1) << (column * (HEIGHT + 1))
    }

    /// Whether a tile can still be dropped into `column`
    ///
    /// # Panics
    /// If `column` is not on the board.
    pub fn is_valid_move(&self, column: usize) -> bool {
        assert!(column < WIDTH, "column {} out of range", column);
        Self::top_mask(column) & self.board_mask() == 0
    }

    /// Drops a tile for the side to move into `column`, returning the new position
    ///
    /// # Panics
    /// If `column` is off the board or already full.
    pub fn apply_move(&self, column: usize) -> Self {
        assert!(self.is_valid_move(column), "column {} is full", column);

        let mut next = *self;
        next.masks[self.side_to_move.index()] |=
            1 << (column * (HEIGHT + 1) + self.heights[column] as usize);
        next.heights[column] += 1;
        next.side_to_move = self.side_to_move.opponent();
        next
    }

    /// Iterates over `(column, position)` for every legal move, in ascending column order
    pub fn list_moves(&self) -> Moves {
        Moves {
            position: *self,
            column: 0,
        }
    }

    /// Whether the player who made the last move has four in a row
    pub fn is_win_for_last_mover(&self) -> bool {
        Self::has_alignment(self.mask(self.side_to_move.opponent()))
    }

    fn has_alignment(pos: u64) -> bool {
        // vertical, horizontal and both diagonals
        for &shift in [1, HEIGHT + 1, HEIGHT, HEIGHT + 2].iter() {
            // mark all runs of 2
            let m = pos & (pos >> shift);
            // check for runs of 2 * (runs of 2)
            if m & (m >> (2 * shift)) != 0 {
                return true;
            }
        }
        false
    }

    pub fn is_full(&self) -> bool {
        self.board_mask() == static_masks::full_board_mask()
    }

    pub fn is_draw(&self) -> bool {
        self.is_full() && !self.is_win_for_last_mover()
    }

    pub fn is_terminal(&self) -> bool {
        self.is_win_for_last_mover() || self.is_full()
    }

    /// The winner of a finished game, if any
    pub fn winner(&self) -> Option<Player> {
        if self.is_win_for_last_mover() {
            Some(self.side_to_move.opponent())
        } else {
            None
        }
    }

    /// Result of a finished game: `+1` if player one won, `-1` if player two won, `0` for a draw
    ///
    /// # Panics
    /// If the game is still in play.
    pub fn outcome(&self) -> i32 {
        assert!(self.is_terminal(), "outcome of a position still in play");
        // only the last mover can have completed an alignment
        match self.winner() {
            Some(_) => -self.side_to_move.sign(),
            None => 0,
        }
    }

    /// The horizontal mirror image of this position
    pub fn mirrored(&self) -> Self {
        let mut heights = self.heights;
        heights.reverse();
        Self {
            masks: [mirror(self.masks[0]), mirror(self.masks[1])],
            heights,
            side_to_move: self.side_to_move,
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in (0..HEIGHT).rev() {
            for column in 0..WIDTH {
                let tile = 1 << (column * (HEIGHT + 1) + row);
                let symbol = if self.player_one_mask() & tile != 0 {
                    'X'
                } else if self.player_two_mask() & tile != 0 {
                    'O'
                } else {
                    '.'
                };
                write!(f, "{}", symbol)?;
            }
            if row != 0 {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

/// Legal moves of a position, see [`Position::list_moves`]
pub struct Moves {
    position: Position,
    column: usize,
}

impl Iterator for Moves {
    type Item = (usize, Position);

    fn next(&mut self) -> Option<Self::Item> {
        while self.column < WIDTH {
            let column = self.column;
            self.column += 1;
            if self.position.is_valid_move(column) {
                return Some((column, self.position.apply_move(column)));
            }
        }
        None
    }
}
