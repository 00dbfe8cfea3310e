//! 15×15 Gomoku rule engine.
//!
//! Pure and deterministic: placement validity, five-in-a-row detection, and
//! nothing else. The board is the only code allowed to mutate cells; rooms
//! drive it strictly under their own lock.

use crate::protocol::{BoardGrid, ErrorKind, StoneColor, BOARD_SIZE};

/// The four winning axes: horizontal, vertical, and the two diagonals.
const AXES: [(i32, i32); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

/// Minimum run length that wins. Longer runs also win (no overline rule).
const WIN_RUN: u32 = 5;

#[derive(Debug, Clone)]
pub struct Board {
    cells: BoardGrid,
    stones: usize,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub fn new() -> Self {
        Self {
            cells: [[None; BOARD_SIZE]; BOARD_SIZE],
            stones: 0,
        }
    }

    /// Whether (x, y) lies on the board.
    pub fn is_valid(x: i32, y: i32) -> bool {
        (0..BOARD_SIZE as i32).contains(&x) && (0..BOARD_SIZE as i32).contains(&y)
    }

    /// The stone at (x, y), or `None` for empty or out-of-range cells.
    pub fn stone_at(&self, x: i32, y: i32) -> Option<StoneColor> {
        if Self::is_valid(x, y) {
            self.cells[x as usize][y as usize]
        } else {
            None
        }
    }

    /// Place a stone. A cell, once set, is never overwritten; only
    /// [`Board::reset`] clears cells.
    pub fn place(&mut self, x: i32, y: i32, color: StoneColor) -> Result<(), ErrorKind> {
        if !Self::is_valid(x, y) {
            return Err(ErrorKind::InvalidPosition { x, y });
        }
        if self.cells[x as usize][y as usize].is_some() {
            return Err(ErrorKind::Occupied { x, y });
        }
        self.cells[x as usize][y as usize] = Some(color);
        self.stones += 1;
        Ok(())
    }

    /// Check whether the stone at (x, y) completes a run of five or more.
    ///
    /// Walks outward in both directions along each axis, counting contiguous
    /// same-color cells through (x, y). Returns the winning color, or `None`
    /// when the cell is empty or no axis reaches five.
    pub fn check_winner(&self, x: i32, y: i32) -> Option<StoneColor> {
        let color = self.stone_at(x, y)?;
        for (dx, dy) in AXES {
            let mut run = 1;
            for sign in [1i32, -1] {
                let (mut nx, mut ny) = (x + dx * sign, y + dy * sign);
                while self.stone_at(nx, ny) == Some(color) {
                    run += 1;
                    nx += dx * sign;
                    ny += dy * sign;
                }
            }
            if run >= WIN_RUN {
                return Some(color);
            }
        }
        None
    }

    /// Whether every cell is occupied (a completed placement with no winner
    /// on a full board is a draw).
    pub fn is_full(&self) -> bool {
        self.stones == BOARD_SIZE * BOARD_SIZE
    }

    /// Clear all cells.
    pub fn reset(&mut self) {
        self.cells = [[None; BOARD_SIZE]; BOARD_SIZE];
        self.stones = 0;
    }

    /// Independent copy of the grid for serialization.
    pub fn snapshot(&self) -> BoardGrid {
        self.cells
    }
}
