//! Game board representation and collision detection

use crate::tetromino::{Shape, TetrominoType};
use tracing::debug;

/// Standard Tetris board dimensions
pub const BOARD_WIDTH: usize = 10;
pub const BOARD_HEIGHT: usize = 20;

/// Rows checked for game over after every lock
const TOP_ZONE_ROWS: usize = 2;

/// Empty cell value; anything else is a [`TetrominoType::cell_id`]
pub const EMPTY_CELL: u8 = 0;

pub type Row = [u8; BOARD_WIDTH];

/// The game board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    /// Grid stored as [row][col], row 0 is the top
    cells: [Row; BOARD_HEIGHT],
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// Create a new empty board
    pub fn new() -> Self {
        Self {
            cells: [[EMPTY_CELL; BOARD_WIDTH]; BOARD_HEIGHT],
        }
    }

    /// Get the cell at a position (row, col)
    /// Returns None if out of bounds
    pub fn get(&self, row: i32, col: i32) -> Option<u8> {
        let (row, col) = Self::index(row, col)?;
        Some(self.cells[row][col])
    }

    /// Set a cell at a position
    /// Returns false if out of bounds
    pub fn set(&mut self, row: i32, col: i32, value: u8) -> bool {
        let Some((row, col)) = Self::index(row, col) else {
            return false;
        };
        self.cells[row][col] = value;
        true
    }

    fn index(row: i32, col: i32) -> Option<(usize, usize)> {
        let row = usize::try_from(row).ok()?;
        let col = usize::try_from(col).ok()?;
        (row < BOARD_HEIGHT && col < BOARD_WIDTH).then_some((row, col))
    }

    pub fn cells(&self) -> &[Row; BOARD_HEIGHT] {
        &self.cells
    }

    /// Check whether `shape` fits with its top-left corner at (x, y)
    ///
    /// Cells above the board (negative rows) are allowed and never collide.
    pub fn is_position_valid(&self, shape: &Shape, x: i32, y: i32) -> bool {
        shape.occupied().all(|(dr, dc)| {
            let row = y + dr as i32;
            let col = x + dc as i32;
            if col < 0 || col >= BOARD_WIDTH as i32 || row >= BOARD_HEIGHT as i32 {
                return false;
            }
            row < 0 || self.cells[row as usize][col as usize] == EMPTY_CELL
        })
    }

    /// Write a piece onto the board and return how many cells were written
    ///
    /// Cells above the board are skipped.
    pub fn lock(&mut self, shape: &Shape, x: i32, y: i32, kind: TetrominoType) -> usize {
        let mut written = 0;
        for (dr, dc) in shape.occupied() {
            if self.set(y + dr as i32, x + dc as i32, kind.cell_id()) {
                written += 1;
            }
        }
        written
    }

    /// Indices of completely filled rows, top to bottom
    pub fn find_full_rows(&self) -> Vec<usize> {
        (0..BOARD_HEIGHT).filter(|&row| self.is_line_full(row)).collect()
    }

    /// Remove the given rows and drop everything above them
    ///
    /// Rows are compacted bottom-up in a single pass, so the order of the
    /// indices does not matter. Duplicates and out-of-range rows are ignored.
    pub fn clear_rows(&mut self, rows: &[usize]) -> usize {
        let mut remove = [false; BOARD_HEIGHT];
        for &row in rows {
            if row < BOARD_HEIGHT {
                remove[row] = true;
            }
        }

        let mut lines_cleared = 0;
        let mut write_row = BOARD_HEIGHT;

        for read_row in (0..BOARD_HEIGHT).rev() {
            if remove[read_row] {
                lines_cleared += 1;
                continue;
            }
            write_row -= 1;
            if write_row != read_row {
                self.cells[write_row] = self.cells[read_row];
            }
        }

        // Fill the top with empty rows
        for row in &mut self.cells[..write_row] {
            *row = [EMPTY_CELL; BOARD_WIDTH];
        }

        if lines_cleared > 0 {
            debug!("cleared {} rows", lines_cleared);
        }
        lines_cleared
    }

    /// Check if a line is completely filled
    fn is_line_full(&self, row: usize) -> bool {
        self.cells[row].iter().all(|&cell| cell != EMPTY_CELL)
    }

    /// Game over condition: anything locked in the top two rows
    pub fn is_top_blocked(&self) -> bool {
        self.cells[..TOP_ZONE_ROWS]
            .iter()
            .any(|row| row.iter().any(|&cell| cell != EMPTY_CELL))
    }

    /// Check if the board is completely empty
    pub fn is_empty(&self) -> bool {
        self.filled_count() == 0
    }

    pub fn filled_count(&self) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|&&cell| cell != EMPTY_CELL)
            .count()
    }

    /// Height of each column, measured from the bottom to its highest block
    pub fn column_heights(&self) -> [usize; BOARD_WIDTH] {
        let mut heights = [0; BOARD_WIDTH];
        for (col, height) in heights.iter_mut().enumerate() {
            if let Some(row) = (0..BOARD_HEIGHT).find(|&row| self.cells[row][col] != EMPTY_CELL) {
                *height = BOARD_HEIGHT - row;
            }
        }
        heights
    }

    /// Empty cells that have a block somewhere above them in the same column
    pub fn hole_count(&self) -> usize {
        (0..BOARD_WIDTH)
            .map(|col| {
                (0..BOARD_HEIGHT)
                    .skip_while(|&row| self.cells[row][col] == EMPTY_CELL)
                    .filter(|&row| self.cells[row][col] == EMPTY_CELL)
                    .count()
            })
            .sum()
    }
}
