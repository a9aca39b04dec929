//! Piece catalog: the 7 tetromino kinds, their shapes and their values
//!
//! Shapes are stored as 0/1 matrices with row 0 at the top, matching the board
//! coordinate system. Rotating a shape always produces a new matrix.

use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// The 7 tetromino types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TetrominoType {
    I, // Cyan - long bar
    O, // Yellow - square
    T, // Purple - T-shape
    S, // Green - S-shape
    Z, // Red - Z-shape
    J, // Blue - J-shape
    L, // Orange - L-shape
}

impl TetrominoType {
    /// Get all tetromino types, in catalog order
    pub fn all() -> [TetrominoType; 7] {
        [
            TetrominoType::I,
            TetrominoType::O,
            TetrominoType::T,
            TetrominoType::S,
            TetrominoType::Z,
            TetrominoType::J,
            TetrominoType::L,
        ]
    }

    /// Position of this kind in [`TetrominoType::all`]
    pub fn index(&self) -> usize {
        match self {
            TetrominoType::I => 0,
            TetrominoType::O => 1,
            TetrominoType::T => 2,
            TetrominoType::S => 3,
            TetrominoType::Z => 4,
            TetrominoType::J => 5,
            TetrominoType::L => 6,
        }
    }

    /// Nonzero value written into board cells occupied by this kind
    pub fn cell_id(&self) -> u8 {
        self.index() as u8 + 1
    }

    /// Inverse of [`TetrominoType::cell_id`]
    pub fn from_cell_id(id: u8) -> Option<TetrominoType> {
        match id {
            1..=7 => Some(Self::all()[id as usize - 1]),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TetrominoType::I => "I",
            TetrominoType::O => "O",
            TetrominoType::T => "T",
            TetrominoType::S => "S",
            TetrominoType::Z => "Z",
            TetrominoType::J => "J",
            TetrominoType::L => "L",
        }
    }

    /// Display color as RGB
    pub fn rgb(&self) -> (u8, u8, u8) {
        match self {
            TetrominoType::I => (0x00, 0xf0, 0xf0),
            TetrominoType::O => (0xf0, 0xf0, 0x00),
            TetrominoType::T => (0xa0, 0x00, 0xf0),
            TetrominoType::S => (0x00, 0xf0, 0x00),
            TetrominoType::Z => (0xf0, 0x00, 0x00),
            TetrominoType::J => (0x00, 0x00, 0xf0),
            TetrominoType::L => (0xf0, 0xa0, 0x00),
        }
    }

    /// Base score used by the expert system when this kind is played
    pub fn base_score(&self) -> u32 {
        match self {
            TetrominoType::I => 100,
            TetrominoType::O => 120,
            TetrominoType::T => 150,
            TetrominoType::L | TetrominoType::J => 180,
            TetrominoType::S | TetrominoType::Z => 140,
        }
    }

    /// Ordering value used when optimizing the queue (higher plays first)
    pub fn queue_value(&self) -> u32 {
        match self {
            TetrominoType::I => 100,
            TetrominoType::T => 80,
            TetrominoType::L | TetrominoType::J => 60,
            TetrominoType::S | TetrominoType::Z => 40,
            TetrominoType::O => 20,
        }
    }

    /// Canonical spawn orientation
    pub fn shape(&self) -> Shape {
        match self {
            TetrominoType::I => Shape::from_rows(&[&[1, 1, 1, 1]]),
            TetrominoType::O => Shape::from_rows(&[&[1, 1], &[1, 1]]),
            TetrominoType::T => Shape::from_rows(&[&[0, 1, 0], &[1, 1, 1]]),
            TetrominoType::S => Shape::from_rows(&[&[0, 1, 1], &[1, 1, 0]]),
            TetrominoType::Z => Shape::from_rows(&[&[1, 1, 0], &[0, 1, 1]]),
            TetrominoType::J => Shape::from_rows(&[&[1, 0, 0], &[1, 1, 1]]),
            TetrominoType::L => Shape::from_rows(&[&[0, 0, 1], &[1, 1, 1]]),
        }
    }

    /// Canonical orientation turned clockwise `rotation` times
    pub fn shape_at(&self, rotation: Rotation) -> Shape {
        let mut shape = self.shape();
        for _ in 0..rotation.quarter_turns() {
            shape = shape.rotated_cw();
        }
        shape
    }
}

/// Rectangular occupancy matrix of a piece in one orientation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Shape {
    rows: usize,
    cols: usize,
    /// Row-major, 0 = empty, 1 = occupied
    cells: Vec<u8>,
}

impl Shape {
    /// Build a shape from equally long rows (any nonzero value counts as occupied)
    pub fn from_rows(rows: &[&[u8]]) -> Self {
        let cols = rows.first().map_or(0, |r| r.len());
        let cells = rows
            .iter()
            .flat_map(|row| (0..cols).map(move |c| u8::from(row.get(c).is_some_and(|&v| v != 0))))
            .collect();
        Self {
            rows: rows.len(),
            cols,
            cells,
        }
    }

    pub fn height(&self) -> usize {
        self.rows
    }

    pub fn width(&self) -> usize {
        self.cols
    }

    pub fn is_filled(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols && self.cells[row * self.cols + col] != 0
    }

    /// (row, col) offsets of every occupied cell, top to bottom, left to right
    pub fn occupied(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, v)| **v != 0)
            .map(|(i, _)| (i / self.cols, i % self.cols))
    }

    /// Rows as vectors, for renderers and snapshots
    pub fn to_rows(&self) -> Vec<Vec<u8>> {
        self.cells.chunks(self.cols.max(1)).map(<[u8]>::to_vec).collect()
    }

    /// 90 degree clockwise rotation: an N×M matrix becomes M×N with
    /// `out[r][c] = in[N-1-c][r]`
    pub fn rotated_cw(&self) -> Shape {
        let (n, m) = (self.rows, self.cols);
        let mut cells = Vec::with_capacity(n * m);
        for r in 0..m {
            for c in 0..n {
                cells.push(self.cells[(n - 1 - c) * m + r]);
            }
        }
        Shape {
            rows: m,
            cols: n,
            cells,
        }
    }
}

/// Rotation states, counted in clockwise quarter turns from spawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Rotation {
    #[default]
    North, // Spawn state
    East,  // Clockwise from North
    South, // 180 from North
    West,  // Counter-clockwise from North
}

impl Rotation {
    /// Rotate clockwise: North → East → South → West → North
    pub fn cw(&self) -> Rotation {
        match self {
            Rotation::North => Rotation::East,
            Rotation::East => Rotation::South,
            Rotation::South => Rotation::West,
            Rotation::West => Rotation::North,
        }
    }

    pub fn quarter_turns(&self) -> usize {
        match self {
            Rotation::North => 0,
            Rotation::East => 1,
            Rotation::South => 2,
            Rotation::West => 3,
        }
    }

    pub fn all() -> [Rotation; 4] {
        [Rotation::North, Rotation::East, Rotation::South, Rotation::West]
    }
}

/// A piece as it travels through the queue and the reserve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Piece {
    pub kind: TetrominoType,
    pub base_score: u32,
    pub created_at: SystemTime,
}

impl Piece {
    pub fn new(kind: TetrominoType) -> Self {
        Self {
            kind,
            base_score: kind.base_score(),
            created_at: SystemTime::now(),
        }
    }
}
