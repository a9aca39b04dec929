//! Active falling piece logic

use crate::board::{Board, BOARD_WIDTH};
use crate::error::GameError;
use crate::tetromino::{Piece, Rotation, Shape, TetrominoType};
use serde::Serialize;

/// The piece currently falling
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivePiece {
    pub kind: TetrominoType,
    /// Occupancy matrix in the current rotation
    pub shape: Shape,
    /// Column of the shape's left edge
    pub x: i32,
    /// Row of the shape's top edge, row 0 is the top of the board
    pub y: i32,
    pub rotation: Rotation,
}

impl ActivePiece {
    /// Board cells covered by the piece
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.shape
            .occupied()
            .map(|(dr, dc)| (self.y + dr as i32, self.x + dc as i32))
    }
}

/// What locking a piece left behind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockResult {
    pub kind: TetrominoType,
    pub cells_written: usize,
}

/// Owns the falling piece and moves it against a board
#[derive(Debug, Clone, Default)]
pub struct PieceController {
    active: Option<ActivePiece>,
}

impl PieceController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<&ActivePiece> {
        self.active.as_ref()
    }

    pub fn has_active(&self) -> bool {
        self.active.is_some()
    }

    /// Drop the active piece without locking it
    pub fn clear(&mut self) {
        self.active = None;
    }

    /// Place a new piece centered at the top of the board
    ///
    /// Nothing is installed if the spawn cells are already occupied.
    pub fn spawn(&mut self, piece: &Piece, board: &Board) -> Result<(), GameError> {
        let shape = piece.kind.shape();
        let x = (BOARD_WIDTH as i32 - shape.width() as i32).div_euclid(2);
        if !board.is_position_valid(&shape, x, 0) {
            return Err(GameError::BlockedSpawn);
        }

        self.active = Some(ActivePiece {
            kind: piece.kind,
            shape,
            x,
            y: 0,
            rotation: Rotation::North,
        });
        Ok(())
    }

    /// Try to shift the piece, returns true if successful
    pub fn try_move(&mut self, dx: i32, dy: i32, board: &Board) -> bool {
        let Some(piece) = &mut self.active else {
            return false;
        };
        if !board.is_position_valid(&piece.shape, piece.x + dx, piece.y + dy) {
            return false;
        }
        piece.x += dx;
        piece.y += dy;
        true
    }

    /// Try to rotate clockwise in place; there are no wall kicks
    pub fn try_rotate(&mut self, board: &Board) -> bool {
        let Some(piece) = &mut self.active else {
            return false;
        };
        let rotated = piece.shape.rotated_cw();
        if !board.is_position_valid(&rotated, piece.x, piece.y) {
            return false;
        }
        piece.shape = rotated;
        piece.rotation = piece.rotation.cw();
        true
    }

    /// Hard drop - move down as far as possible and return distance dropped
    pub fn hard_drop(&mut self, board: &Board) -> u32 {
        let mut distance = 0;
        while self.try_move(0, 1, board) {
            distance += 1;
        }
        distance
    }

    /// Row where the piece would come to rest
    pub fn ghost_y(&self, board: &Board) -> Option<i32> {
        let piece = self.active.as_ref()?;
        let mut y = piece.y;
        while board.is_position_valid(&piece.shape, piece.x, y + 1) {
            y += 1;
        }
        Some(y)
    }

    /// Write the piece into the board and forget it
    ///
    /// Line clears and game-over checks are left to the caller.
    pub fn lock_into_board(&mut self, board: &mut Board) -> Option<LockResult> {
        let piece = self.active.take()?;
        let cells_written = board.lock(&piece.shape, piece.x, piece.y, piece.kind);
        Some(LockResult {
            kind: piece.kind,
            cells_written,
        })
    }

    #[cfg(test)]
    pub(crate) fn place(&mut self, piece: ActivePiece) {
        self.active = Some(piece);
    }
}
