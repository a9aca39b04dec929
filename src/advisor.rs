//! Placement advisor: finds the best landing spot for a piece

use crate::board::{Board, BOARD_WIDTH};
use crate::score::ScoringEngine;
use crate::tetromino::{Rotation, TetrominoType};
use serde::Serialize;

/// Weight applied to each covered hole
const HOLE_PENALTY: i64 = 50;

/// A suggested final position for a piece
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub kind: TetrominoType,
    pub rotation: Rotation,
    pub x: i32,
    pub y: i32,
    /// Lines the placement would clear
    pub lines: u32,
    pub score: i64,
}

/// Try every rotation and column and return the best scoring placement
///
/// Ties keep the first candidate found, so results are deterministic.
pub fn best_placement(board: &Board, kind: TetrominoType) -> Option<Placement> {
    let mut best: Option<Placement> = None;

    for rotation in Rotation::all() {
        let shape = kind.shape_at(rotation);
        let max_x = BOARD_WIDTH as i32 - shape.width() as i32;
        for x in 0..=max_x {
            if !board.is_position_valid(&shape, x, 0) {
                continue;
            }
            let mut y = 0;
            while board.is_position_valid(&shape, x, y + 1) {
                y += 1;
            }

            let mut simulated = board.clone();
            simulated.lock(&shape, x, y, kind);
            let full = simulated.find_full_rows();
            let lines = simulated.clear_rows(&full) as u32;
            let score = evaluate(&simulated, lines);

            if best.is_none_or(|b| score > b.score) {
                best = Some(Placement {
                    kind,
                    rotation,
                    x,
                    y,
                    lines,
                    score,
                });
            }
        }
    }
    best
}

/// `-aggregate_height - 50×holes - bumpiness + line clear points at level 1`
fn evaluate(board: &Board, lines: u32) -> i64 {
    let heights = board.column_heights();
    let aggregate: i64 = heights.iter().map(|&h| h as i64).sum();
    let bumpiness: i64 = heights
        .windows(2)
        .map(|pair| (pair[0] as i64 - pair[1] as i64).abs())
        .sum();
    let holes = board.hole_count() as i64;
    let clear = ScoringEngine::score_line_clear(lines, 1) as i64;

    -aggregate - HOLE_PENALTY * holes - bumpiness + clear
}
