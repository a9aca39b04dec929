//! Circular queue of upcoming pieces
//!
//! Backed by a fixed array with front/back indices that wrap modulo the
//! capacity, plus an explicit count so a full queue and an empty queue are
//! never confused.

use crate::error::{Container, GameError};
use crate::tetromino::Piece;
use tracing::{debug, warn};

pub const QUEUE_CAPACITY: usize = 5;

#[derive(Debug, Clone, Default)]
pub struct PieceQueue {
    slots: [Option<Piece>; QUEUE_CAPACITY],
    /// Index of the next piece to leave
    front: usize,
    /// Index where the next piece is written
    back: usize,
    count: usize,
}

impl PieceQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn is_full(&self) -> bool {
        self.count == QUEUE_CAPACITY
    }

    /// Insert at the back; a full queue is left untouched
    pub fn enqueue(&mut self, piece: Piece) -> Result<(), GameError> {
        if self.is_full() {
            warn!("queue full, {:?} rejected", piece.kind);
            return Err(GameError::CapacityExceeded(Container::Queue));
        }

        self.slots[self.back] = Some(piece);
        self.back = (self.back + 1) % QUEUE_CAPACITY;
        self.count += 1;
        debug!("queued {:?}, {} in queue", piece.kind, self.count);
        Ok(())
    }

    /// Remove the piece at the front
    pub fn dequeue(&mut self) -> Result<Piece, GameError> {
        if self.is_empty() {
            return Err(GameError::Empty(Container::Queue));
        }
        let Some(piece) = self.slots[self.front].take() else {
            return Err(GameError::Empty(Container::Queue));
        };

        self.front = (self.front + 1) % QUEUE_CAPACITY;
        self.count -= 1;
        debug!("dequeued {:?}, {} left", piece.kind, self.count);
        Ok(piece)
    }

    /// Look at the piece `offset` places from the front (0 = next to play)
    pub fn peek_at(&self, offset: usize) -> Option<Piece> {
        if offset >= self.count {
            return None;
        }
        self.slots[(self.front + offset) % QUEUE_CAPACITY]
    }

    /// Pieces from front to back
    pub fn iter(&self) -> impl Iterator<Item = Piece> + '_ {
        (0..self.count).filter_map(|offset| self.peek_at(offset))
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Reorder so the most valuable kinds play first
    ///
    /// The sort is stable, so pieces of equal value keep their relative order.
    /// Returns how many positions now hold a different kind than before.
    pub fn reorder_by_value(&mut self) -> usize {
        let before: Vec<Piece> = self.iter().collect();
        let mut sorted = before.clone();
        sorted.sort_by(|a, b| b.kind.queue_value().cmp(&a.kind.queue_value()));

        let n = sorted.len();
        self.slots = Default::default();
        for (slot, piece) in self.slots.iter_mut().zip(&sorted) {
            *slot = Some(*piece);
        }
        self.front = 0;
        self.back = n % QUEUE_CAPACITY;
        self.count = n;

        let moved = before
            .iter()
            .zip(&sorted)
            .filter(|(a, b)| a.kind != b.kind)
            .count();
        debug!("queue reordered, {} positions changed", moved);
        moved
    }

    #[cfg(test)]
    pub(crate) fn indices(&self) -> (usize, usize) {
        (self.front, self.back)
    }
}
