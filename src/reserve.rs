//! Reserve stack for pieces the player sets aside

use crate::error::{Container, GameError};
use crate::tetromino::Piece;
use tracing::{debug, warn};

pub const RESERVE_CAPACITY: usize = 3;

/// Fixed-capacity LIFO stack
#[derive(Debug, Clone, Default)]
pub struct ReserveStack {
    slots: [Option<Piece>; RESERVE_CAPACITY],
    /// Number of stored pieces; the top lives at `len - 1`
    len: usize,
}

impl ReserveStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == RESERVE_CAPACITY
    }

    /// Index of the top slot, `None` when empty
    pub fn top_index(&self) -> Option<usize> {
        self.len.checked_sub(1)
    }

    pub fn push(&mut self, piece: Piece) -> Result<(), GameError> {
        if self.is_full() {
            warn!("reserve full, {:?} rejected", piece.kind);
            return Err(GameError::CapacityExceeded(Container::Reserve));
        }

        self.slots[self.len] = Some(piece);
        self.len += 1;
        debug!("reserved {:?} at position {}", piece.kind, self.len);
        Ok(())
    }

    pub fn pop(&mut self) -> Result<Piece, GameError> {
        let Some(top) = self.top_index() else {
            return Err(GameError::Empty(Container::Reserve));
        };
        let Some(piece) = self.slots[top].take() else {
            return Err(GameError::Empty(Container::Reserve));
        };

        self.len = top;
        debug!("took {:?} from reserve, {} left", piece.kind, self.len);
        Ok(piece)
    }

    pub fn peek_top(&self) -> Option<Piece> {
        self.peek_at(0)
    }

    /// Look at the piece `position` places below the top (0 = top)
    pub fn peek_at(&self, position: usize) -> Option<Piece> {
        let index = self.top_index()?.checked_sub(position)?;
        self.slots[index]
    }

    /// Pieces from top to bottom
    pub fn iter(&self) -> impl Iterator<Item = Piece> + '_ {
        (0..self.len).filter_map(|position| self.peek_at(position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tetromino::TetrominoType;

    #[test]
    fn test_pop_empty() {
        let mut stack = ReserveStack::new();
        assert_eq!(stack.pop(), Err(GameError::Empty(Container::Reserve)));
        assert_eq!(stack.top_index(), None);
    }

    #[test]
    fn test_push_peek_pop_single() {
        let mut stack = ReserveStack::new();
        let piece = Piece::new(TetrominoType::I);
        stack.push(piece).unwrap();
        assert_eq!(stack.peek_top(), Some(piece));
        assert_eq!(stack.pop(), Ok(piece));
        assert!(stack.is_empty());
        assert_eq!(stack.peek_top(), None);
    }

    #[test]
    fn test_lifo_order_and_capacity() {
        let mut stack = ReserveStack::new();
        for kind in [TetrominoType::S, TetrominoType::T, TetrominoType::L] {
            stack.push(Piece::new(kind)).unwrap();
        }
        assert_eq!(stack.top_index(), Some(2));
        assert_eq!(
            stack.push(Piece::new(TetrominoType::O)),
            Err(GameError::CapacityExceeded(Container::Reserve))
        );
        assert_eq!(stack.len(), 3);

        let popped: Vec<_> = std::iter::from_fn(|| stack.pop().ok()).map(|p| p.kind).collect();
        assert_eq!(popped, vec![TetrominoType::L, TetrominoType::T, TetrominoType::S]);
    }

    #[test]
    fn test_peek_at_counts_from_top() {
        let mut stack = ReserveStack::new();
        stack.push(Piece::new(TetrominoType::J)).unwrap();
        stack.push(Piece::new(TetrominoType::Z)).unwrap();
        assert_eq!(stack.peek_at(0).map(|p| p.kind), Some(TetrominoType::Z));
        assert_eq!(stack.peek_at(1).map(|p| p.kind), Some(TetrominoType::J));
        assert_eq!(stack.peek_at(2), None);
        let kinds: Vec<_> = stack.iter().map(|p| p.kind).collect();
        assert_eq!(kinds, vec![TetrominoType::Z, TetrominoType::J]);
    }
}
