//! Error taxonomy shared by the core components
//!
//! Every failure in the core is recoverable by the caller: capacity and
//! emptiness errors leave the container untouched, position errors leave the
//! active piece untouched, and a blocked spawn only ends the current game.

use crate::game::SessionState;
use serde::Serialize;
use thiserror::Error;

/// Which fixed-capacity container an operation targeted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Container {
    Queue,
    Reserve,
}

impl Container {
    pub fn name(&self) -> &'static str {
        match self {
            Container::Queue => "queue",
            Container::Reserve => "reserve",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("{} is full", .0.name())]
    CapacityExceeded(Container),
    #[error("{} is empty", .0.name())]
    Empty(Container),
    #[error("piece cannot be placed there")]
    InvalidPosition,
    #[error("spawn position is blocked")]
    BlockedSpawn,
    #[error("no piece is waiting to be played")]
    NoPendingPiece,
    #[error("a piece is already waiting to be played")]
    PieceAlreadyPending,
    #[error("not allowed while the game is {0:?}")]
    InvalidState(SessionState),
}
