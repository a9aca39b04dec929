//! EXPERTRIS - Tetris with an expert system
//!
//! A circular queue of upcoming pieces, a reserve stack for strategic holds,
//! and a scoring engine that rewards how the two are used.

pub mod advisor;
pub mod bag;
pub mod board;
pub mod error;
pub mod game;
pub mod mode;
pub mod piece;
pub mod queue;
pub mod reserve;
pub mod score;
pub mod settings;
pub mod tetromino;

pub use error::GameError;
pub use game::{Command, GameEvent, Session, SessionState, Snapshot};
