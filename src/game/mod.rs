//! Uno game engine - cards, the per-match aggregate, and the turn engine.

pub mod constants;
pub mod entities;
pub mod state_machine;

pub use state_machine::{ErrorKind, Game, GameError};
