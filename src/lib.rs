//! # Uno Engine
//!
//! A turn-based Uno rules engine with a process-wide game lobby.
//!
//! The crate owns deck construction and shuffling, per-player hands, the
//! discard pile, turn order (including reversal and skips), special-card
//! effects, move legality, and win detection. Transport concerns (HTTP
//! routing, sessions, broadcast) live in a separate collaborator that
//! drives this crate through [`GameRegistry`] and polls [`GameView`]
//! snapshots for its clients.
//!
//! ## Architecture
//!
//! - [`game::entities`]: cards, the deck, identities, and snapshot types
//! - [`game::state_machine`]: the `Idle -> Active -> Finished` aggregate
//!   and the turn engine
//! - [`registry`]: the shared registry, one lock per game
//!
//! ## Example
//!
//! ```
//! use uno_engine::{GameRegistry, PlayerId};
//!
//! let registry = GameRegistry::new();
//! let host = PlayerId::random();
//! let game = registry.create(host.clone()).unwrap();
//! assert!(registry.find(&game.id).is_ok());
//! ```

/// Core game logic, entities, and the turn state machine.
pub mod game;

/// Shared registry of live games.
pub mod registry;

pub use game::{
    ErrorKind, Game, GameError,
    constants::{self, HAND_SIZE, MAX_PLAYERS},
    entities::{
        self, Card, CardKind, Color, Deck, GameId, GameState, GameView, PlayerId, PlayerView,
        SNAPSHOT_VERSION,
    },
};
pub use registry::GameRegistry;
