//! Process-wide game registry.
//!
//! The registry is the single shared collection of live games. Registry
//! membership (insert, remove, list) is guarded by one `RwLock`; each game
//! sits behind its own `Mutex`, held for the duration of a single mutating
//! call. Calls against different games proceed in parallel; calls against
//! the same game are serialized. Nothing here persists across restarts.
//!
//! Lock order is one-way: a mutating call keeps the membership read guard
//! until it holds the game lock, so a concurrent `end` cannot delete the
//! game out from under it, and no thread ever takes a registry lock while
//! holding a game lock.

use log::info;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use crate::game::{
    entities::{Card, GameId, GameState, GameView, PlayerId},
    state_machine::{Game, GameError},
};

// All checks precede mutation in the turn engine, so state behind a
// poisoned lock is still consistent and safe to keep serving.
fn lock(game: &Mutex<Game>) -> MutexGuard<'_, Game> {
    game.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
struct RegistryInner {
    games: HashMap<GameId, Arc<Mutex<Game>>>,
    /// One live game per host; kept in sync with `games`.
    hosts: HashMap<PlayerId, GameId>,
}

/// Shared registry of live games. Cheap to share behind an `Arc`; every
/// method takes `&self`.
#[derive(Default)]
pub struct GameRegistry {
    inner: RwLock<RegistryInner>,
}

impl GameRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, RegistryInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn handle(&self, id: &GameId) -> Result<Arc<Mutex<Game>>, GameError> {
        self.read()
            .games
            .get(id)
            .cloned()
            .ok_or(GameError::GameNotFound)
    }

    /// Drop `id`, but only while it still maps to `handle`; a later game
    /// may have reclaimed the code and must not be evicted by a stale
    /// caller.
    fn remove(&self, id: &GameId, handle: &Arc<Mutex<Game>>) {
        let mut inner = self.write();
        let current = inner
            .games
            .get(id)
            .is_some_and(|live| Arc::ptr_eq(live, handle));
        if current {
            inner.games.remove(id);
            inner.hosts.retain(|_, owned| owned != id);
        }
    }

    /// Open a new idle game. Each host may own at most one live game.
    pub fn create(&self, host: PlayerId) -> Result<GameView, GameError> {
        let mut inner = self.write();
        if inner.hosts.contains_key(&host) {
            return Err(GameError::AlreadyOwnsGame);
        }

        let mut game = Game::new(host.clone());
        // Re-roll the short code in the unlikely event it is taken.
        while inner.games.contains_key(game.id()) {
            game = Game::new(host.clone());
        }
        let id = game.id().clone();
        let view = game.view();
        inner.hosts.insert(host, id.clone());
        inner.games.insert(id.clone(), Arc::new(Mutex::new(game)));
        info!("game {id} created");
        Ok(view)
    }

    pub fn find(&self, id: &GameId) -> Result<GameView, GameError> {
        let handle = self.handle(id)?;
        let game = lock(&handle);
        Ok(game.view())
    }

    /// Snapshot every live game. The registry read lock is released before
    /// the per-game locks are taken, so a slow broadcast poll never blocks
    /// creates or removes.
    #[must_use]
    pub fn list(&self) -> Vec<GameView> {
        let handles: Vec<_> = self.read().games.values().cloned().collect();
        handles.iter().map(|handle| lock(handle).view()).collect()
    }

    pub fn join(&self, id: &GameId, player: PlayerId) -> Result<GameView, GameError> {
        let inner = self.read();
        let handle = inner.games.get(id).cloned().ok_or(GameError::GameNotFound)?;
        let mut game = lock(&handle);
        drop(inner);
        game.join(player)?;
        Ok(game.view())
    }

    pub fn leave(&self, id: &GameId, player: &PlayerId) -> Result<GameView, GameError> {
        let inner = self.read();
        let handle = inner.games.get(id).cloned().ok_or(GameError::GameNotFound)?;
        let mut game = lock(&handle);
        drop(inner);
        game.leave(player)?;
        Ok(game.view())
    }

    pub fn start(&self, id: &GameId, requester: &PlayerId) -> Result<GameView, GameError> {
        let inner = self.read();
        let handle = inner.games.get(id).cloned().ok_or(GameError::GameNotFound)?;
        let mut game = lock(&handle);
        drop(inner);
        game.start(requester)?;
        info!("game {id} started");
        Ok(game.view())
    }

    /// Take a turn. A play that empties the actor's hand finishes the game;
    /// the game is dropped from the registry and its final snapshot is
    /// still returned to the caller.
    pub fn advance(
        &self,
        id: &GameId,
        requester: &PlayerId,
        card: Option<Card>,
    ) -> Result<GameView, GameError> {
        let inner = self.read();
        let handle = inner.games.get(id).cloned().ok_or(GameError::GameNotFound)?;
        let view = {
            let mut game = lock(&handle);
            drop(inner);
            game.advance(requester, card)?;
            game.view()
        };

        if view.state == GameState::Finished {
            self.remove(id, &handle);
            info!("game {id} finished, winner {requester}");
        }
        Ok(view)
    }

    /// Tear a game down. Host only.
    pub fn end(&self, id: &GameId, requester: &PlayerId) -> Result<(), GameError> {
        let inner = self.read();
        let handle = inner.games.get(id).cloned().ok_or(GameError::GameNotFound)?;
        {
            let game = lock(&handle);
            drop(inner);
            if !game.contains(requester) {
                return Err(GameError::NotInGame);
            }
            if game.host() != requester {
                return Err(GameError::NotHost);
            }
        }
        self.remove(id, &handle);
        info!("game {id} ended by host");
        Ok(())
    }
}
