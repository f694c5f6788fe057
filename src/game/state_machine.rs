//! Game aggregate and turn engine.
//!
//! A [`Game`] moves through `Idle -> Active -> Finished`. All rule and
//! precondition checks happen before any mutation, so a rejected call
//! leaves the aggregate untouched. Invariant violations (a played card
//! missing from its hand, an exhausted deck mid-draw) are surfaced as
//! internal errors rather than user-facing rejections.

use log::error;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::constants::MAX_PLAYERS;
use super::entities::{
    Card, CardKind, Color, Deck, GameId, GameState, GameView, PlayerId, PlayerView,
    SNAPSHOT_VERSION,
};

/// Errors that can occur during game operations.
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum GameError {
    #[error("game not found")]
    GameNotFound,
    #[error("you already have a game")]
    AlreadyOwnsGame,
    #[error("game is already active")]
    GameAlreadyActive,
    #[error("game is not active")]
    GameNotActive,
    #[error("game is full")]
    GameFull,
    #[error("only the host can do that")]
    NotHost,
    #[error("it is not your turn")]
    OutOfTurn,
    #[error("wrong color")]
    WrongColor,
    #[error("select a color")]
    SelectColor,
    #[error("you can't leave your own game")]
    CannotLeaveOwnGame,
    #[error("you are not in the game")]
    NotInGame,
    #[error("invalid game state: played card not in hand")]
    CardNotInHand,
    #[error("invalid game state: deck exhausted")]
    DeckExhausted,
    #[error("invalid game state: discard pile empty")]
    DiscardEmpty,
    #[error("invalid game state: turn player missing")]
    TurnPlayerMissing,
}

/// Coarse classification the transport layer maps onto status codes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    BadRequest,
    Internal,
}

impl GameError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::GameNotFound => ErrorKind::NotFound,
            Self::NotHost
            | Self::OutOfTurn
            | Self::WrongColor
            | Self::CannotLeaveOwnGame
            | Self::NotInGame => ErrorKind::Forbidden,
            Self::AlreadyOwnsGame
            | Self::GameAlreadyActive
            | Self::GameNotActive
            | Self::GameFull
            | Self::SelectColor => ErrorKind::BadRequest,
            Self::CardNotInHand
            | Self::DeckExhausted
            | Self::DiscardEmpty
            | Self::TurnPlayerMissing => ErrorKind::Internal,
        }
    }
}

/// A play is legal when the card is a joker, when its color matches the
/// color in force (the pending override if any, the discard top otherwise),
/// when it is a number card whose value equals the top card's value, or
/// when its color matches the top card directly even while an override is
/// pending.
fn is_legal_play(card: Card, last: Card, override_color: Option<Color>) -> bool {
    if card.kind.is_joker() {
        return true;
    }
    let in_force = override_color.unwrap_or(last.color);
    if card.color == in_force {
        return true;
    }
    (card.kind == CardKind::Number && card.value == last.value) || card.color == last.color
}

/// The per-match aggregate: seats, turn pointer, direction, draw flag, and
/// the two card piles.
///
/// Seating is an append-only ordered list and turn order is a function of
/// it: a player who joins later sits after everyone already present.
#[derive(Debug)]
pub struct Game {
    pub(crate) id: GameId,
    pub(crate) state: GameState,
    pub(crate) host: PlayerId,
    pub(crate) players: Vec<(PlayerId, Vec<Card>)>,
    pub(crate) players_max: usize,
    pub(crate) turn: Option<PlayerId>,
    pub(crate) reverse: bool,
    pub(crate) override_color: Option<Color>,
    pub(crate) drawn: bool,
    pub(crate) deck: Deck,
    pub(crate) discard: Vec<Card>,
}

impl Game {
    /// Create an idle game with the host pre-seated.
    #[must_use]
    pub fn new(host: PlayerId) -> Self {
        Self {
            id: GameId::random(),
            state: GameState::Idle,
            host: host.clone(),
            players: vec![(host, Vec::new())],
            players_max: MAX_PLAYERS,
            turn: None,
            reverse: false,
            override_color: None,
            drawn: false,
            // The deck stays empty until `start` builds and shuffles one.
            deck: Deck::empty(),
            discard: Vec::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> &GameId {
        &self.id
    }

    #[must_use]
    pub fn state(&self) -> GameState {
        self.state
    }

    #[must_use]
    pub fn host(&self) -> &PlayerId {
        &self.host
    }

    #[must_use]
    pub fn turn(&self) -> Option<&PlayerId> {
        self.turn.as_ref()
    }

    #[must_use]
    pub fn contains(&self, player: &PlayerId) -> bool {
        self.position(player).is_some()
    }

    fn position(&self, player: &PlayerId) -> Option<usize> {
        self.players.iter().position(|(id, _)| id == player)
    }

    /// Seat a player. Re-joining an already-held seat is a no-op; seating
    /// order is fixed at first join.
    pub fn join(&mut self, player: PlayerId) -> Result<(), GameError> {
        if self.state == GameState::Active || player == self.host {
            return Err(GameError::GameAlreadyActive);
        }
        if self.players.len() == self.players_max {
            return Err(GameError::GameFull);
        }
        if !self.contains(&player) {
            self.players.push((player, Vec::new()));
        }
        Ok(())
    }

    /// Unseat a player. The host can only end the game, not leave it.
    pub fn leave(&mut self, player: &PlayerId) -> Result<(), GameError> {
        if *player == self.host {
            return Err(GameError::CannotLeaveOwnGame);
        }
        let idx = self.position(player).ok_or(GameError::NotInGame)?;
        self.players.remove(idx);
        Ok(())
    }

    /// Start the match: pick a random starting player, seed the discard
    /// pile with the first number card in construction order (before the
    /// shuffle, so the seed is deterministic), shuffle, and deal hands in
    /// seating order.
    pub fn start(&mut self, requester: &PlayerId) -> Result<(), GameError> {
        if *requester != self.host {
            return Err(GameError::NotHost);
        }
        if self.state == GameState::Active {
            return Err(GameError::GameAlreadyActive);
        }

        let ids: Vec<PlayerId> = self.players.iter().map(|(id, _)| id.clone()).collect();
        // Never empty: the host is seated at creation.
        self.turn = ids.choose(&mut rand::rng()).cloned();

        let mut deck = Deck::default();
        let seed = deck.take_first_number().ok_or(GameError::DeckExhausted)?;
        self.discard.push(seed);
        deck.shuffle();

        for (_, hand) in &mut self.players {
            *hand = deck.deal_hand().ok_or(GameError::DeckExhausted)?;
        }

        self.deck = deck;
        self.state = GameState::Active;
        Ok(())
    }

    /// Take a turn: play `card`, or with no card, draw one (first call) or
    /// pass (second call). Only the player holding the turn may call this,
    /// and only while the game is active.
    pub fn advance(
        &mut self,
        requester: &PlayerId,
        card: Option<Card>,
    ) -> Result<(), GameError> {
        if self.turn.as_ref() != Some(requester) {
            return Err(GameError::OutOfTurn);
        }
        if self.state != GameState::Active {
            return Err(GameError::GameNotActive);
        }

        match card {
            Some(card) => self.play_card(card),
            None => self.draw_or_pass(),
        }
    }

    fn play_card(&mut self, mut card: Card) -> Result<(), GameError> {
        let last = *self.discard.last().ok_or_else(|| {
            error!("game {}: discard pile empty during play", self.id);
            GameError::DiscardEmpty
        })?;

        if !is_legal_play(card, last, self.override_color) {
            return Err(GameError::WrongColor);
        }

        // Draw penalties target the direction-aware successor computed
        // before any card effect applies.
        let victim = self.successor(1)?;

        if card.kind.is_joker() {
            // A joker must arrive with a concrete target color chosen by
            // the player; the stored card reverts to the neutral color.
            if card.color == Color::Wild {
                return Err(GameError::SelectColor);
            }
            self.override_color = Some(card.color);
            card.color = Color::Wild;
        } else if card.kind == CardKind::Reverse {
            self.reverse = !self.reverse;
        }

        match card.kind {
            CardKind::DrawTwo => self.penalty_draw(victim, 2)?,
            CardKind::WildDrawFour => self.penalty_draw(victim, 4)?,
            _ => {}
        }

        let actor = self.turn_index()?;
        let (_, hand) = &mut self.players[actor];
        let pos = hand.iter().position(|held| *held == card).ok_or_else(|| {
            error!("game {}: played card '{card}' not in hand", self.id);
            GameError::CardNotInHand
        })?;
        let played = hand.remove(pos);
        self.discard.push(played);

        // The override is consumed immediately: the discard top takes on
        // the chosen color for future legality checks.
        if let Some(color) = self.override_color.take() {
            if let Some(top) = self.discard.last_mut() {
                top.color = color;
            }
        }
        self.drawn = false;

        if self.players[actor].1.is_empty() {
            self.state = GameState::Finished;
        } else {
            self.advance_turn(card.kind == CardKind::Skip)?;
        }
        Ok(())
    }

    fn draw_or_pass(&mut self) -> Result<(), GameError> {
        if self.drawn {
            // Explicit pass after the mandatory draw.
            self.drawn = false;
            return self.advance_turn(false);
        }
        let actor = self.turn_index()?;
        let card = self.deck.draw().ok_or_else(|| {
            error!("game {}: deck exhausted on mandatory draw", self.id);
            GameError::DeckExhausted
        })?;
        self.players[actor].1.push(card);
        self.drawn = true;
        Ok(())
    }

    /// Index of the player `steps` seats away from the turn holder in the
    /// current direction.
    fn successor(&self, steps: usize) -> Result<usize, GameError> {
        let len = self.players.len();
        let idx = self.turn_index()?;
        let offset = if self.reverse {
            len - steps % len
        } else {
            steps % len
        };
        Ok((idx + offset) % len)
    }

    fn turn_index(&self) -> Result<usize, GameError> {
        let turn = self.turn.as_ref().ok_or(GameError::TurnPlayerMissing)?;
        self.position(turn).ok_or_else(|| {
            error!("game {}: turn player {turn} not seated", self.id);
            GameError::TurnPlayerMissing
        })
    }

    fn advance_turn(&mut self, skip: bool) -> Result<(), GameError> {
        let next = self.successor(if skip { 2 } else { 1 })?;
        self.turn = Some(self.players[next].0.clone());
        Ok(())
    }

    fn penalty_draw(&mut self, victim: usize, n: usize) -> Result<(), GameError> {
        let (_, hand) = self
            .players
            .get_mut(victim)
            .ok_or(GameError::TurnPlayerMissing)?;
        if !self.deck.draw_n(hand, n) {
            error!("game {}: deck exhausted drawing {n} penalty cards", self.id);
            return Err(GameError::DeckExhausted);
        }
        Ok(())
    }

    /// Build a fully-resolved snapshot for broadcast.
    #[must_use]
    pub fn view(&self) -> GameView {
        GameView {
            version: SNAPSHOT_VERSION,
            id: self.id.clone(),
            state: self.state,
            host: self.host.clone(),
            players: self
                .players
                .iter()
                .map(|(id, hand)| PlayerView {
                    id: id.clone(),
                    hand: hand.clone(),
                })
                .collect(),
            players_max: self.players_max,
            turn: self.turn.clone(),
            reverse: self.reverse,
            override_color: self.override_color,
            drawn: self.drawn,
            deck: self.deck.cards().to_vec(),
            discard: self.discard.clone(),
        }
    }
}
