use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    time::{SystemTime, UNIX_EPOCH},
};
use uuid::Uuid;

use super::constants::{DECK_SIZE, GAME_ID_ALPHABET, GAME_ID_LENGTH, HAND_SIZE};

/// Snapshot schema version carried by every [`GameView`] so broadcast
/// consumers can detect incompatible payloads.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(
    Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub enum Color {
    Red,
    Yellow,
    Blue,
    Green,
    // Wild is the neutral color jokers keep on the discard pile. The
    // effective color of a joker play is tracked separately by the game.
    Wild,
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Red => "red",
            Self::Yellow => "yellow",
            Self::Blue => "blue",
            Self::Green => "green",
            Self::Wild => "wild",
        };
        write!(f, "{repr}")
    }
}

#[derive(
    Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub enum CardKind {
    Number,
    DrawTwo,
    Reverse,
    Skip,
    Wild,
    WildDrawFour,
}

impl CardKind {
    /// Jokers are playable on anything but require the player to pick an
    /// effective color.
    #[must_use]
    pub const fn is_joker(self) -> bool {
        matches!(self, Self::Wild | Self::WildDrawFour)
    }
}

impl fmt::Display for CardKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Number => "number",
            Self::DrawTwo => "draw two",
            Self::Reverse => "reverse",
            Self::Skip => "skip",
            Self::Wild => "wild",
            Self::WildDrawFour => "wild draw four",
        };
        write!(f, "{repr}")
    }
}

/// A single card. Number cards carry a value in `0..=9`; action and wild
/// cards carry none.
#[derive(
    Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub struct Card {
    pub color: Color,
    pub kind: CardKind,
    pub value: Option<u8>,
}

impl Card {
    #[must_use]
    pub const fn number(color: Color, value: u8) -> Self {
        Self {
            color,
            kind: CardKind::Number,
            value: Some(value),
        }
    }

    #[must_use]
    pub const fn action(color: Color, kind: CardKind) -> Self {
        Self {
            color,
            kind,
            value: None,
        }
    }

    #[must_use]
    pub const fn wild(kind: CardKind) -> Self {
        Self {
            color: Color::Wild,
            kind,
            value: None,
        }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match (self.kind, self.value) {
            (CardKind::Number, Some(value)) => write!(f, "{} {value}", self.color),
            _ => write!(f, "{} {}", self.color, self.kind),
        }
    }
}

/// The draw stack. Cards are popped from the end.
#[derive(Clone, Debug)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Default for Deck {
    fn default() -> Self {
        let mut cards = Vec::with_capacity(DECK_SIZE);
        for color in [Color::Red, Color::Yellow, Color::Blue, Color::Green] {
            for value in 0..=9u8 {
                cards.push(Card::number(color, value));
                // Every number but zero appears twice per color.
                if value > 0 {
                    cards.push(Card::number(color, value));
                }
            }
            for _ in 0..2 {
                cards.push(Card::action(color, CardKind::Skip));
                cards.push(Card::action(color, CardKind::Reverse));
                cards.push(Card::action(color, CardKind::DrawTwo));
            }
            // One of each joker per suit iteration, always colored wild.
            cards.push(Card::wild(CardKind::Wild));
            cards.push(Card::wild(CardKind::WildDrawFour));
        }
        Self { cards }
    }
}

impl Deck {
    /// An empty stack, the state of a game that has not started.
    #[must_use]
    pub fn empty() -> Self {
        Self { cards: Vec::new() }
    }

    #[must_use]
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Shuffle in place. The permutation is seeded from the wall clock at
    /// the moment of shuffling; runs are not reproducible by design.
    pub fn shuffle(&mut self) {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_millis() as u64);
        let mut rng = StdRng::seed_from_u64(millis);
        self.cards.shuffle(&mut rng);
    }

    /// Pop a single card, or `None` when the deck is exhausted.
    pub fn draw(&mut self) -> Option<Card> {
        self.cards.pop()
    }

    /// Pop `n` cards into `hand`. Returns false when the deck runs out
    /// partway; cards popped up to that point stay in the hand.
    pub fn draw_n(&mut self, hand: &mut Vec<Card>, n: usize) -> bool {
        for _ in 0..n {
            match self.cards.pop() {
                Some(card) => hand.push(card),
                None => return false,
            }
        }
        true
    }

    /// Deal a starting hand: seven cards off the top plus one ad-hoc wild
    /// that is not sourced from the deck. The extra wild inflates the card
    /// count per player by one; this is long-standing observable behavior
    /// that clients depend on, so it is kept rather than normalized away.
    pub fn deal_hand(&mut self) -> Option<Vec<Card>> {
        let mut hand = Vec::with_capacity(HAND_SIZE + 1);
        for _ in 0..HAND_SIZE {
            hand.push(self.cards.pop()?);
        }
        hand.push(Card::wild(CardKind::Wild));
        Some(hand)
    }

    /// Remove and return the first number card in construction order. Used
    /// to seed the discard pile before the shuffle; with the canonical
    /// build order this is always the red zero.
    pub fn take_first_number(&mut self) -> Option<Card> {
        let idx = self
            .cards
            .iter()
            .position(|card| card.kind == CardKind::Number)?;
        Some(self.cards.remove(idx))
    }
}

/// Opaque player identity. The transport layer mints one per session and
/// the core never interprets it.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct PlayerId(String);

impl PlayerId {
    #[must_use]
    pub fn new(s: &str) -> Self {
        Self(s.to_string())
    }

    /// Mint a fresh identity for a new session.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4().simple().to_string().to_uppercase())
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for PlayerId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Short shareable game code.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct GameId(String);

impl GameId {
    #[must_use]
    pub fn new(s: &str) -> Self {
        Self(s.to_string())
    }

    pub(crate) fn random() -> Self {
        let mut rng = rand::rng();
        let code = (0..GAME_ID_LENGTH)
            .map(|_| GAME_ID_ALPHABET[rng.random_range(0..GAME_ID_ALPHABET.len())] as char)
            .collect();
        Self(code)
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for GameId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Lifecycle of a game. `Finished` is transient: the registry drops a
/// finished game right after handing out its final snapshot.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum GameState {
    Idle,
    Active,
    Finished,
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Idle => "idle",
            Self::Active => "active",
            Self::Finished => "finished",
        };
        write!(f, "{repr}")
    }
}

/// One seat in a game view, in turn order.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PlayerView {
    pub id: PlayerId,
    pub hand: Vec<Card>,
}

/// Fully-resolved snapshot of a game, built field by field from the
/// authoritative state. Holds plain copies only, so it stays valid after
/// the game lock is released and is safe to hand to the broadcast loop.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct GameView {
    pub version: u32,
    pub id: GameId,
    pub state: GameState,
    pub host: PlayerId,
    pub players: Vec<PlayerView>,
    pub players_max: usize,
    pub turn: Option<PlayerId>,
    pub reverse: bool,
    pub override_color: Option<Color>,
    pub drawn: bool,
    pub deck: Vec<Card>,
    pub discard: Vec<Card>,
}

impl GameView {
    /// Serialize for the broadcast transport.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_deck_has_108_cards() {
        assert_eq!(Deck::default().len(), DECK_SIZE);
    }

    #[test]
    fn test_deck_has_eight_jokers() {
        let deck = Deck::default();
        let jokers = deck.cards().iter().filter(|c| c.kind.is_joker()).count();
        assert_eq!(jokers, 8);
        let wilds = deck
            .cards()
            .iter()
            .filter(|c| c.kind == CardKind::Wild)
            .count();
        assert_eq!(wilds, 4);
    }

    #[test]
    fn test_deck_zero_counts() {
        let deck = Deck::default();
        let mut zeros: HashMap<Color, usize> = HashMap::new();
        for card in deck.cards() {
            if card.kind == CardKind::Number && card.value == Some(0) {
                *zeros.entry(card.color).or_default() += 1;
            }
        }
        assert_eq!(zeros.len(), 4);
        assert!(zeros.values().all(|&n| n == 1));
    }

    #[test]
    fn test_deck_number_counts() {
        let deck = Deck::default();
        for color in [Color::Red, Color::Yellow, Color::Blue, Color::Green] {
            for value in 1..=9u8 {
                let count = deck
                    .cards()
                    .iter()
                    .filter(|c| c.color == color && c.value == Some(value))
                    .count();
                assert_eq!(count, 2, "{color} {value}");
            }
        }
    }

    #[test]
    fn test_shuffle_preserves_cards() {
        let mut deck = Deck::default();
        let mut before = deck.cards().to_vec();
        deck.shuffle();
        let mut after = deck.cards().to_vec();
        before.sort();
        after.sort();
        assert_eq!(before, after);
    }

    #[test]
    fn test_draw_pops_from_end() {
        let mut deck = Deck::default();
        let expected = *deck.cards().last().unwrap();
        assert_eq!(deck.draw(), Some(expected));
        assert_eq!(deck.len(), DECK_SIZE - 1);
    }

    #[test]
    fn test_draw_n_moves_cards() {
        let mut deck = Deck::default();
        let mut hand = Vec::new();
        assert!(deck.draw_n(&mut hand, 4));
        assert_eq!(hand.len(), 4);
        assert_eq!(deck.len(), DECK_SIZE - 4);
    }

    #[test]
    fn test_draw_n_reports_exhaustion() {
        let mut deck = Deck::default();
        let mut hand = Vec::new();
        assert!(!deck.draw_n(&mut hand, DECK_SIZE + 1));
        assert_eq!(hand.len(), DECK_SIZE);
        assert!(deck.is_empty());
    }

    #[test]
    fn test_deal_hand_has_extra_wild() {
        let mut deck = Deck::default();
        let hand = deck.deal_hand().unwrap();
        assert_eq!(hand.len(), HAND_SIZE + 1);
        assert_eq!(hand.last().copied(), Some(Card::wild(CardKind::Wild)));
        // Only seven cards actually left the deck.
        assert_eq!(deck.len(), DECK_SIZE - HAND_SIZE);
    }

    #[test]
    fn test_first_number_is_red_zero() {
        let mut deck = Deck::default();
        let seed = deck.take_first_number().unwrap();
        assert_eq!(seed, Card::number(Color::Red, 0));
        assert_eq!(deck.len(), DECK_SIZE - 1);
    }

    #[test]
    fn test_game_id_format() {
        let id = GameId::random();
        let code = id.to_string();
        assert_eq!(code.len(), GAME_ID_LENGTH);
        assert!(code.bytes().all(|b| GAME_ID_ALPHABET.contains(&b)));
    }

    #[test]
    fn test_player_ids_are_unique() {
        assert_ne!(PlayerId::random(), PlayerId::random());
    }

    #[test]
    fn test_card_display() {
        assert_eq!(Card::number(Color::Red, 7).to_string(), "red 7");
        assert_eq!(
            Card::wild(CardKind::WildDrawFour).to_string(),
            "wild wild draw four"
        );
        assert_eq!(
            Card::action(Color::Blue, CardKind::Skip).to_string(),
            "blue skip"
        );
    }
}
