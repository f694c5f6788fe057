//! Game constants.

/// Total number of cards in a freshly built deck.
pub const DECK_SIZE: usize = 108;

/// Number of cards dealt to each hand from the deck. Every hand also
/// receives one ad-hoc wild on top of these (see [`Deck::deal_hand`]).
///
/// [`Deck::deal_hand`]: super::entities::Deck::deal_hand
pub const HAND_SIZE: usize = 7;

/// Table capacity, host included.
pub const MAX_PLAYERS: usize = 8;

/// Length of the short game codes shown to players.
pub const GAME_ID_LENGTH: usize = 5;

/// Alphabet game codes are sampled from.
pub const GAME_ID_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
