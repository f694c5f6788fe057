//! Generative checks for deck composition and turn-order invariants.

use proptest::prelude::*;

use uno_engine::{Color, Deck, GameRegistry, PlayerId, constants::DECK_SIZE};

proptest! {
    #[test]
    fn deck_composition_survives_shuffling(shuffles in 0usize..5) {
        let mut deck = Deck::default();
        for _ in 0..shuffles {
            deck.shuffle();
        }

        prop_assert_eq!(deck.len(), DECK_SIZE);
        let jokers = deck.cards().iter().filter(|c| c.kind.is_joker()).count();
        prop_assert_eq!(jokers, 8);
        for color in [Color::Red, Color::Yellow, Color::Blue, Color::Green] {
            let zeros = deck
                .cards()
                .iter()
                .filter(|c| c.color == color && c.value == Some(0))
                .count();
            prop_assert_eq!(zeros, 1);
        }
    }

    #[test]
    fn draw_n_conserves_cards(n in 0usize..=200) {
        let mut deck = Deck::default();
        let mut hand = Vec::new();
        let complete = deck.draw_n(&mut hand, n);

        prop_assert_eq!(complete, n <= DECK_SIZE);
        prop_assert_eq!(hand.len(), n.min(DECK_SIZE));
        prop_assert_eq!(deck.len() + hand.len(), DECK_SIZE);
    }

    /// A full cycle of draw-then-pass turns hands the turn back to
    /// whoever started it, for any table size.
    #[test]
    fn full_pass_cycle_returns_turn(n in 2usize..=8) {
        let registry = GameRegistry::new();
        let host = PlayerId::new("host");
        let view = registry.create(host.clone()).unwrap();
        for i in 1..n {
            registry
                .join(&view.id, PlayerId::new(&format!("guest-{i}")))
                .unwrap();
        }
        let view = registry.start(&view.id, &host).unwrap();
        let origin = view.turn.clone().unwrap();

        let mut current = view;
        for _ in 0..n {
            let actor = current.turn.clone().unwrap();
            let mid = registry.advance(&current.id, &actor, None).unwrap();
            prop_assert!(mid.drawn);
            prop_assert_eq!(mid.turn.as_ref(), Some(&actor));
            current = registry.advance(&current.id, &actor, None).unwrap();
            prop_assert!(!current.drawn);
        }
        prop_assert_eq!(current.turn.as_ref(), Some(&origin));
    }
}
