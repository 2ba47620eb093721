//! Deck construction — two cards per symbol, shuffled at session start.

use crate::game::card::{Card, CardId, Symbol};
use crate::game::rng::GameRng;

/// Build an unshuffled deck of `pairs` symbol pairs, capped at the fixed set.
/// Card ids are assigned after shuffling, so this only fixes the symbols.
fn paired_symbols(pairs: usize) -> Vec<Symbol> {
    (0..pairs)
        .filter_map(Symbol::nth)
        .flat_map(|s| [s, s])
        .collect()
}

/// Deal a shuffled deck of `2 * pairs` cards. Slot ids follow deck order.
pub fn deal(pairs: usize, rng: &mut GameRng) -> Vec<Card> {
    let mut symbols = paired_symbols(pairs);
    rng.shuffle(&mut symbols);
    symbols
        .into_iter()
        .enumerate()
        .map(|(slot, symbol)| Card::new(CardId(slot), symbol))
        .collect()
}

/// Count cards per symbol, indexed by symbol.
pub fn symbol_counts(cards: &[Card]) -> Vec<usize> {
    let kinds = cards
        .iter()
        .map(|c| c.symbol.index() + 1)
        .max()
        .unwrap_or(0);
    let mut counts = vec![0; kinds];
    for card in cards {
        counts[card.symbol.index()] += 1;
    }
    counts
}
