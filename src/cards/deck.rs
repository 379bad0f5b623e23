use super::card::Card;
use rand::seq::SliceRandom;

/// A stack of cards dealt from the top.
///
/// `Deck::new` shuffles all 52 cards; `Deck::stacked` deals in the given
/// order, which makes hands reproducible in tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deck(Vec<Card>);

impl Default for Deck {
    fn default() -> Self {
        Self::new()
    }
}

impl Deck {
    /// A freshly shuffled 52-card deck.
    pub fn new() -> Self {
        let mut cards = (0..52u8).map(Card::from).collect::<Vec<_>>();
        cards.shuffle(&mut rand::rng());
        Self(cards)
    }
    /// A deck that deals `cards` front to back.
    pub fn stacked(cards: Vec<Card>) -> Self {
        Self(cards.into_iter().rev().collect())
    }
    pub fn size(&self) -> usize {
        self.0.len()
    }
    pub fn draw(&mut self) -> Option<Card> {
        self.0.pop()
    }
    /// Draws `n` cards, or none at all if fewer remain.
    pub fn deal(&mut self, n: usize) -> Option<Vec<Card>> {
        (self.size() >= n).then(|| (0..n).filter_map(|_| self.draw()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn fresh_deck_is_complete() {
        let mut deck = Deck::new();
        let cards = std::iter::from_fn(|| deck.draw()).map(u8::from).collect::<HashSet<_>>();
        assert_eq!(cards.len(), 52);
    }

    #[test]
    fn stacked_deals_in_order() {
        let a = Card::try_from("As").unwrap();
        let k = Card::try_from("Kd").unwrap();
        let mut deck = Deck::stacked(vec![a, k]);
        assert_eq!(deck.draw(), Some(a));
        assert_eq!(deck.draw(), Some(k));
        assert_eq!(deck.draw(), None);
    }

    #[test]
    fn deal_refuses_partial() {
        let mut deck = Deck::stacked(vec![Card::from(0u8)]);
        assert!(deck.deal(2).is_none());
        assert_eq!(deck.size(), 1);
    }
}
