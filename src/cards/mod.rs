//! Cards, dealing, and seven-card hand evaluation.
//!
//! - [`Card`] - a `(Rank, Suit)` pair encoded in one byte
//! - [`Deck`] - a shuffled 52-card stack for dealing
//! - [`Street`] - preflop, flop, turn, river
//! - [`Strength`] - evaluated [`Ranking`] with kicker resolution
mod card;
mod deck;
mod rank;
mod ranking;
mod street;
mod strength;
mod suit;

pub use card::*;
pub use deck::*;
pub use rank::*;
pub use ranking::*;
pub use street::*;
pub use strength::*;
pub use suit::*;
