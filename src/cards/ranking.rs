use super::rank::Rank;

/// A poker hand's category, ordered weakest to strongest.
/// Kickers break ties within a category; see `Strength`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, PartialOrd, Ord)]
pub enum Ranking {
    HighCard(Rank),        // 4 kickers
    OnePair(Rank),         // 3 kickers
    TwoPair(Rank, Rank),   // 1 kickers
    ThreeOAK(Rank),        // 2 kickers
    Straight(Rank),        // 0 kickers
    Flush(Rank),           // 4 kickers
    FullHouse(Rank, Rank), // 0 kickers
    FourOAK(Rank),         // 1 kickers
    StraightFlush(Rank),   // 0 kickers
}

impl Ranking {
    pub fn n_kickers(&self) -> usize {
        match self {
            Ranking::HighCard(_) | Ranking::Flush(_) => 4,
            Ranking::OnePair(_) => 3,
            Ranking::ThreeOAK(_) => 2,
            Ranking::FourOAK(_) | Ranking::TwoPair(_, _) => 1,
            _ => 0,
        }
    }
}

impl std::fmt::Display for Ranking {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Ranking::HighCard(r) => write!(f, "High Card {}", r),
            Ranking::OnePair(r) => write!(f, "Pair of {}", r),
            Ranking::TwoPair(hi, lo) => write!(f, "Two Pair {}{}", hi, lo),
            Ranking::ThreeOAK(r) => write!(f, "Three of a Kind {}", r),
            Ranking::Straight(r) => write!(f, "Straight to {}", r),
            Ranking::Flush(r) => write!(f, "Flush {} high", r),
            Ranking::FullHouse(hi, lo) => write!(f, "Full House {}{}", hi, lo),
            Ranking::FourOAK(r) => write!(f, "Four of a Kind {}", r),
            Ranking::StraightFlush(r) => write!(f, "Straight Flush to {}", r),
        }
    }
}
