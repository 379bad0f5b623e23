use super::card::Card;
use super::rank::Rank;
use super::ranking::Ranking;
use super::suit::Suit;

const WHEEL: u16 = 0b_1000000001111;

/// A hand's showdown strength.
///
/// Built from up to seven cards by searching bitwise for the best
/// `Ranking`, then filling kickers from the ranks that ranking leaves
/// unused. Ordering compares ranking first, then kickers high to low.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Strength {
    value: Ranking,
    kicks: Vec<Rank>,
}

impl Strength {
    pub fn ranking(&self) -> Ranking {
        self.value
    }
    pub fn kickers(&self) -> &[Rank] {
        &self.kicks
    }
}

impl From<&[Card]> for Strength {
    fn from(cards: &[Card]) -> Self {
        let eval = Evaluator::from(cards);
        let value = eval.find_ranking();
        let kicks = eval.find_kickers(value);
        Self { value, kicks }
    }
}

impl std::fmt::Display for Strength {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// Bitmask view of a set of cards: per-rank counts and per-suit rank masks.
struct Evaluator {
    counts: [u8; 13],
    suits: [u16; 4],
    ranks: u16,
}

impl From<&[Card]> for Evaluator {
    fn from(cards: &[Card]) -> Self {
        let mut counts = [0u8; 13];
        let mut suits = [0u16; 4];
        for card in cards {
            counts[u8::from(card.rank()) as usize] += 1;
            suits[u8::from(card.suit()) as usize] |= u16::from(card.rank());
        }
        let ranks = suits.iter().fold(0, |acc, s| acc | s);
        Self {
            counts,
            suits,
            ranks,
        }
    }
}

impl Evaluator {
    fn find_ranking(&self) -> Ranking {
        None.or_else(|| self.find_straight_flush())
            .or_else(|| self.find_4_oak())
            .or_else(|| self.find_3_oak_2_oak())
            .or_else(|| self.find_flush())
            .or_else(|| self.find_straight())
            .or_else(|| self.find_3_oak())
            .or_else(|| self.find_2_oak_2_oak())
            .or_else(|| self.find_2_oak())
            .unwrap_or(Ranking::HighCard(Rank::top(self.ranks).unwrap_or_default()))
    }
    fn find_kickers(&self, value: Ranking) -> Vec<Rank> {
        let (pool, used) = match value {
            Ranking::HighCard(r) | Ranking::OnePair(r) | Ranking::ThreeOAK(r) | Ranking::FourOAK(r) => {
                (self.ranks, u16::from(r))
            }
            Ranking::TwoPair(hi, lo) => (self.ranks, u16::from(hi) | u16::from(lo)),
            Ranking::Flush(r) => (
                self.find_suit_of_flush()
                    .map(|s| self.suits[u8::from(s) as usize])
                    .unwrap_or_default(),
                u16::from(r),
            ),
            _ => (0, 0),
        };
        let mut bits = pool & !used;
        let mut kicks = Vec::with_capacity(value.n_kickers());
        while kicks.len() < value.n_kickers() {
            match Rank::top(bits) {
                Some(rank) => {
                    bits &= !u16::from(rank);
                    kicks.push(rank);
                }
                None => break,
            }
        }
        kicks
    }

    fn find_2_oak(&self) -> Option<Ranking> {
        self.find_rank_of_n_oak(2, None).map(Ranking::OnePair)
    }
    fn find_3_oak(&self) -> Option<Ranking> {
        self.find_rank_of_n_oak(3, None).map(Ranking::ThreeOAK)
    }
    fn find_4_oak(&self) -> Option<Ranking> {
        self.find_rank_of_n_oak(4, None).map(Ranking::FourOAK)
    }
    fn find_2_oak_2_oak(&self) -> Option<Ranking> {
        self.find_rank_of_n_oak(2, None).and_then(|hi| {
            self.find_rank_of_n_oak(2, Some(hi))
                .map(|lo| Ranking::TwoPair(hi, lo))
        })
    }
    fn find_3_oak_2_oak(&self) -> Option<Ranking> {
        self.find_rank_of_n_oak(3, None).and_then(|triple| {
            self.find_rank_of_n_oak(2, Some(triple))
                .map(|paired| Ranking::FullHouse(triple, paired))
        })
    }
    fn find_straight(&self) -> Option<Ranking> {
        Self::find_rank_of_straight(self.ranks).map(Ranking::Straight)
    }
    fn find_flush(&self) -> Option<Ranking> {
        self.find_suit_of_flush()
            .and_then(|suit| Rank::top(self.suits[u8::from(suit) as usize]))
            .map(Ranking::Flush)
    }
    fn find_straight_flush(&self) -> Option<Ranking> {
        self.find_suit_of_flush()
            .and_then(|suit| Self::find_rank_of_straight(self.suits[u8::from(suit) as usize]))
            .map(Ranking::StraightFlush)
    }

    fn find_rank_of_straight(ranks: u16) -> Option<Rank> {
        let mut bits = ranks;
        bits &= bits << 1;
        bits &= bits << 1;
        bits &= bits << 1;
        bits &= bits << 1;
        if bits > 0 {
            Rank::top(bits)
        } else if WHEEL == (WHEEL & ranks) {
            Some(Rank::Five)
        } else {
            None
        }
    }
    fn find_suit_of_flush(&self) -> Option<Suit> {
        Suit::all()
            .into_iter()
            .find(|s| self.suits[u8::from(*s) as usize].count_ones() >= 5)
    }
    fn find_rank_of_n_oak(&self, n: u8, skip: Option<Rank>) -> Option<Rank> {
        Rank::all()
            .into_iter()
            .rev()
            .filter(|r| Some(*r) != skip)
            .find(|r| self.counts[u8::from(*r) as usize] >= n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strength(s: &str) -> Strength {
        let cards = s
            .split_whitespace()
            .map(|c| Card::try_from(c).unwrap())
            .collect::<Vec<_>>();
        Strength::from(cards.as_slice())
    }

    #[rustfmt::skip]
    #[test]
    fn high_card() {
        let s = strength("As Kh Qd Jc 9s 3d 2c");
        assert_eq!(s.ranking(), Ranking::HighCard(Rank::Ace));
        assert_eq!(s.kickers(), &[Rank::King, Rank::Queen, Rank::Jack, Rank::Nine]);
    }

    #[test]
    fn two_pair_uses_best_kicker() {
        let s = strength("As Ah Kd Kc Qs Qh 2c");
        assert_eq!(s.ranking(), Ranking::TwoPair(Rank::Ace, Rank::King));
        assert_eq!(s.kickers(), &[Rank::Queen]);
    }

    #[test]
    fn full_house_beats_flush() {
        let boat = strength("As Ah Ad Kc Ks 2h 3h");
        let flush = strength("2h 5h 7h 9h Jh Ac Kd");
        assert_eq!(boat.ranking(), Ranking::FullHouse(Rank::Ace, Rank::King));
        assert_eq!(flush.ranking(), Ranking::Flush(Rank::Jack));
        assert!(boat > flush);
    }

    #[test]
    fn wheel_is_five_high() {
        let s = strength("As 2d 3c 4h 5s Kd Qc");
        assert_eq!(s.ranking(), Ranking::Straight(Rank::Five));
        assert!(strength("2d 3c 4h 5s 6s Kd Qc") > s);
    }

    #[test]
    fn straight_flush() {
        let s = strength("9s Ts Js Qs Ks 2d 3c");
        assert_eq!(s.ranking(), Ranking::StraightFlush(Rank::King));
    }

    #[test]
    fn kickers_break_ties() {
        let hi = strength("As Ad Kc 9h 7s 4d 2c");
        let lo = strength("Ac Ah Qc 9d 7c 4s 2d");
        assert!(hi > lo);
        assert_eq!(strength("As Ad Kc 9h 7s 4d 2c"), strength("Ac Ah Kd 9c 7d 4s 2h"));
    }
}
