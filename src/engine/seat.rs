use crate::Chips;
use crate::cards::Card;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Not dealt in this hand.
    Out,
    Betting,
    Folded,
    Shoving,
}

/// One seat's chips and cards within the current hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seat {
    pub stack: Chips,
    /// Chips put in on the current street.
    pub stake: Chips,
    /// Chips put in over the whole hand.
    pub spent: Chips,
    pub hole: Option<[Card; 2]>,
    pub status: Status,
    pub acted: bool,
}

impl Seat {
    pub fn new(stack: Chips) -> Self {
        Self {
            stack,
            stake: 0,
            spent: 0,
            hole: None,
            status: if stack > 0 { Status::Betting } else { Status::Out },
            acted: false,
        }
    }
    /// Still contesting the pot.
    pub fn is_live(&self) -> bool {
        matches!(self.status, Status::Betting | Status::Shoving)
    }
    pub fn is_betting(&self) -> bool {
        self.status == Status::Betting
    }
    /// Moves up to `chips` from stack to pot, returning what was put in.
    pub fn put(&mut self, chips: Chips) -> Chips {
        let chips = chips.min(self.stack).max(0);
        self.stack -= chips;
        self.stake += chips;
        self.spent += chips;
        if self.stack == 0 && self.status == Status::Betting {
            self.status = Status::Shoving;
        }
        chips
    }
}
