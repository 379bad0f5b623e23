use crate::Chips;
use crate::Position;
use crate::cards::Card;
use std::collections::BTreeMap;

/// Outcome of one round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settlement {
    /// Seats awarded chips, in seat order.
    pub winners: Vec<Position>,
    /// Chips awarded, parallel to `winners`.
    pub amounts: Vec<Chips>,
    /// Hole cards shown down, keyed by seat.
    pub revealed: BTreeMap<Position, Vec<Card>>,
    /// Every seat's stack after the pot is pushed.
    pub stacks: Vec<Chips>,
}
