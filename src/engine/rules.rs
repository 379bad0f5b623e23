use super::action::Action;
use super::legal::Legal;
use super::seat::Seat;
use super::settlement::Settlement;
use crate::Chips;
use crate::Position;
use crate::cards::Card;
use crate::cards::Street;

/// Errors a rules engine reports back to the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RulesError {
    /// Fewer than two seats have chips.
    Shorthanded,
    /// An action or settlement was requested with no hand to act in.
    NoHand,
    /// The action is not allowed for the current actor.
    Illegal(String),
    /// The deck ran out while dealing.
    DeckExhausted,
    /// Settlement was requested before the hand concluded.
    Unfinished,
}

impl std::fmt::Display for RulesError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Shorthanded => write!(f, "fewer than two funded seats"),
            Self::NoHand => write!(f, "no hand in progress"),
            Self::Illegal(s) => write!(f, "illegal action: {}", s),
            Self::DeckExhausted => write!(f, "deck exhausted"),
            Self::Unfinished => write!(f, "hand has not concluded"),
        }
    }
}

impl std::error::Error for RulesError {}

/// Read-only view of the table after the latest operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub hand: usize,
    pub street: Street,
    pub pot: Chips,
    pub board: Vec<Card>,
    pub button: Position,
    pub actor: Option<Position>,
    pub seats: Vec<Seat>,
}

/// A game's rules, driven one operation at a time by the session.
///
/// The session calls `begin` once per round, then alternates between
/// `deal` (when no actor is due) and `legal`/`apply` (when one is) until
/// `concluded`, and finally `settle`.
pub trait Rules: Send + Sync {
    /// Starts a new round with the given stacks, one per seat.
    fn begin(&mut self, stacks: &[Chips]) -> Result<(), RulesError>;
    /// The seat due to act, if any.
    fn actor(&self) -> Option<Position>;
    /// The legal-action set for the due actor.
    fn legal(&self) -> Option<Legal>;
    /// Applies an action for the due actor.
    fn apply(&mut self, action: &Action) -> Result<(), RulesError>;
    /// Whether the round is over and ready to settle.
    fn concluded(&self) -> bool;
    /// Deals the next shared cards. `Ok(None)` when nothing is due.
    fn deal(&mut self) -> Result<Option<Street>, RulesError>;
    /// Distributes the pot and reports the outcome.
    fn settle(&mut self) -> Result<Settlement, RulesError>;
    /// Snapshot for broadcasting and prompting.
    fn table(&self) -> Table;
}
