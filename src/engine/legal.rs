use super::action::Action;
use crate::Chips;
use serde::Serialize;

/// The legal-action set offered to the current actor.
///
/// `min_raise` and `max_raise` are raise-to totals for the street.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Legal {
    pub can_fold: bool,
    pub can_check: bool,
    pub can_call: bool,
    pub call_amount: Chips,
    pub can_raise: bool,
    pub min_raise: Chips,
    pub max_raise: Chips,
}

impl Legal {
    /// Check when it costs nothing, otherwise fold.
    pub fn passive(&self) -> Action {
        if self.can_check {
            Action::check()
        } else {
            Action::fold()
        }
    }
}
