use crate::Chips;
use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Fold,
    Check,
    Call,
    Raise,
    AllIn,
}

impl TryFrom<&str> for ActionKind {
    type Error = String;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s.trim().to_lowercase().as_str() {
            "fold" => Ok(Self::Fold),
            "check" => Ok(Self::Check),
            "call" => Ok(Self::Call),
            "raise" => Ok(Self::Raise),
            "all_in" => Ok(Self::AllIn),
            other => Err(format!("unknown action type: {}", other)),
        }
    }
}

/// A decision submitted for the current actor.
///
/// `Raise` carries the total the actor is raising to on this street.
/// `AllIn` may carry the actor's stack for display; engines ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub action_type: ActionKind,
    #[serde(default)]
    pub amount: Option<Chips>,
}

impl Action {
    pub fn fold() -> Self {
        Self::from(ActionKind::Fold)
    }
    pub fn check() -> Self {
        Self::from(ActionKind::Check)
    }
    pub fn call() -> Self {
        Self::from(ActionKind::Call)
    }
    pub fn raise(to: Chips) -> Self {
        Self {
            action_type: ActionKind::Raise,
            amount: Some(to),
        }
    }
    pub fn shove(stack: Chips) -> Self {
        Self {
            action_type: ActionKind::AllIn,
            amount: Some(stack),
        }
    }
    pub fn kind(&self) -> ActionKind {
        self.action_type
    }
}

impl From<ActionKind> for Action {
    fn from(action_type: ActionKind) -> Self {
        Self {
            action_type,
            amount: None,
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match (self.action_type, self.amount) {
            (ActionKind::Fold, _) => write!(f, "Fold"),
            (ActionKind::Check, _) => write!(f, "Check"),
            (ActionKind::Call, _) => write!(f, "Call"),
            (ActionKind::Raise, Some(n)) => write!(f, "Raise {}", n),
            (ActionKind::Raise, None) => write!(f, "Raise"),
            (ActionKind::AllIn, Some(n)) => write!(f, "All-in {}", n),
            (ActionKind::AllIn, None) => write!(f, "All-in"),
        }
    }
}
