use crate::Chips;
use crate::Position;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Kind {
    #[serde(rename = "human")]
    Human,
    #[serde(rename = "llm")]
    Agent,
}

/// A seat at the table, stable for the life of the session.
/// Chip fields mirror the rules engine after every applied operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Participant {
    pub id: Position,
    pub name: String,
    pub kind: Kind,
    pub model: Option<String>,
    pub temperature: f32,
    pub stack: Chips,
    pub bet: Chips,
    pub active: bool,
    pub last_action: Option<String>,
}

impl Participant {
    pub fn human(stack: Chips) -> Self {
        Self {
            id: crate::HUMAN,
            name: "You".to_string(),
            kind: Kind::Human,
            model: None,
            temperature: crate::TEMPERATURE,
            stack,
            bet: 0,
            active: true,
            last_action: None,
        }
    }
    pub fn agent(id: Position, opponent: &super::Opponent, stack: Chips) -> Self {
        Self {
            id,
            name: opponent.name.clone(),
            kind: Kind::Agent,
            model: Some(opponent.model.clone()).filter(|m| !m.trim().is_empty()),
            temperature: opponent.temperature,
            stack,
            bet: 0,
            active: true,
            last_action: None,
        }
    }
    pub fn is_human(&self) -> bool {
        self.kind == Kind::Human
    }
    pub fn is_busted(&self) -> bool {
        self.stack <= 0 && self.bet <= 0
    }
}
