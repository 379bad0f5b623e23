use crate::Chips;
use serde::Deserialize;
use std::time::Duration;

/// An LLM opponent requested for a session.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Opponent {
    pub name: String,
    pub model: String,
    #[serde(default = "defaults::temperature")]
    pub temperature: f32,
}

/// Per-session game parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GameConfig {
    #[serde(default = "defaults::stack")]
    pub starting_stack: Chips,
    #[serde(default = "defaults::s_blind")]
    pub small_blind: Chips,
    #[serde(default = "defaults::b_blind")]
    pub big_blind: Chips,
    #[serde(default = "defaults::hands")]
    pub num_hands: usize,
    #[serde(default = "defaults::timeout")]
    pub turn_timeout_seconds: u64,
    #[serde(default = "defaults::pause")]
    pub hand_pause_ms: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            starting_stack: crate::STACK,
            small_blind: crate::S_BLIND,
            big_blind: crate::B_BLIND,
            num_hands: crate::HANDS,
            turn_timeout_seconds: crate::TURN_TIMEOUT,
            hand_pause_ms: crate::HAND_PAUSE.as_millis() as u64,
        }
    }
}

impl GameConfig {
    pub fn turn_timeout(&self) -> Duration {
        Duration::from_secs(self.turn_timeout_seconds)
    }
    pub fn hand_pause(&self) -> Duration {
        Duration::from_millis(self.hand_pause_ms)
    }
    pub fn validate(&self, opponents: &[Opponent]) -> Result<(), ConfigError> {
        if opponents.is_empty() || opponents.len() > crate::MAX_OPPONENTS {
            return Err(ConfigError::Opponents(opponents.len()));
        }
        if self.small_blind <= 0 || self.big_blind < self.small_blind {
            return Err(ConfigError::Blinds(self.small_blind, self.big_blind));
        }
        if self.starting_stack < self.big_blind {
            return Err(ConfigError::Stack(self.starting_stack));
        }
        if self.num_hands == 0 {
            return Err(ConfigError::Hands);
        }
        if self.turn_timeout_seconds > crate::MAX_TURN_TIMEOUT {
            return Err(ConfigError::Timeout(self.turn_timeout_seconds));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    Opponents(usize),
    Blinds(Chips, Chips),
    Stack(Chips),
    Hands,
    Timeout(u64),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Opponents(n) => write!(
                f,
                "must have 1-{} opponents, got {}",
                crate::MAX_OPPONENTS,
                n
            ),
            Self::Blinds(sb, bb) => write!(f, "invalid blinds {}/{}", sb, bb),
            Self::Stack(s) => write!(f, "starting stack {} is below the big blind", s),
            Self::Hands => write!(f, "must play at least one hand"),
            Self::Timeout(t) => write!(
                f,
                "turn timeout {}s exceeds {}s",
                t,
                crate::MAX_TURN_TIMEOUT
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

mod defaults {
    use crate::Chips;
    pub fn temperature() -> f32 {
        crate::TEMPERATURE
    }
    pub fn stack() -> Chips {
        crate::STACK
    }
    pub fn s_blind() -> Chips {
        crate::S_BLIND
    }
    pub fn b_blind() -> Chips {
        crate::B_BLIND
    }
    pub fn hands() -> usize {
        crate::HANDS
    }
    pub fn timeout() -> u64 {
        crate::TURN_TIMEOUT
    }
    pub fn pause() -> u64 {
        crate::HAND_PAUSE.as_millis() as u64
    }
}
