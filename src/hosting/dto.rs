use crate::Chips;
use crate::gameroom::GameConfig;
use crate::gameroom::Opponent;
use crate::gameroom::PlayerView;
use crate::gameroom::Status;
use crate::inference::Model;
use serde::Deserialize;
use serde::Serialize;

/// Body of `POST /api/sessions`. Omitted parameters use the server defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSession {
    pub opponents: Vec<Opponent>,
    pub starting_stack: Option<Chips>,
    pub small_blind: Option<Chips>,
    pub big_blind: Option<Chips>,
    pub num_hands: Option<usize>,
    pub turn_timeout_seconds: Option<u64>,
}

impl CreateSession {
    pub fn config(&self, defaults: &GameConfig) -> GameConfig {
        GameConfig {
            starting_stack: self.starting_stack.unwrap_or(defaults.starting_stack),
            small_blind: self.small_blind.unwrap_or(defaults.small_blind),
            big_blind: self.big_blind.unwrap_or(defaults.big_blind),
            num_hands: self.num_hands.unwrap_or(defaults.num_hands),
            turn_timeout_seconds: self.turn_timeout_seconds.unwrap_or(defaults.turn_timeout_seconds),
            hand_pause_ms: defaults.hand_pause_ms,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Created {
    pub session_id: String,
    pub websocket_url: String,
    pub players: Vec<PlayerView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub session_id: String,
    pub status: Status,
    pub hand_number: usize,
    pub stacks: Vec<Chips>,
    pub connections: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Models {
    pub models: Vec<Model>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub inference: bool,
    pub sessions: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_fall_back_to_defaults() {
        let body = serde_json::from_str::<CreateSession>(
            r#"{"opponents":[{"name":"Ada","model":"qwen3:8b"}],"num_hands":3}"#,
        )
        .unwrap();
        let config = body.config(&GameConfig::default());
        assert_eq!(config.num_hands, 3);
        assert_eq!(config.starting_stack, crate::STACK);
        assert_eq!(body.opponents[0].temperature, crate::TEMPERATURE);
    }
}
