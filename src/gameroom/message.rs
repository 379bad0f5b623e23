use crate::Chips;
use crate::engine::Action;
use crate::engine::ActionKind;
use serde::Deserialize;

/// Errors reported back to the connection that caused them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    InvalidJson(String),
    InvalidAction(String),
    NotYourTurn,
}

impl ProtocolError {
    /// Wire code carried by the resulting `error` event.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidJson(_) => "invalid_json",
            Self::InvalidAction(_) => "invalid_action",
            Self::NotYourTurn => "not_your_turn",
        }
    }
}

impl std::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidJson(s) => write!(f, "invalid message: {}", s),
            Self::InvalidAction(s) => write!(f, "invalid action: {}", s),
            Self::NotYourTurn => write!(f, "no action is pending for you"),
        }
    }
}

impl std::error::Error for ProtocolError {}

/// Messages a client may send over its connection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    PlayerAction {
        action_type: String,
        #[serde(default)]
        amount: Option<Chips>,
    },
    StartHand,
    EndSession,
    Ping,
}

impl ClientMessage {
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(|e| ProtocolError::InvalidJson(e.to_string()))
    }
}

/// Maps a submitted `action_type`/`amount` pair onto an engine action.
pub fn action(action_type: &str, amount: Option<Chips>) -> Result<Action, ProtocolError> {
    let kind = ActionKind::try_from(action_type).map_err(ProtocolError::InvalidAction)?;
    Ok(Action {
        action_type: kind,
        amount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_each_message() {
        assert_eq!(
            ClientMessage::decode(r#"{"type":"player_action","action_type":"raise","amount":300}"#),
            Ok(ClientMessage::PlayerAction {
                action_type: "raise".to_string(),
                amount: Some(300)
            })
        );
        assert_eq!(ClientMessage::decode(r#"{"type":"start_hand"}"#), Ok(ClientMessage::StartHand));
        assert_eq!(ClientMessage::decode(r#"{"type":"end_session"}"#), Ok(ClientMessage::EndSession));
        assert_eq!(ClientMessage::decode(r#"{"type":"ping"}"#), Ok(ClientMessage::Ping));
    }

    #[test]
    fn rejects_garbage() {
        let err = ClientMessage::decode("{not json").unwrap_err();
        assert_eq!(err.code(), "invalid_json");
        assert!(ClientMessage::decode(r#"{"type":"dance"}"#).is_err());
    }

    #[test]
    fn maps_action_types() {
        assert_eq!(action("Check", None), Ok(Action::check()));
        assert_eq!(action("raise", Some(400)), Ok(Action::raise(400)));
        assert_eq!(action("limp", None).unwrap_err().code(), "invalid_action");
    }
}
