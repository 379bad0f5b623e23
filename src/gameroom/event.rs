use super::participant::Kind;
use super::participant::Participant;
use crate::Chips;
use crate::Position;
use crate::cards::Card;
use crate::cards::Street;
use crate::engine::Action;
use crate::engine::Legal;
use crate::engine::Table;
use serde::Serialize;
use std::collections::BTreeMap;

/// One seat as observers see it. Hole cards are only filled in for the
/// human seat, or for every seat in local debugging views.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerView {
    pub id: Position,
    pub name: String,
    pub player_type: Kind,
    pub model: Option<String>,
    pub stack: Chips,
    pub current_bet: Chips,
    pub hole_cards: Option<Vec<Card>>,
    pub is_active: bool,
    pub is_busted: bool,
    pub last_action: Option<String>,
}

/// Full table snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub session_id: String,
    pub hand_number: usize,
    pub street: Street,
    pub pot: Chips,
    pub community_cards: Vec<Card>,
    pub button_position: Position,
    pub current_actor: Option<Position>,
    pub players: Vec<PlayerView>,
    pub available_actions: Option<Legal>,
}

impl PlayerView {
    fn seat(p: &Participant, hole: Option<Vec<Card>>) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            player_type: p.kind,
            model: p.model.clone(),
            stack: p.stack,
            current_bet: p.bet,
            hole_cards: hole,
            is_active: p.active,
            is_busted: p.is_busted(),
            last_action: p.last_action.clone(),
        }
    }
}

impl Snapshot {
    /// The table before the first hand is dealt.
    pub fn opening(session_id: &str, roster: &[Participant]) -> Self {
        Self {
            session_id: session_id.to_string(),
            hand_number: 0,
            street: Street::Preflop,
            pot: 0,
            community_cards: Vec::new(),
            button_position: 0,
            current_actor: None,
            players: roster
                .iter()
                .map(|p| PlayerView::seat(p, p.is_human().then(Vec::new)))
                .collect(),
            available_actions: None,
        }
    }
    /// The table mid-session. Only the human's hole cards are shown, and
    /// legal actions only while the human is due.
    pub fn dealt(session_id: &str, roster: &[Participant], table: &Table, legal: Option<Legal>) -> Self {
        Self {
            session_id: session_id.to_string(),
            hand_number: table.hand,
            street: table.street,
            pot: table.pot,
            community_cards: table.board.clone(),
            button_position: table.button,
            current_actor: table.actor,
            players: roster
                .iter()
                .map(|p| {
                    let hole = p.is_human().then(|| {
                        table
                            .seats
                            .get(p.id)
                            .and_then(|s| s.hole)
                            .map(|h| h.to_vec())
                            .unwrap_or_default()
                    });
                    PlayerView::seat(p, hole)
                })
                .collect(),
            available_actions: legal.filter(|_| table.actor == Some(crate::HUMAN)),
        }
    }
}

/// Incremental table update after a state-changing operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Update {
    pub hand_number: usize,
    pub street: Street,
    pub pot: Chips,
    pub current_actor: Option<Position>,
    pub community_cards: Vec<Card>,
    pub player_stacks: Vec<Chips>,
    pub player_bets: Vec<Chips>,
    pub last_actions: Vec<Option<String>>,
    pub available_actions: Option<Legal>,
}

impl From<&Snapshot> for Update {
    fn from(s: &Snapshot) -> Self {
        Self {
            hand_number: s.hand_number,
            street: s.street,
            pot: s.pot,
            current_actor: s.current_actor,
            community_cards: s.community_cards.clone(),
            player_stacks: s.players.iter().map(|p| p.stack).collect(),
            player_bets: s.players.iter().map(|p| p.current_bet).collect(),
            last_actions: s.players.iter().map(|p| p.last_action.clone()).collect(),
            available_actions: s.available_actions,
        }
    }
}

/// Everything a session tells its observers, in the order it happens.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    ConnectionAck {
        session_id: String,
        player_id: Position,
    },
    GameState {
        state: Snapshot,
    },
    GameStateUpdate(Update),
    YourTurn {
        available_actions: Legal,
    },
    TimerStart {
        player_id: Position,
        total_seconds: u64,
        timestamp: f64,
    },
    TimerTick {
        player_id: Position,
        remaining_seconds: u64,
    },
    TimerExpired {
        player_id: Position,
        action_taken: String,
    },
    ThinkingStart {
        player_id: Position,
        player_name: String,
    },
    ThinkingToken {
        player_id: Position,
        token: String,
        timestamp: f64,
    },
    ThinkingComplete {
        player_id: Position,
        action: Action,
        full_text: String,
        duration_ms: u64,
    },
    HandComplete {
        winners: Vec<Position>,
        amounts: Vec<Chips>,
        revealed_cards: BTreeMap<Position, Vec<Card>>,
    },
    SessionComplete {
        final_stacks: Vec<Chips>,
        hands_played: usize,
    },
    Error {
        code: String,
        message: String,
    },
    Pong,
}

impl Event {
    pub fn error(code: &str, message: impl ToString) -> Self {
        Self::Error {
            code: code.to_string(),
            message: message.to_string(),
        }
    }
    pub fn token(player_id: Position, token: String) -> Self {
        Self::ThinkingToken {
            player_id,
            token,
            timestamp: now(),
        }
    }
    pub fn timer(player_id: Position, total_seconds: u64) -> Self {
        Self::TimerStart {
            player_id,
            total_seconds,
            timestamp: now(),
        }
    }
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Seconds since the unix epoch.
fn now() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Event::ConnectionAck { session_id, .. } => write!(f, "ack {}", session_id),
            Event::GameState { state } => write!(f, "state hand {}", state.hand_number),
            Event::GameStateUpdate(u) => write!(f, "update {} pot {}", u.street, u.pot),
            Event::YourTurn { .. } => write!(f, "your turn"),
            Event::TimerStart { total_seconds, .. } => write!(f, "timer {}s", total_seconds),
            Event::TimerTick { remaining_seconds, .. } => write!(f, "tick {}s", remaining_seconds),
            Event::TimerExpired { action_taken, .. } => write!(f, "expired {}", action_taken),
            Event::ThinkingStart { player_id, .. } => write!(f, "P{} thinking", player_id),
            Event::ThinkingToken { player_id, token, .. } => write!(f, "P{} {:?}", player_id, token),
            Event::ThinkingComplete { player_id, action, .. } => write!(f, "P{} {}", player_id, action),
            Event::HandComplete { winners, .. } => write!(f, "hand won by {:?}", winners),
            Event::SessionComplete { hands_played, .. } => write!(f, "session over after {}", hands_played),
            Event::Error { code, message } => write!(f, "error {}: {}", code, message),
            Event::Pong => write!(f, "pong"),
        }
    }
}
