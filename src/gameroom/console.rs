use super::*;
use crate::HUMAN;
use crate::engine::Legal;
use colored::*;
use std::io::Write;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use tokio::sync::mpsc;

/// One `your_turn` prompt, numbered in arrival order from 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Turn {
    pub number: u64,
    pub legal: Legal,
}

/// Terminal observer for local play.
///
/// Prints every event as one colored line, streaming thinking tokens in
/// place. `your_turn` prompts are forwarded to whoever holds the receiver
/// returned by `new`, so input can be gathered off the async runtime.
/// A turn stops being live when the timer acts for it or the session ends.
pub struct Console {
    turns: mpsc::UnboundedSender<Turn>,
    issued: AtomicU64,
    live: AtomicU64,
}

impl Console {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Turn>) {
        let (turns, rx) = mpsc::unbounded_channel();
        let console = Self {
            turns,
            issued: AtomicU64::new(0),
            live: AtomicU64::new(0),
        };
        (console, rx)
    }

    /// Whether an answer to turn `number` may still be submitted.
    pub fn is_live(&self, number: u64) -> bool {
        number != 0 && self.live.load(Ordering::SeqCst) == number
    }

    fn track(&self, event: &Event) -> Option<Turn> {
        match event {
            Event::YourTurn { available_actions } => {
                let number = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
                self.live.store(number, Ordering::SeqCst);
                Some(Turn {
                    number,
                    legal: *available_actions,
                })
            }
            Event::TimerExpired { player_id: HUMAN, .. } | Event::SessionComplete { .. } => {
                self.live.store(0, Ordering::SeqCst);
                None
            }
            _ => None,
        }
    }

    fn render(event: &Event) -> Option<String> {
        match event {
            Event::ConnectionAck { session_id, .. } => {
                Some(format!("{}", format!("joined session {}", session_id).dimmed()))
            }
            Event::GameState { state } => Some(format!(
                "{}\n{}",
                format!("HAND {}", state.hand_number).bold(),
                state
                    .players
                    .iter()
                    .map(|p| {
                        let hole = p
                            .hole_cards
                            .as_ref()
                            .filter(|h| !h.is_empty())
                            .map(|h| h.iter().map(|c| c.to_string()).collect::<Vec<_>>().join(" "))
                            .unwrap_or_default();
                        format!("  P{} {:<12} {:>7} {}", p.id, p.name, p.stack, hole.white())
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            )),
            Event::GameStateUpdate(update) => {
                let board = update
                    .community_cards
                    .iter()
                    .map(|c| c.to_string())
                    .collect::<Vec<_>>()
                    .join(" ");
                Some(format!(
                    "{}",
                    format!("{:<8} pot {:>6}  {}", update.street, update.pot, board).white()
                ))
            }
            Event::YourTurn { available_actions } => Some(format!(
                "{}",
                format!(
                    "YOUR TURN  call {}  raise {}..{}",
                    available_actions.call_amount, available_actions.min_raise, available_actions.max_raise
                )
                .green()
                .bold()
            )),
            Event::TimerStart { total_seconds, .. } => {
                Some(format!("{}", format!("{}s to act", total_seconds).yellow()))
            }
            Event::TimerTick { .. } => None,
            Event::TimerExpired { action_taken, .. } => {
                Some(format!("{}", format!("time's up, {}", action_taken).red()))
            }
            Event::ThinkingStart { player_name, .. } => {
                Some(format!("{}", format!("{} is thinking", player_name).cyan()))
            }
            Event::ThinkingToken { .. } => None,
            Event::ThinkingComplete { player_id, action, .. } => {
                Some(format!("\nP{} {}", player_id, format!("{}", action).cyan().bold()))
            }
            Event::HandComplete { winners, amounts, .. } => Some(format!(
                "{}",
                format!("winners {:?} take {:?}", winners, amounts).magenta()
            )),
            Event::SessionComplete {
                final_stacks,
                hands_played,
            } => Some(format!(
                "{}",
                format!("{} hands played, final stacks {:?}", hands_played, final_stacks)
                    .magenta()
                    .bold()
            )),
            Event::Error { code, message } => {
                Some(format!("{}", format!("{}: {}", code, message).red()))
            }
            Event::Pong => None,
        }
    }
}

#[async_trait::async_trait]
impl Connection for Console {
    async fn send(&self, event: &Event) -> anyhow::Result<()> {
        if let Event::ThinkingToken { token, .. } = event {
            let mut out = std::io::stdout();
            write!(out, "{}", token.dimmed())?;
            out.flush()?;
        }
        if let Some(line) = Self::render(event) {
            println!("{}", line);
        }
        if let Some(turn) = self.track(event) {
            self.turns.send(turn)?;
        }
        Ok(())
    }
    async fn close(&self) -> anyhow::Result<()> {
        self.live.store(0, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Action;

    fn your_turn() -> Event {
        Event::YourTurn {
            available_actions: Legal::default(),
        }
    }

    #[tokio::test]
    async fn turns_are_numbered_and_retired() {
        let (console, mut turns) = Console::new();
        console.send(&your_turn()).await.unwrap();
        let first = turns.recv().await.unwrap();
        assert_eq!(first.number, 1);
        assert!(console.is_live(1));

        let expired = Event::TimerExpired {
            player_id: HUMAN,
            action_taken: Action::check().to_string().to_lowercase(),
        };
        console.send(&expired).await.unwrap();
        assert!(!console.is_live(1));

        console.send(&your_turn()).await.unwrap();
        assert_eq!(turns.recv().await.unwrap().number, 2);
        assert!(!console.is_live(1));
        assert!(console.is_live(2));
    }

    #[tokio::test]
    async fn session_end_retires_the_open_turn() {
        let (console, _turns) = Console::new();
        console.send(&your_turn()).await.unwrap();
        console
            .send(&Event::SessionComplete {
                final_stacks: vec![10_000, 10_000],
                hands_played: 1,
            })
            .await
            .unwrap();
        assert!(!console.is_live(1));
    }
}
