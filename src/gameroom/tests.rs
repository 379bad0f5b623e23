use super::*;
use crate::ID;
use crate::cards::Street;
use crate::engine::Action;
use crate::engine::Holdem;
use crate::inference::Fragments;
use crate::inference::Inference;
use crate::inference::Model;
use crate::inference::Request;
use futures::StreamExt;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::Duration;

/// Replies by model name: `caller` always calls, `broken` fails partway,
/// `refused` fails before any text, `mute` says nothing.
struct Scripted;

#[async_trait::async_trait]
impl Inference for Scripted {
    async fn stream(&self, request: Request) -> anyhow::Result<Fragments> {
        let items: Vec<anyhow::Result<String>> = match request.model.as_str() {
            "caller" => vec![
                Ok("I'll ".to_string()),
                Ok("just call. ".to_string()),
                Ok("<action>cc</action>".to_string()),
            ],
            "broken" => vec![Ok("hmm ".to_string()), Err(anyhow::anyhow!("connection reset"))],
            "refused" => anyhow::bail!("model not loaded"),
            _ => vec![],
        };
        Ok(futures::stream::iter(items).boxed())
    }
    async fn models(&self) -> anyhow::Result<Vec<Model>> {
        Ok(Vec::new())
    }
    async fn healthy(&self) -> bool {
        true
    }
}

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<Event>>,
    closed: AtomicBool,
}

impl Recorder {
    fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }
    fn count(&self, f: impl Fn(&Event) -> bool) -> usize {
        self.events().iter().filter(|e| f(*e)).count()
    }
    fn position(&self, f: impl Fn(&Event) -> bool) -> Option<usize> {
        self.events().iter().position(f)
    }
    async fn until(&self, f: impl Fn(&Event) -> bool) {
        for _ in 0..10_000 {
            if self.position(&f).is_some() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("event never arrived: {:?}", self.events());
    }
    async fn until_count(&self, n: usize, f: impl Fn(&Event) -> bool) {
        for _ in 0..10_000 {
            if self.count(&f) >= n {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("fewer than {} matching events: {:?}", n, self.events());
    }
}

#[async_trait::async_trait]
impl Connection for Recorder {
    async fn send(&self, event: &Event) -> anyhow::Result<()> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
    async fn close(&self) -> anyhow::Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

fn config(hands: usize, timeout: u64) -> GameConfig {
    GameConfig {
        num_hands: hands,
        turn_timeout_seconds: timeout,
        hand_pause_ms: 0,
        ..GameConfig::default()
    }
}

fn table(models: &[&str], config: GameConfig) -> Arc<Session> {
    traced(models, config, None)
}

fn traced(models: &[&str], config: GameConfig, trace: Option<Arc<Trace>>) -> Arc<Session> {
    let opponents = models
        .iter()
        .enumerate()
        .map(|(i, m)| Opponent {
            name: format!("Bot{}", i + 1),
            model: m.to_string(),
            temperature: crate::TEMPERATURE,
        })
        .collect::<Vec<_>>();
    let rules = Holdem::new(config.small_blind, config.big_blind);
    Session::new(ID::default(), config, &opponents, Box::new(rules), Arc::new(Scripted), trace)
}

async fn observe(session: &Arc<Session>) -> Arc<Recorder> {
    let recorder = Arc::new(Recorder::default());
    session.connect(recorder.clone()).await;
    recorder
}

#[tokio::test(start_paused = true)]
async fn connect_acknowledges_then_snapshots() {
    let session = table(&["caller"], config(1, 30));
    let recorder = observe(&session).await;
    let events = recorder.events();
    assert_eq!(
        events[0],
        Event::ConnectionAck {
            session_id: session.id().to_string(),
            player_id: crate::HUMAN,
        }
    );
    match &events[1] {
        Event::GameState { state } => {
            assert_eq!(state.hand_number, 0);
            assert_eq!(state.players.len(), 2);
            assert_eq!(state.players[0].hole_cards, Some(vec![]));
            assert_eq!(state.players[1].hole_cards, None);
        }
        other => panic!("expected game_state, got {}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn idle_human_is_checked_for_by_the_timer() {
    let session = table(&["caller"], config(1, 1));
    let recorder = observe(&session).await;
    assert!(session.start().await);
    session.wait().await;

    let expired = |e: &Event| matches!(e, Event::TimerExpired { player_id: 0, action_taken } if action_taken == "check");
    assert_eq!(recorder.count(expired), 4);
    assert_eq!(
        recorder.count(|e| matches!(e, Event::TimerStart { player_id: 0, total_seconds: 1, .. })),
        4
    );
    let started = recorder.position(|e| matches!(e, Event::TimerStart { .. })).unwrap();
    let first = recorder.position(expired).unwrap();
    assert!(started < first);
    assert!(recorder.count(|e| matches!(e, Event::TimerTick { player_id: 0, .. })) >= 4);

    let dealt = recorder
        .events()
        .into_iter()
        .find_map(|e| match e {
            Event::GameState { state } if state.hand_number == 1 => Some(state),
            _ => None,
        })
        .unwrap();
    assert_eq!(dealt.players[0].hole_cards.as_ref().map(|h| h.len()), Some(2));
    assert_eq!(dealt.players[1].hole_cards, None);

    let finals = recorder
        .events()
        .into_iter()
        .filter_map(|e| match e {
            Event::SessionComplete {
                final_stacks,
                hands_played,
            } => Some((final_stacks, hands_played)),
            _ => None,
        })
        .collect::<Vec<_>>();
    assert_eq!(finals.len(), 1);
    assert_eq!(finals[0].1, 1);
    assert_eq!(finals[0].0.iter().sum::<crate::Chips>(), 20_000);
    assert_eq!(session.status(), Status::Complete);
    assert_eq!(session.turnstile().peak(), 1);
    assert_eq!(session.turnstile().inflight(), 0);
    assert!(!session.timer.is_running());
}

#[tokio::test(start_paused = true)]
async fn submitted_action_resolves_turn_and_disarms_timer() {
    let session = table(&["caller"], config(1, 30));
    let recorder = observe(&session).await;
    let handle: Handle = recorder.clone();
    session.start().await;
    recorder.until(|e| matches!(e, Event::YourTurn { .. })).await;
    let raise = r#"{"type":"player_action","action_type":"raise","amount":300}"#;
    assert_eq!(session.receive(&handle, raise).await, ControlFlow::Continue(()));
    recorder
        .until(|e| matches!(e, Event::GameStateUpdate(u) if u.last_actions[0].as_deref() == Some("Raise 300")))
        .await;
    recorder
        .until(|e| matches!(e, Event::GameStateUpdate(u) if u.street == Street::Flop))
        .await;
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(recorder.count(|e| matches!(e, Event::TimerExpired { .. })), 0);
    assert_eq!(recorder.count(|e| matches!(e, Event::Error { .. })), 0);
    assert_eq!(session.receive(&handle, r#"{"type":"end_session"}"#).await, ControlFlow::Break(()));
    session.wait().await;
    assert_eq!(recorder.count(|e| matches!(e, Event::SessionComplete { .. })), 1);
}

#[tokio::test(start_paused = true)]
async fn failed_inference_folds_and_play_moves_on() {
    let session = table(&["broken", "caller"], config(1, 30));
    let recorder = observe(&session).await;
    session.start().await;
    recorder
        .until(|e| matches!(e, Event::ThinkingStart { player_id: 2, .. }))
        .await;

    let start = recorder
        .position(|e| matches!(e, Event::ThinkingStart { player_id: 1, .. }))
        .unwrap();
    let token = recorder
        .position(|e| matches!(e, Event::ThinkingToken { player_id: 1, token, .. } if token == "hmm "))
        .unwrap();
    let error = recorder
        .position(|e| matches!(e, Event::Error { code, .. } if code == "inference_error"))
        .unwrap();
    let complete = recorder
        .position(|e| {
            matches!(e, Event::ThinkingComplete { player_id: 1, action, full_text, .. }
                if *action == Action::fold() && full_text == "hmm ")
        })
        .unwrap();
    let next = recorder
        .position(|e| matches!(e, Event::ThinkingStart { player_id: 2, .. }))
        .unwrap();
    assert!(start < token && token < error && error < complete && complete < next);

    session.end().await;
    session.wait().await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(recorder.count(|e| matches!(e, Event::SessionComplete { .. })), 1);
}

#[tokio::test(start_paused = true)]
async fn refused_inference_forfeits_the_blind() {
    let session = table(&["refused"], config(1, 30));
    let recorder = observe(&session).await;
    session.start().await;
    session.wait().await;
    assert_eq!(
        recorder.count(|e| matches!(e, Event::Error { code, .. } if code == "inference_error")),
        1
    );
    assert_eq!(recorder.count(|e| matches!(e, Event::ThinkingToken { .. })), 0);
    assert_eq!(
        recorder.count(|e| {
            matches!(e, Event::HandComplete { winners, amounts, .. } if winners == &vec![0] && amounts == &vec![150])
        }),
        1
    );
    assert_eq!(session.snapshot().players[0].stack, 10_050);
    assert_eq!(session.snapshot().players[1].stack, 9_950);
}

#[tokio::test(start_paused = true)]
async fn modelless_agent_folds_without_thinking() {
    let session = table(&[""], config(1, 30));
    let recorder = observe(&session).await;
    session.start().await;
    session.wait().await;
    assert_eq!(recorder.count(|e| matches!(e, Event::ThinkingStart { .. })), 0);
    assert_eq!(
        recorder.count(|e| matches!(e, Event::HandComplete { winners, .. } if winners == &vec![0])),
        1
    );
}

#[tokio::test(start_paused = true)]
async fn protocol_errors_go_only_to_the_sender() {
    let session = table(&["caller"], config(1, 30));
    let sender = observe(&session).await;
    let bystander = observe(&session).await;
    let handle: Handle = sender.clone();
    let before = bystander.events().len();

    session.receive(&handle, "{not json").await;
    session
        .receive(&handle, r#"{"type":"player_action","action_type":"limp"}"#)
        .await;
    session
        .receive(&handle, r#"{"type":"player_action","action_type":"call"}"#)
        .await;
    session.receive(&handle, r#"{"type":"ping"}"#).await;

    let codes = sender
        .events()
        .into_iter()
        .filter_map(|e| match e {
            Event::Error { code, .. } => Some(code),
            _ => None,
        })
        .collect::<Vec<_>>();
    assert_eq!(codes, vec!["invalid_json", "invalid_action", "not_your_turn"]);
    assert_eq!(sender.count(|e| *e == Event::Pong), 1);
    assert_eq!(bystander.events().len(), before);
}

#[tokio::test(start_paused = true)]
async fn ending_while_waiting_completes_once() {
    let session = table(&["caller", "caller"], config(3, 30));
    let recorder = observe(&session).await;
    session.end().await;
    session.end().await;
    assert_eq!(session.status(), Status::Complete);
    assert!(!session.start().await);
    let finals = recorder
        .events()
        .into_iter()
        .filter(|e| matches!(e, Event::SessionComplete { .. }))
        .collect::<Vec<_>>();
    assert_eq!(
        finals,
        vec![Event::SessionComplete {
            final_stacks: vec![10_000; 3],
            hands_played: 0,
        }]
    );
    assert_eq!(session.submit(Action::check()).await, Err(ProtocolError::NotYourTurn));
}

#[tokio::test(start_paused = true)]
async fn start_only_leaves_waiting_once() {
    let session = table(&["caller"], config(1, 1));
    let recorder = observe(&session).await;
    let handle: Handle = recorder.clone();
    assert!(session.start().await);
    session.receive(&handle, r#"{"type":"start_hand"}"#).await;
    assert!(!session.start().await);
    session.wait().await;
    assert_eq!(
        recorder.count(|e| matches!(e, Event::GameState { state } if state.hand_number == 1)),
        1
    );
}

#[tokio::test(start_paused = true)]
async fn sessions_do_not_share_state() {
    let a = table(&["caller"], config(1, 1));
    let b = table(&["caller", "caller"], config(1, 1));
    let seen_a = observe(&a).await;
    let seen_b = observe(&b).await;
    a.start().await;
    b.start().await;
    a.wait().await;
    b.wait().await;
    for (session, seen) in [(&a, &seen_a), (&b, &seen_b)] {
        let id = session.id().to_string();
        assert!(seen.events().iter().all(|e| match e {
            Event::ConnectionAck { session_id, .. } => *session_id == id,
            Event::GameState { state } => state.session_id == id,
            _ => true,
        }));
        assert_eq!(seen.count(|e| matches!(e, Event::SessionComplete { .. })), 1);
        assert_eq!(session.turnstile().peak(), 1);
    }
    assert_eq!(seen_a.count(|e| matches!(e, Event::TimerExpired { .. })), 4);
    assert_eq!(seen_b.snapshot_width(), 3);
}

#[tokio::test(start_paused = true)]
async fn cancelling_one_timer_leaves_the_other_session_running() {
    let a = table(&["caller"], config(1, 5));
    let b = table(&["caller", "caller"], config(1, 5));
    let seen_a = observe(&a).await;
    let seen_b = observe(&b).await;
    a.start().await;
    b.start().await;
    seen_a.until(|e| matches!(e, Event::YourTurn { .. })).await;
    seen_b.until(|e| matches!(e, Event::YourTurn { .. })).await;

    a.timer.cancel().await;
    assert!(!a.timer.is_running());
    assert!(b.timer.is_running());
    let ticks = seen_a.count(|e| matches!(e, Event::TimerTick { .. }));

    seen_b.until(|e| matches!(e, Event::TimerExpired { .. })).await;
    assert_eq!(seen_b.count(|e| matches!(e, Event::TimerExpired { .. })), 1);
    assert_eq!(seen_a.count(|e| matches!(e, Event::TimerExpired { .. })), 0);
    assert_eq!(seen_a.count(|e| matches!(e, Event::TimerTick { .. })), ticks);

    a.end().await;
    b.end().await;
    a.wait().await;
    b.wait().await;
}

#[tokio::test(start_paused = true)]
async fn oversized_timeout_still_lets_the_human_act() {
    let session = table(&["caller"], config(1, u64::MAX));
    let recorder = observe(&session).await;
    session.start().await;
    for turn in 1..=4 {
        recorder
            .until_count(turn, |e| matches!(e, Event::YourTurn { .. }))
            .await;
        assert_eq!(session.submit(Action::check()).await, Ok(()));
    }
    let done = tokio::time::timeout(Duration::from_secs(60), session.wait()).await;
    assert!(done.is_ok());
    assert_eq!(
        recorder.count(|e| matches!(e, Event::TimerStart { total_seconds: u64::MAX, .. })),
        4
    );
    assert_eq!(recorder.count(|e| matches!(e, Event::TimerExpired { .. })), 0);
    assert_eq!(recorder.count(|e| matches!(e, Event::Error { .. })), 0);
    assert_eq!(recorder.count(|e| matches!(e, Event::SessionComplete { .. })), 1);
}

#[tokio::test(start_paused = true)]
async fn mailbox_closes_once_the_turn_resolves() {
    let session = table(&["caller"], config(1, 1));
    let recorder = observe(&session).await;
    session.start().await;
    recorder.until(|e| matches!(e, Event::YourTurn { .. })).await;
    let pending = session.pending.lock().await;
    let mailbox = pending.as_ref().unwrap().mailbox.clone();
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(mailbox.try_send(Resolution::Submitted(Action::check())).is_err());
    drop(pending);
    recorder.until(|e| matches!(e, Event::TimerExpired { .. })).await;
    session.end().await;
    session.wait().await;
}

#[tokio::test]
async fn agent_decisions_are_traced() {
    let path = std::env::temp_dir().join(format!("pokerroom-decisions-{}.jsonl", ID::<Trace>::default()));
    let trace = Arc::new(Trace::open(&path).await.unwrap());
    let session = traced(&["refused", "caller"], config(1, 30), Some(trace));
    let recorder = observe(&session).await;
    session.start().await;
    recorder
        .until(|e| matches!(e, Event::ThinkingComplete { player_id: 2, .. }))
        .await;
    session.end().await;
    session.wait().await;

    let written = tokio::fs::read_to_string(&path).await.unwrap();
    let lines = written
        .lines()
        .map(|l| serde_json::from_str::<serde_json::Value>(l).unwrap())
        .collect::<Vec<_>>();
    let refused = lines.iter().find(|l| l["player"] == 1).unwrap();
    assert_eq!(refused["model"], "refused");
    assert_eq!(refused["action"], Action::fold().to_string());
    assert_eq!(refused["error"], "model not loaded");
    let caller = lines.iter().find(|l| l["player"] == 2).unwrap();
    assert_eq!(caller["name"], "Bot2");
    assert_eq!(caller["text"], "I'll just call. <action>cc</action>");
    assert!(caller["error"].is_null());
    assert!(caller["prompt"].as_str().is_some_and(|p| !p.is_empty()));
    assert!(lines.iter().all(|l| l["session"] == session.id().to_string()));
    let _ = tokio::fs::remove_file(&path).await;
}

#[tokio::test(start_paused = true)]
async fn shutdown_closes_observers_mid_turn() {
    let session = table(&["caller"], config(1, 30));
    let recorder = observe(&session).await;
    session.start().await;
    recorder.until(|e| matches!(e, Event::YourTurn { .. })).await;
    session.shutdown().await;
    assert!(recorder.closed.load(Ordering::SeqCst));
    assert_eq!(session.status(), Status::Complete);
    assert!(!session.timer.is_running());
    assert_eq!(session.connections().count().await, 0);
    assert_eq!(session.submit(Action::check()).await, Err(ProtocolError::NotYourTurn));
}

impl Recorder {
    fn snapshot_width(&self) -> usize {
        self.events()
            .into_iter()
            .find_map(|e| match e {
                Event::GameState { state } => Some(state.players.len()),
                _ => None,
            })
            .unwrap_or_default()
    }
}

/// Deals a hand that never offers an actor or a card.
struct Stalled {
    stacks: Vec<crate::Chips>,
}

impl crate::engine::Rules for Stalled {
    fn begin(&mut self, stacks: &[crate::Chips]) -> Result<(), crate::engine::RulesError> {
        self.stacks = stacks.to_vec();
        Ok(())
    }
    fn actor(&self) -> Option<crate::Position> {
        None
    }
    fn legal(&self) -> Option<crate::engine::Legal> {
        None
    }
    fn apply(&mut self, _: &Action) -> Result<(), crate::engine::RulesError> {
        Err(crate::engine::RulesError::NoHand)
    }
    fn concluded(&self) -> bool {
        false
    }
    fn deal(&mut self) -> Result<Option<Street>, crate::engine::RulesError> {
        Ok(None)
    }
    fn settle(&mut self) -> Result<crate::engine::Settlement, crate::engine::RulesError> {
        Err(crate::engine::RulesError::Unfinished)
    }
    fn table(&self) -> crate::engine::Table {
        crate::engine::Table {
            hand: 1,
            street: Street::Preflop,
            pot: 0,
            board: Vec::new(),
            button: 0,
            actor: None,
            seats: self.stacks.iter().copied().map(crate::engine::Seat::new).collect(),
        }
    }
}

#[tokio::test(start_paused = true)]
async fn stalled_hand_ends_the_session_with_a_game_error() {
    let opponents = [Opponent {
        name: "Bot1".to_string(),
        model: "caller".to_string(),
        temperature: crate::TEMPERATURE,
    }];
    let rules = Stalled { stacks: Vec::new() };
    let session = Session::new(
        ID::default(),
        config(1, 30),
        &opponents,
        Box::new(rules),
        Arc::new(Scripted),
        None,
    );
    let recorder = observe(&session).await;
    session.start().await;
    session.wait().await;
    let game_error = recorder
        .position(|e| matches!(e, Event::Error { code, .. } if code == "game_error"))
        .unwrap();
    let complete = recorder
        .position(|e| matches!(e, Event::SessionComplete { .. }))
        .unwrap();
    assert!(game_error < complete);
    assert_eq!(session.status(), Status::Complete);
}
