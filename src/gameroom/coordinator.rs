use super::*;
use crate::Position;
use crate::engine::Action;
use crate::engine::ActionKind;
use crate::engine::Legal;
use crate::engine::Rules;
use crate::engine::RulesError;
use crate::inference::Request;
use futures::FutureExt;
use futures::StreamExt;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use tokio::sync::mpsc;
use tokio::sync::watch;
use tokio::time::Instant;

/// Counts turn resolutions in flight. A session never has more than one.
#[derive(Debug, Default)]
pub struct Turnstile {
    inflight: AtomicUsize,
    peak: AtomicUsize,
}

impl Turnstile {
    fn enter(&self) -> Entry<'_> {
        let now = self.inflight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        Entry(self)
    }
    pub fn inflight(&self) -> usize {
        self.inflight.load(Ordering::SeqCst)
    }
    /// Most turns ever resolving at once.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

struct Entry<'a>(&'a Turnstile);

impl Drop for Entry<'_> {
    fn drop(&mut self) {
        self.0.inflight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Sole writer of a session's game state.
///
/// Runs the round loop on its own task: begin a hand, resolve one actor at
/// a time, deal when nobody is due, settle, pause, repeat. Every state
/// change is mirrored into the roster and published before the next one.
pub(crate) struct Coordinator {
    session: Arc<Session>,
    rules: Box<dyn Rules>,
    roster: Vec<Participant>,
    hands: usize,
}

impl Coordinator {
    pub fn new(session: Arc<Session>, rules: Box<dyn Rules>) -> Self {
        let roster = session.lineup().to_vec();
        Self {
            session,
            rules,
            roster,
            hands: 0,
        }
    }

    pub async fn run(mut self) {
        if let Err(e) = self.play().await {
            log::error!("[session {}] game error: {}", self.session.id(), e);
            let event = Event::error("game_error", &e);
            self.session.connections.broadcast(&event).await;
        }
        self.session.finish().await;
    }

    fn stopped(&self) -> bool {
        *self.session.stop.borrow()
    }

    async fn play(&mut self) -> anyhow::Result<()> {
        loop {
            if self.stopped() {
                return Ok(());
            }
            let stacks = self.roster.iter().map(|p| p.stack).collect::<Vec<_>>();
            match self.rules.begin(&stacks) {
                Err(RulesError::Shorthanded) => return Ok(()),
                Err(e) => return Err(e.into()),
                Ok(()) => {}
            }
            self.hands += 1;
            self.roster.iter_mut().for_each(|p| p.last_action = None);
            log::info!("[session {}] hand {} begins", self.session.id(), self.hands);
            let state = self.mirror();
            self.session.state.send_replace(state.clone());
            self.session
                .connections
                .broadcast(&Event::GameState { state })
                .await;
            if !self.hand().await? {
                return Ok(());
            }
            let settlement = self.rules.settle()?;
            for (participant, stack) in self.roster.iter_mut().zip(settlement.stacks.iter()) {
                participant.stack = *stack;
                participant.bet = 0;
            }
            log::info!(
                "[session {}] hand {} won by {:?}",
                self.session.id(),
                self.hands,
                settlement.winners
            );
            let event = Event::HandComplete {
                winners: settlement.winners,
                amounts: settlement.amounts,
                revealed_cards: settlement.revealed,
            };
            self.session.connections.broadcast(&event).await;
            let state = self.view();
            self.publish(state).await;
            let funded = self.roster.iter().filter(|p| p.stack > 0).count();
            if self.hands >= self.session.config().num_hands || funded < 2 {
                return Ok(());
            }
            tokio::select! {
                _ = tokio::time::sleep(self.session.config().hand_pause()) => {}
                _ = halted(self.session.stop.subscribe()) => return Ok(()),
            }
        }
    }

    /// Plays the current hand to its conclusion. False if the session stopped.
    async fn hand(&mut self) -> anyhow::Result<bool> {
        while !self.rules.concluded() {
            if self.stopped() {
                return Ok(false);
            }
            match self.rules.actor() {
                None => match self.rules.deal()? {
                    Some(street) => {
                        log::debug!("[session {}] dealt {}", self.session.id(), street);
                        let state = self.mirror();
                        self.publish(state).await;
                    }
                    None => anyhow::bail!("hand stalled with no actor and nothing to deal"),
                },
                Some(seat) => {
                    let legal = self
                        .rules
                        .legal()
                        .ok_or_else(|| anyhow::anyhow!("seat {} is due with no legal actions", seat))?;
                    let Some(action) = self.resolve(seat, legal).await else {
                        return Ok(false);
                    };
                    let applied = self.commit(seat, action)?;
                    self.roster[seat].last_action = Some(label(&applied, &legal));
                    let state = self.mirror();
                    self.publish(state).await;
                }
            }
        }
        Ok(true)
    }

    /// Applies `action`, then check/call, then fold, keeping the first the
    /// rules accept.
    fn commit(&mut self, seat: Position, action: Action) -> Result<Action, RulesError> {
        let mut last = None;
        for attempt in [action, Action::call(), Action::fold()] {
            match self.rules.apply(&attempt) {
                Ok(()) => return Ok(attempt),
                Err(e) => {
                    log::debug!("[session {}] P{} {} rejected: {}", self.session.id(), seat, attempt, e);
                    last = Some(e);
                }
            }
        }
        Err(last.unwrap_or(RulesError::NoHand))
    }

    /// Obtains one decision for `seat`. None if the session stopped first.
    async fn resolve(&mut self, seat: Position, legal: Legal) -> Option<Action> {
        let session = self.session.clone();
        let _turn = session.turnstile.enter();
        if self.roster[seat].is_human() {
            self.human(seat, legal).await
        } else {
            self.agent(seat, legal).await
        }
    }

    async fn human(&mut self, seat: Position, legal: Legal) -> Option<Action> {
        let session = self.session.clone();
        let connections = session.connections.clone();
        let fallback = legal.passive();
        let (mailbox, mut inbox) = mpsc::channel::<Resolution>(1);
        {
            let mut pending = session.pending.lock().await;
            if pending.is_some() {
                log::error!("[session {}] replacing a stale pending turn", session.id());
            }
            *pending = Some(Pending {
                seat,
                mailbox: mailbox.clone(),
            });
        }
        connections
            .broadcast(&Event::YourTurn {
                available_actions: legal,
            })
            .await;
        connections
            .broadcast(&Event::timer(seat, session.timer.duration().as_secs()))
            .await;
        let expiry: Expiry = Box::new(move || {
            async move {
                let _ = mailbox.try_send(Resolution::Expired(fallback));
            }
            .boxed()
        });
        let ticker: Ticker = {
            let connections = connections.clone();
            Box::new(move |remaining: u64| {
                let connections = connections.clone();
                async move {
                    let tick = Event::TimerTick {
                        player_id: seat,
                        remaining_seconds: remaining,
                    };
                    connections.broadcast(&tick).await;
                }
                .boxed()
            })
        };
        session.timer.start(expiry, Some(ticker)).await;
        let limit = session.timer.duration().saturating_add(crate::TURN_GRACE);
        let outcome = tokio::select! {
            received = tokio::time::timeout(limit, inbox.recv()) => Some(received.ok().flatten()),
            _ = halted(session.stop.subscribe()) => None,
        };
        inbox.close();
        let outcome = match (outcome, inbox.try_recv()) {
            (Some(Some(Resolution::Expired(_)) | None), Ok(Resolution::Submitted(action))) => {
                Some(Some(Resolution::Submitted(action)))
            }
            (outcome, _) => outcome,
        };
        session.pending.lock().await.take();
        session.timer.cancel().await;
        match outcome? {
            Some(Resolution::Submitted(action)) => Some(action),
            Some(Resolution::Expired(action)) => {
                log::info!("[session {}] P{} timed out, {}", session.id(), seat, action);
                let event = Event::TimerExpired {
                    player_id: seat,
                    action_taken: action.to_string().to_lowercase(),
                };
                connections.broadcast(&event).await;
                Some(action)
            }
            None => {
                log::warn!("[session {}] P{} turn outlived its timer", session.id(), seat);
                Some(fallback)
            }
        }
    }

    async fn agent(&mut self, seat: Position, legal: Legal) -> Option<Action> {
        let participant = self.roster[seat].clone();
        let Some(model) = participant.model.clone() else {
            return Some(Action::fold());
        };
        let connections = self.session.connections.clone();
        connections
            .broadcast(&Event::ThinkingStart {
                player_id: seat,
                player_name: participant.name.clone(),
            })
            .await;
        let began = Instant::now();
        let request = Request {
            model: model.clone(),
            prompt: prompt(&self.rules.table(), &legal, seat),
            temperature: participant.temperature,
        };
        let asked = request.prompt.clone();
        let mut text = String::new();
        let mut failure = None;
        let mut batcher = {
            let connections = connections.clone();
            Batcher::new(move |batch: String| {
                let connections = connections.clone();
                async move { connections.broadcast(&Event::token(seat, batch)).await }
            })
        };
        match self.session.inference.stream(request).await {
            Ok(mut fragments) => {
                while let Some(fragment) = fragments.next().await {
                    match fragment {
                        Ok(fragment) => {
                            text.push_str(&fragment);
                            batcher.push(&fragment).await;
                        }
                        Err(e) => {
                            failure = Some(e);
                            break;
                        }
                    }
                }
            }
            Err(e) => failure = Some(e),
        }
        batcher.flush().await;
        let (action, error) = match failure {
            Some(e) => {
                log::warn!("[session {}] P{} inference failed: {}", self.session.id(), seat, e);
                let message = format!("{} could not decide: {}", participant.name, e);
                connections.broadcast(&Event::error("inference_error", message)).await;
                (Action::fold(), Some(e.to_string()))
            }
            None if text.trim().is_empty() => {
                log::warn!("[session {}] P{} returned no text", self.session.id(), seat);
                let message = format!("{} returned an empty reply", participant.name);
                connections.broadcast(&Event::error("inference_error", message)).await;
                (Action::fold(), Some("empty reply".to_string()))
            }
            None => (parse(&text, legal.can_check, legal.max_raise), None),
        };
        if self.stopped() {
            return None;
        }
        let duration_ms = began.elapsed().as_millis() as u64;
        if let Some(trace) = self.session.trace.as_ref() {
            let decision = Decision {
                timestamp: Decision::now(),
                session: self.session.id().to_string(),
                player: seat,
                name: participant.name.clone(),
                model,
                prompt: asked,
                text: text.clone(),
                action: action.to_string(),
                error,
                duration_ms,
            };
            if let Err(e) = trace.record(&decision).await {
                log::warn!("[trace] {}: {}", trace.path().display(), e);
            }
        }
        let event = Event::ThinkingComplete {
            player_id: seat,
            action,
            full_text: text,
            duration_ms,
        };
        connections.broadcast(&event).await;
        Some(action)
    }

    /// Copies chip state from the rules engine into the roster.
    fn mirror(&mut self) -> Snapshot {
        let table = self.rules.table();
        for (participant, seat) in self.roster.iter_mut().zip(table.seats.iter()) {
            participant.stack = seat.stack;
            participant.bet = seat.stake;
            participant.active = seat.is_live();
        }
        self.view()
    }

    fn view(&self) -> Snapshot {
        Snapshot::dealt(
            &self.session.id().to_string(),
            &self.roster,
            &self.rules.table(),
            self.rules.legal(),
        )
    }

    async fn publish(&self, state: Snapshot) {
        let update = Event::GameStateUpdate(Update::from(&state));
        self.session.state.send_replace(state);
        self.session.connections.broadcast(&update).await;
    }
}

/// Resolves once the stop flag is raised.
async fn halted(mut stop: watch::Receiver<bool>) {
    loop {
        if *stop.borrow_and_update() {
            return;
        }
        if stop.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// How an applied action reads in the table view.
fn label(action: &Action, legal: &Legal) -> String {
    match action.kind() {
        ActionKind::Check | ActionKind::Call if legal.can_check => "Check".to_string(),
        ActionKind::Check | ActionKind::Call => "Call".to_string(),
        _ => action.to_string(),
    }
}
