use super::*;
use crate::HUMAN;
use crate::ID;
use crate::engine::Action;
use crate::engine::Rules;
use crate::inference::Inference;
use std::ops::ControlFlow;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::sync::mpsc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// How a pending human turn was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Submitted(Action),
    Expired(Action),
}

/// The one turn currently awaiting a human decision.
pub(crate) struct Pending {
    pub seat: crate::Position,
    pub mailbox: mpsc::Sender<Resolution>,
}

/// One played-out game between the human and a table of agents.
///
/// The session is a shared handle: transports connect observers and submit
/// actions through it, while a single [`Coordinator`] task spawned by
/// `start` owns the rules engine and drives play. Only the coordinator
/// writes game state; everything else reads the latest [`Snapshot`].
pub struct Session {
    id: ID<Session>,
    config: GameConfig,
    lineup: Vec<Participant>,
    pub(crate) connections: Arc<Connections>,
    pub(crate) timer: Timer,
    pub(crate) inference: Arc<dyn Inference>,
    pub(crate) trace: Option<Arc<Trace>>,
    pub(crate) pending: Mutex<Option<Pending>>,
    pub(crate) turnstile: Turnstile,
    pub(crate) state: watch::Sender<Snapshot>,
    pub(crate) stop: watch::Sender<bool>,
    status: watch::Sender<Status>,
    rules: Mutex<Option<Box<dyn Rules>>>,
    runner: Mutex<Option<JoinHandle<()>>>,
}

impl Session {
    pub fn new(
        id: ID<Session>,
        config: GameConfig,
        opponents: &[Opponent],
        rules: Box<dyn Rules>,
        inference: Arc<dyn Inference>,
        trace: Option<Arc<Trace>>,
    ) -> Arc<Self> {
        let lineup = std::iter::once(Participant::human(config.starting_stack))
            .chain(
                opponents
                    .iter()
                    .enumerate()
                    .map(|(i, o)| Participant::agent(i + 1, o, config.starting_stack)),
            )
            .collect::<Vec<_>>();
        let snapshot = Snapshot::opening(&id.to_string(), &lineup);
        Arc::new(Self {
            id,
            timer: Timer::new(config.turn_timeout()),
            config,
            lineup,
            connections: Arc::new(Connections::new()),
            inference,
            trace,
            pending: Mutex::new(None),
            turnstile: Turnstile::default(),
            state: watch::Sender::new(snapshot),
            stop: watch::Sender::new(false),
            status: watch::Sender::new(Status::Waiting),
            rules: Mutex::new(Some(rules)),
            runner: Mutex::new(None),
        })
    }

    pub fn id(&self) -> ID<Session> {
        self.id
    }
    pub fn config(&self) -> &GameConfig {
        &self.config
    }
    /// Seats as they were at creation.
    pub fn lineup(&self) -> &[Participant] {
        &self.lineup
    }
    pub fn status(&self) -> Status {
        *self.status.borrow()
    }
    /// Latest published table view.
    pub fn snapshot(&self) -> Snapshot {
        self.state.borrow().clone()
    }
    pub fn connections(&self) -> &Connections {
        &self.connections
    }
    pub fn turnstile(&self) -> &Turnstile {
        &self.turnstile
    }

    /// Registers an observer and brings it up to date.
    pub async fn connect(&self, handle: Handle) {
        log::debug!("[session {}] connection joined", self.id);
        self.connections.accept(handle.clone()).await;
        let ack = Event::ConnectionAck {
            session_id: self.id.to_string(),
            player_id: HUMAN,
        };
        self.connections.unicast(&handle, &ack).await;
        let state = Event::GameState {
            state: self.snapshot(),
        };
        self.connections.unicast(&handle, &state).await;
    }
    pub async fn disconnect(&self, handle: &Handle) {
        log::debug!("[session {}] connection left", self.id);
        self.connections.remove(handle).await;
    }

    /// Waiting -> InProgress. Spawns the coordinator; no-op in any other state.
    pub async fn start(self: &Arc<Self>) -> bool {
        let began = self.status.send_if_modified(|status| match status {
            Status::Waiting => {
                *status = Status::InProgress;
                true
            }
            _ => false,
        });
        if !began {
            return false;
        }
        let Some(rules) = self.rules.lock().await.take() else {
            return false;
        };
        log::info!("[session {}] starting", self.id);
        let coordinator = Coordinator::new(self.clone(), rules);
        *self.runner.lock().await = Some(tokio::spawn(coordinator.run()));
        true
    }

    /// Hands a human action to the pending turn, if there is one.
    pub async fn submit(&self, action: Action) -> Result<(), ProtocolError> {
        let pending = self.pending.lock().await;
        match pending.as_ref() {
            Some(turn) if turn.seat == HUMAN => turn
                .mailbox
                .try_send(Resolution::Submitted(action))
                .map_err(|_| ProtocolError::NotYourTurn),
            _ => Err(ProtocolError::NotYourTurn),
        }
    }

    /// Dispatches one client message. Breaks when the sender asked to end.
    pub async fn receive(self: &Arc<Self>, handle: &Handle, text: &str) -> ControlFlow<()> {
        let message = match ClientMessage::decode(text) {
            Ok(message) => message,
            Err(e) => {
                self.reject(handle, e).await;
                return ControlFlow::Continue(());
            }
        };
        match message {
            ClientMessage::PlayerAction {
                action_type,
                amount,
            } => {
                let submitted = match message::action(&action_type, amount) {
                    Ok(action) => self.submit(action).await,
                    Err(e) => Err(e),
                };
                if let Err(e) = submitted {
                    self.reject(handle, e).await;
                }
            }
            ClientMessage::StartHand => {
                self.start().await;
            }
            ClientMessage::EndSession => {
                self.end().await;
                return ControlFlow::Break(());
            }
            ClientMessage::Ping => self.connections.unicast(handle, &Event::Pong).await,
        }
        ControlFlow::Continue(())
    }
    async fn reject(&self, handle: &Handle, error: ProtocolError) {
        log::debug!("[session {}] rejected message: {}", self.id, error);
        let event = Event::error(error.code(), &error);
        self.connections.unicast(handle, &event).await;
    }

    /// Ends the session on request, from Waiting or InProgress.
    pub async fn end(&self) {
        self.stop.send_replace(true);
        self.finish().await;
    }

    /// Moves to Complete and announces it. Only the first caller announces.
    pub(crate) async fn finish(&self) {
        let ended = self.status.send_if_modified(|status| match status {
            Status::Complete => false,
            _ => {
                *status = Status::Complete;
                true
            }
        });
        if ended {
            let state = self.snapshot();
            log::info!(
                "[session {}] complete after {} hands",
                self.id,
                state.hand_number
            );
            let event = Event::SessionComplete {
                final_stacks: state.players.iter().map(|p| p.stack).collect(),
                hands_played: state.hand_number,
            };
            self.connections.broadcast(&event).await;
        }
    }

    /// Teardown before the session is dropped from its registry.
    pub async fn shutdown(&self) {
        self.stop.send_replace(true);
        if let Some(runner) = self.runner.lock().await.take() {
            runner.abort();
            let _ = runner.await;
        }
        self.pending.lock().await.take();
        self.timer.cancel().await;
        self.finish().await;
        self.connections.close_all().await;
        log::debug!("[session {}] shut down", self.id);
    }

    /// Resolves once the session is Complete.
    pub async fn wait(&self) {
        let mut status = self.status.subscribe();
        let _ = status.wait_for(|s| *s == Status::Complete).await;
    }
}
