use super::*;
use crate::ID;
use crate::engine::Holdem;
use crate::gameroom::ConfigError;
use crate::gameroom::GameConfig;
use crate::gameroom::Opponent;
use crate::gameroom::Session;
use crate::gameroom::Trace;
use crate::inference::Inference;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::sync::RwLock;

/// Registry of live sessions.
///
/// `create` and `remove` are serialized by `turnover`. A removed session is
/// shut down while it is still registered and only then evicted, so lookups
/// keep finding it for the length of its teardown.
pub struct Casino {
    sessions: RwLock<HashMap<ID<Session>, Arc<Session>>>,
    turnover: Mutex<()>,
    inference: Arc<dyn Inference>,
    trace: Option<Arc<Trace>>,
    defaults: GameConfig,
}

impl Casino {
    pub fn new(inference: Arc<dyn Inference>, defaults: GameConfig) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            turnover: Mutex::new(()),
            inference,
            trace: None,
            defaults,
        }
    }
    /// Records every agent decision of every session to `trace`.
    pub fn with_trace(self, trace: Option<Arc<Trace>>) -> Self {
        Self { trace, ..self }
    }
    pub fn inference(&self) -> &dyn Inference {
        self.inference.as_ref()
    }
    pub fn defaults(&self) -> &GameConfig {
        &self.defaults
    }

    /// Validates and registers a new session under a fresh id.
    pub async fn create(&self, opponents: &[Opponent], config: GameConfig) -> Result<Arc<Session>, ConfigError> {
        config.validate(opponents)?;
        let rules = Holdem::new(config.small_blind, config.big_blind);
        let session = Session::new(
            ID::default(),
            config,
            opponents,
            Box::new(rules),
            self.inference.clone(),
            self.trace.clone(),
        );
        let _turnover = self.turnover.lock().await;
        self.sessions
            .write()
            .await
            .insert(session.id(), session.clone());
        log::info!(
            "[casino] opened session {} against {} opponents",
            session.id(),
            opponents.len()
        );
        Ok(session)
    }

    pub async fn get(&self, id: ID<Session>) -> Option<Arc<Session>> {
        self.sessions.read().await.get(&id).cloned()
    }

    /// Shuts a session down, then forgets it.
    pub async fn remove(&self, id: ID<Session>) -> anyhow::Result<()> {
        let _turnover = self.turnover.lock().await;
        let session = self
            .get(id)
            .await
            .ok_or_else(|| anyhow::anyhow!("session {} not found", id))?;
        session.shutdown().await;
        self.sessions.write().await.remove(&id);
        log::info!("[casino] closed session {}", id);
        Ok(())
    }

    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Shuts down every session, for process exit.
    pub async fn close_all(&self) {
        let _turnover = self.turnover.lock().await;
        let drained = std::mem::take(&mut *self.sessions.write().await);
        futures::future::join_all(drained.values().map(|s| s.shutdown())).await;
        log::info!("[casino] closed {} sessions", drained.len());
    }

    /// Attaches a WebSocket to a session and pumps it on its own task.
    pub async fn bridge(
        &self,
        id: ID<Session>,
        ws: actix_ws::Session,
        stream: actix_ws::MessageStream,
    ) -> anyhow::Result<()> {
        let session = self
            .get(id)
            .await
            .ok_or_else(|| anyhow::anyhow!("session {} not found", id))?;
        actix_web::rt::spawn(Socket::bridge(session, ws, stream));
        Ok(())
    }
}
