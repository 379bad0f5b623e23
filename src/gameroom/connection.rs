use super::event::Event;
use std::sync::Arc;
use tokio::sync::Mutex;

/// One live observer of a session: a WebSocket, a terminal, a test probe.
#[async_trait::async_trait]
pub trait Connection: Send + Sync {
    /// Delivers one event as one discrete message.
    async fn send(&self, event: &Event) -> anyhow::Result<()>;
    async fn close(&self) -> anyhow::Result<()>;
}

pub type Handle = Arc<dyn Connection>;

/// The live connections of one session.
///
/// The lock guards membership only. Sends happen on a snapshot taken under
/// the lock, so a slow observer never blocks accepts or removals, and a
/// failed send evicts just that observer.
#[derive(Default)]
pub struct Connections {
    handles: Mutex<Vec<Handle>>,
}

impl Connections {
    pub fn new() -> Self {
        Self::default()
    }
    pub async fn accept(&self, handle: Handle) {
        self.handles.lock().await.push(handle);
    }
    /// Idempotent.
    pub async fn remove(&self, handle: &Handle) {
        self.handles.lock().await.retain(|h| !Arc::ptr_eq(h, handle));
    }
    pub async fn count(&self) -> usize {
        self.handles.lock().await.len()
    }
    /// Sends to one connection, evicting it on failure.
    pub async fn unicast(&self, handle: &Handle, event: &Event) {
        log::trace!("[connections] unicast: {}", event);
        if let Err(e) = handle.send(event).await {
            log::warn!("[connections] unicast failed, dropping connection: {}", e);
            self.remove(handle).await;
        }
    }
    /// Sends to every live connection, evicting those that fail.
    pub async fn broadcast(&self, event: &Event) {
        log::trace!("[connections] broadcast: {}", event);
        let snapshot = self.handles.lock().await.clone();
        let results = futures::future::join_all(snapshot.iter().map(|h| h.send(event))).await;
        let failed = snapshot
            .into_iter()
            .zip(results)
            .filter_map(|(handle, result)| result.err().map(|e| (handle, e)))
            .collect::<Vec<_>>();
        if failed.is_empty() {
            return;
        }
        let mut handles = self.handles.lock().await;
        for (handle, e) in failed {
            log::warn!("[connections] broadcast failed, dropping connection: {}", e);
            handles.retain(|h| !Arc::ptr_eq(h, &handle));
        }
    }
    /// Removes and closes every connection, ignoring close failures.
    pub async fn close_all(&self) {
        let drained = std::mem::take(&mut *self.handles.lock().await);
        for handle in drained {
            if let Err(e) = handle.close().await {
                log::debug!("[connections] close failed: {}", e);
            }
        }
    }
}
