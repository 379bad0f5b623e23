use crate::gameroom::Connection;
use crate::gameroom::Event;
use crate::gameroom::Handle;
use crate::gameroom::Session;
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::Mutex;

/// A browser attached over WebSocket. One event is one text frame.
pub struct Socket {
    ws: Mutex<actix_ws::Session>,
}

impl Socket {
    pub fn new(ws: actix_ws::Session) -> Self {
        Self { ws: Mutex::new(ws) }
    }

    /// Pumps frames from the browser into `session` until either side hangs up.
    pub async fn bridge(session: Arc<Session>, ws: actix_ws::Session, mut stream: actix_ws::MessageStream) {
        let id = session.id();
        let socket = Arc::new(Self::new(ws.clone()));
        let handle: Handle = socket.clone();
        session.connect(handle.clone()).await;
        log::info!("[socket {}] connected", id);
        while let Some(frame) = stream.next().await {
            match frame {
                Ok(actix_ws::Message::Text(text)) => {
                    if session.receive(&handle, &text).await.is_break() {
                        break;
                    }
                }
                Ok(actix_ws::Message::Ping(bytes)) => {
                    if socket.ws.lock().await.pong(&bytes).await.is_err() {
                        break;
                    }
                }
                Ok(actix_ws::Message::Close(_)) => break,
                Err(e) => {
                    log::debug!("[socket {}] protocol error: {}", id, e);
                    break;
                }
                _ => continue,
            }
        }
        session.disconnect(&handle).await;
        let _ = handle.close().await;
        log::info!("[socket {}] disconnected", id);
    }
}

#[async_trait::async_trait]
impl Connection for Socket {
    async fn send(&self, event: &Event) -> anyhow::Result<()> {
        self.ws
            .lock()
            .await
            .text(event.to_json())
            .await
            .map_err(|_| anyhow::anyhow!("socket closed"))
    }
    async fn close(&self) -> anyhow::Result<()> {
        let ws = self.ws.lock().await.clone();
        ws.close(None).await.map_err(|_| anyhow::anyhow!("socket already closed"))
    }
}
