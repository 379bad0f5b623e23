use crate::Position;
use serde::Serialize;
use std::path::Path;
use std::path::PathBuf;
use tokio::fs::File;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// One agent decision, as written to the trace file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    /// Unix milliseconds when the decision completed.
    pub timestamp: u64,
    pub session: String,
    pub player: Position,
    pub name: String,
    pub model: String,
    pub prompt: String,
    pub text: String,
    pub action: String,
    pub error: Option<String>,
    pub duration_ms: u64,
}

impl Decision {
    pub fn now() -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default()
    }
}

/// Appends agent decisions to a JSON Lines file, one object per line.
/// Shared by every session in the process.
pub struct Trace {
    path: PathBuf,
    file: Mutex<File>,
}

impl Trace {
    pub async fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        log::info!("[trace] appending decisions to {}", path.display());
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }
    pub fn path(&self) -> &Path {
        &self.path
    }
    pub async fn record(&self, decision: &Decision) -> anyhow::Result<()> {
        let mut line = serde_json::to_vec(decision)?;
        line.push(b'\n');
        let mut file = self.file.lock().await;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }
}
