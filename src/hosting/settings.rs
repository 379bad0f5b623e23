use crate::Chips;
use crate::gameroom::GameConfig;
use crate::gameroom::Trace;
use crate::inference::Inference;
use crate::inference::Ollama;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Process settings. Every flag falls back to a `POKER_*` variable.
#[derive(Debug, Clone, Parser)]
#[command(name = "pokerroom", about = "Hold'em against local LLM opponents", version)]
pub struct Settings {
    /// Interface to bind the HTTP server on
    #[arg(long, env = "POKER_HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "POKER_PORT", default_value_t = 8000)]
    pub port: u16,

    /// actix-web worker threads
    #[arg(long, env = "POKER_WORKERS", default_value_t = 4)]
    pub workers: usize,

    #[arg(long, env = "POKER_OLLAMA_ENDPOINT", default_value = "http://localhost:11434")]
    pub ollama_endpoint: String,

    /// Seconds before one inference request is abandoned
    #[arg(long, env = "POKER_OLLAMA_TIMEOUT", default_value_t = crate::INFERENCE_TIMEOUT)]
    pub ollama_timeout: u64,

    /// Agent decisions allowed in flight across all sessions
    #[arg(long, env = "POKER_INFERENCE_PERMITS", default_value_t = crate::INFERENCE_PERMITS)]
    pub inference_permits: usize,

    #[arg(long, env = "POKER_STARTING_STACK", default_value_t = crate::STACK)]
    pub starting_stack: Chips,

    #[arg(long, env = "POKER_SMALL_BLIND", default_value_t = crate::S_BLIND)]
    pub small_blind: Chips,

    #[arg(long, env = "POKER_BIG_BLIND", default_value_t = crate::B_BLIND)]
    pub big_blind: Chips,

    #[arg(long, env = "POKER_NUM_HANDS", default_value_t = crate::HANDS)]
    pub num_hands: usize,

    #[arg(long, env = "POKER_TURN_TIMEOUT", default_value_t = crate::TURN_TIMEOUT)]
    pub turn_timeout_seconds: u64,

    /// Milliseconds between hands
    #[arg(long, env = "POKER_HAND_PAUSE", default_value_t = crate::HAND_PAUSE.as_millis() as u64)]
    pub hand_pause_ms: u64,

    /// Append every agent decision to this JSON Lines file
    #[arg(long, env = "POKER_TRACE_FILE")]
    pub trace_file: Option<PathBuf>,
}

impl Settings {
    pub fn bind(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
    /// Game parameters for sessions that do not override them.
    pub fn defaults(&self) -> GameConfig {
        GameConfig {
            starting_stack: self.starting_stack,
            small_blind: self.small_blind,
            big_blind: self.big_blind,
            num_hands: self.num_hands,
            turn_timeout_seconds: self.turn_timeout_seconds,
            hand_pause_ms: self.hand_pause_ms,
        }
    }
    pub fn inference(&self) -> anyhow::Result<Arc<dyn Inference>> {
        let gate = Arc::new(Semaphore::new(self.inference_permits.max(1)));
        let timeout = Duration::from_secs(self.ollama_timeout);
        Ok(Arc::new(Ollama::new(&self.ollama_endpoint, timeout, gate)?))
    }
    pub async fn trace(&self) -> anyhow::Result<Option<Arc<Trace>>> {
        match self.trace_file.as_ref() {
            Some(path) => Ok(Some(Arc::new(Trace::open(path).await?))),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let settings = Settings::parse_from(["pokerroom", "--port", "9000", "--num-hands", "3"]);
        assert_eq!(settings.bind().1, 9000);
        let config = settings.defaults();
        assert_eq!(config.num_hands, 3);
        assert_eq!(config.big_blind, crate::B_BLIND);
        assert_eq!(config.turn_timeout_seconds, crate::TURN_TIMEOUT);
        assert_eq!(settings.trace_file, None);
    }

    #[test]
    fn trace_file_is_optional() {
        let settings = Settings::parse_from(["pokerroom", "--trace-file", "traces.jsonl"]);
        assert_eq!(settings.trace_file, Some(PathBuf::from("traces.jsonl")));
    }
}
