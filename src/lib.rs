//! Real-time No-Limit Hold'em sessions between one human and LLM opponents.
//!
//! A [`gameroom::Session`] drives one hand at a time against a
//! [`engine::Rules`] implementation. Human turns race a
//! [`gameroom::Timer`] against a single-slot mailbox; agent turns stream
//! tokens from an [`inference::Inference`] backend through a
//! [`gameroom::Batcher`] into the session's [`gameroom::Connections`].
//! The `hosting` module (feature `server`) exposes sessions over HTTP and
//! WebSocket via a [`hosting::Casino`] registry.
pub mod cards;
pub mod engine;
pub mod gameroom;
pub mod inference;
#[cfg(feature = "server")]
pub mod hosting;

// ============================================================================
// TYPE ALIASES
// ============================================================================
/// Stack sizes and bet amounts in chips.
pub type Chips = i64;
/// Seat index around the table. Seat 0 is always the human.
pub type Position = usize;
/// The human always occupies the first seat.
pub const HUMAN: Position = 0;

// ============================================================================
// IDENTITY TYPES
// ============================================================================
use std::cmp::Ordering;
use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::hash::Hash;
use std::hash::Hasher;
use std::marker::PhantomData;

/// Typed identifier over uuid::Uuid. `ID<Session>` cannot be mixed up with
/// any other kind of identifier at compile time.
pub struct ID<T> {
    inner: uuid::Uuid,
    marker: PhantomData<T>,
}

impl<T> ID<T> {
    pub fn inner(&self) -> uuid::Uuid {
        self.inner
    }
}

impl<T> From<uuid::Uuid> for ID<T> {
    fn from(inner: uuid::Uuid) -> Self {
        Self {
            inner,
            marker: PhantomData,
        }
    }
}

impl<T> TryFrom<&str> for ID<T> {
    type Error = uuid::Error;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        uuid::Uuid::parse_str(s).map(Self::from)
    }
}

impl<T> Default for ID<T> {
    fn default() -> Self {
        Self::from(uuid::Uuid::now_v7())
    }
}

impl<T> Copy for ID<T> {}
impl<T> Clone for ID<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Eq for ID<T> {}
impl<T> PartialEq for ID<T> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<T> Ord for ID<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.inner.cmp(&other.inner)
    }
}
impl<T> PartialOrd for ID<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Hash for ID<T> {
    fn hash<H>(&self, state: &mut H)
    where
        H: Hasher,
    {
        self.inner.hash(state);
    }
}

impl<T> Debug for ID<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ID").field(&self.inner).finish()
    }
}
impl<T> Display for ID<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.inner, f)
    }
}

impl<T> serde::Serialize for ID<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.inner.serialize(serializer)
    }
}

// ============================================================================
// GAME PARAMETERS
// ============================================================================
/// Default starting stack for every seat.
pub const STACK: Chips = 10_000;
/// Default small blind.
pub const S_BLIND: Chips = 50;
/// Default big blind.
pub const B_BLIND: Chips = 100;
/// Default number of hands per session.
pub const HANDS: usize = 10;
/// Default seconds a human has to act.
pub const TURN_TIMEOUT: u64 = 30;
/// Longest turn a session may be configured with, in seconds.
pub const MAX_TURN_TIMEOUT: u64 = 3600;
/// Maximum LLM opponents at one table.
pub const MAX_OPPONENTS: usize = 5;

// ============================================================================
// STREAMING & TIMING
// ============================================================================
/// Characters accumulated before a thinking batch is flushed.
pub const BATCH_SIZE: usize = 5;
/// Maximum age of a thinking batch before it is flushed.
pub const BATCH_DELAY: std::time::Duration = std::time::Duration::from_millis(50);
/// Interval between timer ticks sent to observers.
pub const TICK_INTERVAL: std::time::Duration = std::time::Duration::from_secs(1);
/// Pause between consecutive hands.
pub const HAND_PAUSE: std::time::Duration = std::time::Duration::from_secs(2);
/// Slack past a human deadline before the coordinator stops waiting on the timer.
pub const TURN_GRACE: std::time::Duration = std::time::Duration::from_secs(5);

// ============================================================================
// INFERENCE
// ============================================================================
/// Sampling temperature for agent decisions.
pub const TEMPERATURE: f32 = 0.6;
/// Token budget for one agent decision.
pub const MAX_TOKENS: u32 = 2048;
/// Request timeout for one inference call, in seconds.
pub const INFERENCE_TIMEOUT: u64 = 120;
/// Concurrent inference requests allowed process-wide.
pub const INFERENCE_PERMITS: usize = 1;

// ============================================================================
// RUNTIME UTILITIES
// ============================================================================
/// Initialize dual logging (terminal + file) with timestamped log files.
/// Creates `logs/` and writes DEBUG to file, `term` and above to terminal.
#[cfg(feature = "server")]
pub fn log(term: log::LevelFilter) -> anyhow::Result<()> {
    std::fs::create_dir_all("logs")?;
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let time = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)?
        .as_secs();
    let file = simplelog::WriteLogger::new(
        log::LevelFilter::Debug,
        config.clone(),
        std::fs::File::create(format!("logs/{}.log", time))?,
    );
    let term = simplelog::TermLogger::new(
        term,
        config.clone(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    simplelog::CombinedLogger::init(vec![term, file])?;
    Ok(())
}

/// Register Ctrl+C handler for immediate termination.
#[cfg(feature = "server")]
pub fn kys() {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!();
            log::warn!("interrupt received, exiting immediately");
            std::process::exit(0);
        }
    });
}
