use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Coalesces a high-frequency fragment stream into bounded-rate batches.
///
/// A batch is emitted as soon as the buffer holds `size` characters or
/// `delay` has passed since the last emission. Callers must `flush` once
/// more when the upstream stream ends, whether or not it ended cleanly.
pub struct Batcher<E> {
    emit: E,
    buffer: String,
    chars: usize,
    flushed: Instant,
    size: usize,
    delay: Duration,
}

impl<E, F> Batcher<E>
where
    E: FnMut(String) -> F,
    F: Future<Output = ()>,
{
    pub fn new(emit: E) -> Self {
        Self::with_thresholds(emit, crate::BATCH_SIZE, crate::BATCH_DELAY)
    }
    pub fn with_thresholds(emit: E, size: usize, delay: Duration) -> Self {
        Self {
            emit,
            buffer: String::new(),
            chars: 0,
            flushed: Instant::now(),
            size,
            delay,
        }
    }
    pub async fn push(&mut self, fragment: &str) {
        self.buffer.push_str(fragment);
        self.chars += fragment.chars().count();
        if self.chars >= self.size || self.flushed.elapsed() >= self.delay {
            self.flush().await;
        }
    }
    /// Emits whatever is buffered. No-op when empty.
    pub async fn flush(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let batch = std::mem::take(&mut self.buffer);
        self.chars = 0;
        self.flushed = Instant::now();
        (self.emit)(batch).await;
    }
    pub fn pending(&self) -> &str {
        &self.buffer
    }
}
