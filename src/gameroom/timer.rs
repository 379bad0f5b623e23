use futures::future::BoxFuture;
use std::sync::Arc;
use std::sync::Mutex as SyncMutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Invoked once when the deadline passes without a cancel.
pub type Expiry = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>;
/// Invoked roughly once per interval with whole seconds remaining.
pub type Ticker = Box<dyn FnMut(u64) -> BoxFuture<'static, ()> + Send>;

/// State shared between the timer and its two tasks.
#[derive(Debug, Default)]
struct Clock {
    started: SyncMutex<Option<Instant>>,
    cancelled: AtomicBool,
}

impl Clock {
    fn started(&self) -> Option<Instant> {
        self.started.lock().map(|s| *s).unwrap_or_else(|e| *e.into_inner())
    }
    fn stamp(&self, at: Option<Instant>) {
        match self.started.lock() {
            Ok(mut started) => *started = at,
            Err(e) => *e.into_inner() = at,
        }
    }
    fn cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
    fn remaining(&self, duration: Duration) -> u64 {
        let left = match self.started() {
            Some(t) => duration.saturating_sub(t.elapsed()),
            None => duration,
        };
        left.as_secs() + u64::from(left.subsec_nanos() > 0)
    }
}

/// Restartable, cancellable countdown for one pending turn.
///
/// `start` spawns a deadline task and, optionally, a tick task. `cancel`
/// raises the cancelled flag before aborting and awaiting both tasks, so
/// once it returns the expiry callback can no longer run. The same timer is
/// reused turn after turn.
pub struct Timer {
    duration: Duration,
    interval: Duration,
    clock: Arc<Clock>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Timer {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            interval: crate::TICK_INTERVAL,
            clock: Arc::new(Clock::default()),
            tasks: Mutex::new(Vec::new()),
        }
    }
    pub fn duration(&self) -> Duration {
        self.duration
    }
    /// Whole seconds left, rounded up and clamped to `[0, duration]`.
    /// Measured from the start instant, never decremented.
    pub fn remaining(&self) -> u64 {
        self.clock.remaining(self.duration)
    }
    pub fn is_running(&self) -> bool {
        self.clock.started().is_some() && !self.clock.cancelled()
    }

    /// Arms the timer, retiring any tasks left from a previous start.
    pub async fn start(&self, expiry: Expiry, ticker: Option<Ticker>) {
        let mut tasks = self.tasks.lock().await;
        Self::retire(&self.clock, &mut tasks).await;
        self.clock.cancelled.store(false, Ordering::SeqCst);
        self.clock.stamp(Some(Instant::now()));
        let clock = self.clock.clone();
        let duration = self.duration;
        tasks.push(tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            if !clock.cancelled() {
                expiry().await;
            }
        }));
        if let Some(mut ticker) = ticker {
            let clock = self.clock.clone();
            let interval = self.interval;
            tasks.push(tokio::spawn(async move {
                while !clock.cancelled() {
                    let remaining = clock.remaining(duration);
                    ticker(remaining).await;
                    if remaining == 0 {
                        break;
                    }
                    tokio::time::sleep(interval).await;
                }
            }));
        }
    }

    /// Disarms the timer. Idempotent; a no-op when idle.
    pub async fn cancel(&self) {
        let mut tasks = self.tasks.lock().await;
        Self::retire(&self.clock, &mut tasks).await;
        self.clock.stamp(None);
    }

    async fn retire(clock: &Clock, tasks: &mut Vec<JoinHandle<()>>) {
        clock.cancelled.store(true, Ordering::SeqCst);
        for task in tasks.drain(..) {
            task.abort();
            let _ = task.await;
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.clock.cancelled.store(true, Ordering::SeqCst);
        if let Ok(tasks) = self.tasks.try_lock() {
            tasks.iter().for_each(|t| t.abort());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use rand::Rng;
    use std::sync::atomic::AtomicUsize;

    fn counter() -> (Arc<AtomicUsize>, Expiry) {
        let fired = Arc::new(AtomicUsize::new(0));
        let inner = fired.clone();
        let expiry: Expiry = Box::new(move || {
            async move {
                inner.fetch_add(1, Ordering::SeqCst);
            }
            .boxed()
        });
        (fired, expiry)
    }

    #[tokio::test(start_paused = true)]
    async fn fires_after_duration() {
        let timer = Timer::new(Duration::from_secs(2));
        let (fired, expiry) = counter();
        timer.start(expiry, None).await;
        assert!(timer.is_running());
        tokio::time::sleep(Duration::from_millis(1999)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_duration_fires_on_its_own() {
        let timer = Timer::new(Duration::ZERO);
        let (fired, expiry) = counter();
        timer.start(expiry, None).await;
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_before_deadline_never_fires() {
        let mut rng = rand::rng();
        for _ in 0..64 {
            let timer = Timer::new(Duration::from_millis(100));
            let (fired, expiry) = counter();
            timer.start(expiry, None).await;
            let wait = rng.random_range(90..100);
            tokio::time::sleep(Duration::from_millis(wait)).await;
            timer.cancel().await;
            tokio::time::sleep(Duration::from_millis(200)).await;
            assert_eq!(fired.load(Ordering::SeqCst), 0);
            assert!(!timer.is_running());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_is_idempotent() {
        let timer = Timer::new(Duration::from_secs(1));
        timer.cancel().await;
        let (fired, expiry) = counter();
        timer.start(expiry, None).await;
        timer.cancel().await;
        timer.cancel().await;
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(timer.remaining(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_retires_previous_deadline() {
        let timer = Timer::new(Duration::from_secs(1));
        let (first, expiry) = counter();
        timer.start(expiry, None).await;
        tokio::time::sleep(Duration::from_millis(500)).await;
        let (second, expiry) = counter();
        timer.start(expiry, None).await;
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_count_down_to_zero_and_stop() {
        let timer = Timer::new(Duration::from_secs(3));
        let ticks = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = ticks.clone();
        let ticker: Ticker = Box::new(move |n: u64| {
            let sink = sink.clone();
            async move { sink.lock().unwrap().push(n) }.boxed()
        });
        let (_, expiry) = counter();
        timer.start(expiry, Some(ticker)).await;
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(*ticks.lock().unwrap(), vec![3, 2, 1, 0]);
    }

    #[tokio::test(start_paused = true)]
    async fn remaining_is_clamped() {
        let timer = Timer::new(Duration::from_secs(2));
        assert_eq!(timer.remaining(), 2);
        let (_, expiry) = counter();
        timer.start(expiry, None).await;
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(timer.remaining(), 2);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(timer.remaining(), 0);
    }
}
