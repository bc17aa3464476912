//! Trailing-edge debounce for regeneration.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::trace;

type SettleFn = Arc<dyn Fn() + Send + Sync>;

/// Fires a callback once after a burst of activity settles.
///
/// Every [`Debouncer::arm`] restarts the quiet period. The callback runs only
/// when a full period passes with no further arming, so a burst of N events
/// spaced closer than the timeout produces exactly one call.
pub struct Debouncer {
    state: Arc<Mutex<DebounceState>>,
    on_settle: SettleFn,
}

struct DebounceState {
    timeout: Duration,
    generation: u64,
    timer: Option<JoinHandle<()>>,
}

impl Debouncer {
    /// Create a debouncer that calls `on_settle` after `timeout` of quiet.
    pub fn new(timeout: Duration, on_settle: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            state: Arc::new(Mutex::new(DebounceState {
                timeout,
                generation: 0,
                timer: None,
            })),
            on_settle: Arc::new(on_settle),
        }
    }

    /// Start or restart the quiet period. Must be called within a tokio runtime.
    pub fn arm(&self) {
        let mut state = self.state.lock();
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
        state.generation = state.generation.wrapping_add(1);

        let generation = state.generation;
        let timeout = state.timeout;
        let shared = Arc::clone(&self.state);
        let on_settle = Arc::clone(&self.on_settle);

        state.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(timeout).await;

            {
                let mut state = shared.lock();
                // Lost the race with a newer arm.
                if state.generation != generation {
                    return;
                }
                state.timer = None;
            }

            trace!("Debounce settled after {timeout:?}");
            on_settle();
        }));
    }

    /// Cancel a pending callback, if any.
    pub fn cancel(&self) {
        let mut state = self.state.lock();
        state.generation = state.generation.wrapping_add(1);
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
    }

    /// Whether a callback is scheduled.
    pub fn is_pending(&self) -> bool {
        self.state.lock().timer.is_some()
    }

    /// The quiet period.
    pub fn timeout(&self) -> Duration {
        self.state.lock().timeout
    }

    /// Change the quiet period. Takes effect on the next arm.
    pub fn set_timeout(&self, timeout: Duration) {
        self.state.lock().timeout = timeout;
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting(timeout: Duration) -> (Debouncer, Arc<AtomicUsize>) {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        let debouncer = Debouncer::new(timeout, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (debouncer, fired)
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_fires_once() {
        let (debouncer, fired) = counting(Duration::from_millis(500));

        for _ in 0..10 {
            debouncer.arm();
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(debouncer.is_pending());

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_spaced_arms_fire_each_time() {
        let (debouncer, fired) = counting(Duration::from_millis(500));

        for _ in 0..3 {
            debouncer.arm();
            tokio::time::sleep(Duration::from_millis(700)).await;
        }

        assert_eq!(fired.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_drops_pending_callback() {
        let (debouncer, fired) = counting(Duration::from_millis(500));

        debouncer.arm();
        debouncer.cancel();
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_timeout_applies_on_next_arm() {
        let (debouncer, fired) = counting(Duration::from_millis(500));
        debouncer.set_timeout(Duration::from_secs(2));
        assert_eq!(debouncer.timeout(), Duration::from_secs(2));

        debouncer.arm();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
