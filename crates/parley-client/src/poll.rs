//! Periodic polling fallback for when the live channel is down.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// Handle to a background polling task. Aborted on drop.
pub struct Poller {
    handle: JoinHandle<()>,
}

impl Poller {
    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Invoke `poll` at a fixed interval until the returned [`Poller`] is
/// stopped or dropped. Slow polls delay the next tick instead of
/// bursting to catch up.
pub fn spawn_poller<F, Fut>(interval: Duration, mut poll: F) -> Poller
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send,
{
    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            poll().await;
        }
    });
    debug!(interval_ms = interval.as_millis() as u64, "Started polling fallback");
    Poller { handle }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_poller_ticks_and_stops() {
        let count = Arc::new(AtomicU32::new(0));
        let count_clone = count.clone();

        let poller = spawn_poller(Duration::from_millis(10), move || {
            let count = count_clone.clone();
            async move {
                count.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_millis(60)).await;
        poller.stop();
        let after_stop = count.load(Ordering::SeqCst);
        assert!(after_stop >= 2, "expected at least two polls, got {after_stop}");

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(count.load(Ordering::SeqCst), after_stop);
    }
}
