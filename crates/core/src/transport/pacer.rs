use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::debug;

/// Minimum-interval gate for one remote endpoint.
///
/// `wait` returns once at least `interval` has passed since the previous
/// call returned. Callers are serialized on the internal lock, so concurrent
/// callers are spaced out too.
pub struct Pacer {
    name: &'static str,
    interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl Pacer {
    pub fn new(name: &'static str, interval: Duration) -> Self {
        Self {
            name,
            interval,
            last: Mutex::new(None),
        }
    }

    pub async fn wait(&self) {
        let mut last = self.last.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.interval {
                let wait_time = self.interval - elapsed;
                debug!("{} pacing: waiting {:?}", self.name, wait_time);
                sleep(wait_time).await;
            }
        }

        *last = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_first_wait_is_immediate() {
        let pacer = Pacer::new("search", Duration::from_millis(50));
        let started = Instant::now();
        pacer.wait().await;
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_consecutive_waits_are_spaced() {
        let pacer = Pacer::new("detail", Duration::from_millis(50));
        let started = Instant::now();
        pacer.wait().await;
        pacer.wait().await;
        pacer.wait().await;
        assert!(started.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_wait_after_interval_elapsed() {
        let pacer = Pacer::new("detail", Duration::from_millis(50));
        pacer.wait().await;
        sleep(Duration::from_millis(80)).await;

        let before = Instant::now();
        pacer.wait().await;
        assert_eq!(before.elapsed(), Duration::ZERO);
    }
}
