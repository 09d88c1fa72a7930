use std::future::Future;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};

/// Enforces a minimum spacing between successive calls to an external
/// service. The interval is measured from the completion of the previous
/// call to the start of the next, and calls never overlap.
#[derive(Debug)]
pub struct Throttle {
    min_interval: Duration,
    last_finished: Mutex<Option<Instant>>,
}

impl Throttle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_finished: Mutex::new(None),
        }
    }

    /// Wait out the remaining interval, then drive `call` to completion.
    pub async fn run<F, T>(&self, call: F) -> T
    where
        F: Future<Output = T>,
    {
        let mut last = self.last_finished.lock().await;
        if let Some(finished) = *last {
            sleep_until(finished + self.min_interval).await;
        }

        let output = call.await;
        *last = Some(Instant::now());
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_first_call_is_immediate() {
        let throttle = Throttle::new(Duration::from_secs(1));
        let start = Instant::now();
        throttle.run(async {}).await;
        assert!(start.elapsed() < Duration::from_millis(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_calls_are_spaced() {
        let throttle = Throttle::new(Duration::from_secs(1));
        let mut starts = Vec::new();

        for _ in 0..3 {
            throttle
                .run(async {
                    starts.push(Instant::now());
                    // Simulated round-trip
                    tokio::time::sleep(Duration::from_millis(300)).await;
                })
                .await;
        }

        for pair in starts.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_millis(1300));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_time_counts_toward_interval() {
        let throttle = Throttle::new(Duration::from_secs(1));
        throttle.run(async {}).await;

        tokio::time::sleep(Duration::from_secs(5)).await;

        let before = Instant::now();
        throttle.run(async {}).await;
        assert!(before.elapsed() < Duration::from_millis(10));
    }
}
