use std::sync::Mutex;

use tokio::time::{sleep, Duration, Instant};

/// Shared back-pressure gate for the accrual worker pool.
///
/// A 429 from the accrual service pushes the gate's `not_before` deadline
/// forward. The deadline only ever moves to the maximum of the incoming
/// retry-after deadlines, so two workers observing a 429 at the same time
/// cannot "clear" each other's back-off the way a shared boolean would.
#[derive(Debug, Default)]
pub struct RateGate {
    not_before: Mutex<Option<Instant>>,
}

impl RateGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes the deadline to at least `wait` from now. Monotonic: an earlier
    /// deadline never replaces a later one.
    pub fn defer(&self, wait: Duration) {
        let deadline = Instant::now() + wait;
        let mut not_before = self.not_before.lock().expect("rate gate mutex poisoned");
        match *not_before {
            Some(current) if current >= deadline => {},
            _ => *not_before = Some(deadline),
        }
    }

    /// Remaining wait, or `None` if the gate is open.
    pub fn remaining(&self) -> Option<Duration> {
        let not_before = self.not_before.lock().expect("rate gate mutex poisoned");
        not_before.and_then(|deadline| deadline.checked_duration_since(Instant::now()))
    }

    /// Suspends until the deadline has passed, re-checking afterwards in case
    /// another worker pushed it further while we slept.
    pub async fn wait_until_open(&self) {
        while let Some(wait) = self.remaining() {
            sleep(wait).await;
        }
    }
}
