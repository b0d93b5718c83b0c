//! Count-down latch
//!
//! Waiters suspend until the count reaches zero or their timeout expires.
//! Expiry is reported as `false`, never as an error.

use std::time::Duration;

use tokio::sync::watch;

#[derive(Debug)]
pub struct CountDownLatch {
    remaining: watch::Sender<usize>,
}

impl CountDownLatch {
    pub fn new(count: usize) -> Self {
        let (remaining, _) = watch::channel(count);
        Self { remaining }
    }

    /// Decrement the count, saturating at zero.
    pub fn count_down(&self) {
        self.remaining.send_modify(|n| *n = n.saturating_sub(1));
    }

    pub fn count(&self) -> usize {
        *self.remaining.borrow()
    }

    /// Wait for the count to reach zero. Returns `false` if `timeout` elapses
    /// first.
    pub async fn await_timeout(&self, timeout: Duration) -> bool {
        let mut rx = self.remaining.subscribe();
        tokio::time::timeout(timeout, rx.wait_for(|n| *n == 0))
            .await
            .map(|reached| reached.is_ok())
            .unwrap_or(false)
    }
}
