use super::latch::CountDownLatch;
use super::logging;
use std::sync::Arc;
use std::time::Duration;

#[test]
fn logging_init_accepts_levels() {
    // Should not panic
    logging::init("info");
    logging::init("debug");
    logging::init("bogus");
}

#[tokio::test]
async fn test_latch_times_out_while_pending() {
    let latch = CountDownLatch::new(1);
    assert!(!latch.await_timeout(Duration::from_millis(20)).await);
    assert_eq!(latch.count(), 1);
}

#[tokio::test]
async fn test_latch_open_returns_immediately() {
    let latch = CountDownLatch::new(1);
    latch.count_down();
    assert!(latch.await_timeout(Duration::ZERO).await);
}

#[tokio::test]
async fn test_latch_count_down_saturates() {
    let latch = CountDownLatch::new(1);
    latch.count_down();
    latch.count_down();
    assert_eq!(latch.count(), 0);
}

#[tokio::test]
async fn test_latch_wakes_waiter() {
    let latch = Arc::new(CountDownLatch::new(2));
    let waiter = {
        let latch = latch.clone();
        tokio::spawn(async move { latch.await_timeout(Duration::from_secs(1)).await })
    };

    latch.count_down();
    latch.count_down();
    assert!(waiter.await.unwrap());
}
