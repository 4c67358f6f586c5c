use std::time::Duration;

use tokio::time::{Instant, sleep};

/// Polls `check` every few milliseconds until it passes or `timeout` elapses.
pub async fn wait_for(timeout: Duration, what: &str, mut check: impl FnMut() -> bool) {
    let deadline = Instant::now() + timeout;
    while !check() {
        if Instant::now() >= deadline {
            panic!("timed out after {timeout:?} waiting for {what}");
        }
        sleep(Duration::from_millis(5)).await;
    }
}
