//! Scheduled cleanup of idle rate-limit windows.

use crate::rate_limit::RateLimits;
use std::time::Duration;
use tracing::info;

/// Interval between cleanup runs.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(15 * 60);

/// Run cleanup once.
pub fn run_cleanup(limits: &RateLimits) {
    let purged = limits.cleanup();
    if purged > 0 {
        info!("Purged {} idle rate-limit windows", purged);
    }
}

/// Spawn a background task that runs cleanup periodically.
/// Returns a handle that can be used to abort the task.
pub fn spawn_cleanup_scheduler(limits: RateLimits) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CLEANUP_INTERVAL);

        loop {
            interval.tick().await;
            run_cleanup(&limits);
        }
    })
}
