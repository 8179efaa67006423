//! Background sweep of expired lock records and cache entries
//!
//! Expiry is already enforced lazily on every read and write; the sweeper
//! only reclaims storage.

use super::coordinator::LockCoordinator;
use crate::core::traits::CacheBackend;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Start a task purging expired locks and cache entries every `every`
///
/// The task runs until the returned handle is aborted.
pub fn spawn_sweeper(
    coordinator: LockCoordinator,
    cache: Arc<dyn CacheBackend>,
    every: Duration,
) -> JoinHandle<()> {
    info!(
        interval_secs = every.as_secs_f64(),
        cache_backend = cache.name(),
        "Starting sweeper"
    );

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            match coordinator.purge_expired().await {
                Ok(0) => {}
                Ok(removed) => debug!(removed, "Lock sweep removed expired records"),
                Err(e) => warn!("Lock sweep failed: {}", e),
            }
            match cache.purge_expired().await {
                Ok(0) => {}
                Ok(removed) => debug!(removed, "Cache sweep removed expired entries"),
                Err(e) => warn!("Cache sweep failed: {}", e),
            }
        }
    })
}
