//! TTL Sweep Task
//!
//! Background task that periodically removes expired cache entries.

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::Cache;

/// Spawns a background task that periodically sweeps expired entries.
///
/// The interval is re-read from the cache configuration before every
/// pause, so `configure` changes apply from the next cycle on. The task
/// runs until its handle is aborted.
///
/// # Example
/// ```ignore
/// let cache = Cache::new(CacheConfig::default());
/// let sweeper = spawn_sweep_task(cache.clone());
/// // Later, during shutdown:
/// sweeper.abort();
/// ```
pub fn spawn_sweep_task(cache: Cache) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Starting TTL sweep task with interval of {:?}",
            cache.config().sweep_interval
        );

        loop {
            let interval = cache.config().sweep_interval;
            tokio::time::sleep(interval).await;

            let removed = cache.sweep();
            if removed > 0 {
                info!("TTL sweep: removed {} expired entries", removed);
            } else {
                debug!("TTL sweep: no expired entries found");
            }
        }
    })
}
