use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use super::ResultCache;

/// Periodically purge expired entries until the shutdown signal fires.
///
/// The first sweep happens one full `period` after spawning.
pub fn spawn_sweeper<V>(
    cache: ResultCache<V>,
    period: Duration,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> JoinHandle<()>
where
    V: Clone + Send + Sync + 'static,
{
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(period_secs = period.as_secs(), "Cache sweeper started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = cache.purge_expired();
                    if removed > 0 {
                        debug!(removed, remaining = cache.len(), "Purged expired cache entries");
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Cache sweeper shutting down");
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_purges_and_stops() {
        let cache: ResultCache<u8> = ResultCache::new(Duration::from_secs(60));
        cache.put("a", 1, Duration::from_secs(5));
        cache.put("b", 2, Duration::from_secs(120));

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let handle = spawn_sweeper(cache.clone(), Duration::from_secs(30), shutdown_rx);

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().expirations, 1);

        shutdown_tx.send(()).unwrap();
        handle.await.unwrap();
    }
}
