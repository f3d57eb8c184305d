// Detached periodic tasks: cache sweeping and states-list refresh
use crate::application::cache::StationCache;
use crate::application::proxy_service::ProxyService;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval, interval_at};

/// Sweep entries older than the cache TTL every `every`, starting one period from now.
pub fn spawn_cache_sweeper(cache: Arc<StationCache>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + every, every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let removed = cache.sweep_expired().await;
            tracing::debug!(removed, "cache sweep finished");
        }
    })
}

/// Refresh the cached states list immediately and then every `every`.
/// Failures are logged and retried on the next tick.
pub fn spawn_states_refresher(proxy: ProxyService, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match proxy.refresh_states().await {
                Ok(()) => tracing::info!("states list refreshed"),
                Err(e) => tracing::warn!(error = %e, "states list refresh failed"),
            }
        }
    })
}
