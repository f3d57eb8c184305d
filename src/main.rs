// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;
#[cfg(test)]
mod test_support;

use std::{net::SocketAddr, sync::Arc};
use tracing_subscriber::EnvFilter;

use crate::application::cache::StationCache;
use crate::application::clock::{Clock, SystemClock};
use crate::application::maintenance::{spawn_cache_sweeper, spawn_states_refresher};
use crate::application::proxy_service::ProxyService;
use crate::application::station_service::StationService;
use crate::application::upstream::UpstreamClient;
use crate::infrastructure::config::load_app_config;
use crate::infrastructure::http_transport::HttpTransport;
use crate::presentation::app_state::AppState;
use crate::presentation::router::router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("hydrowatch_proxy=info,tower_http=info")),
        )
        .init();

    // Load configuration
    let config = load_app_config()?;

    // Upstream clients (infrastructure layer)
    let upstream = &config.upstream;
    let wris = UpstreamClient::new(
        Arc::new(HttpTransport::new(&upstream.wris_base_url, upstream.timeout())?),
        upstream.retry_policy(),
    );
    let cgwb = UpstreamClient::new(
        Arc::new(HttpTransport::new(&upstream.cgwb_base_url, upstream.timeout())?),
        upstream.retry_policy(),
    );

    // Shared cache, built once and passed by reference to everything that needs it
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let cache = Arc::new(StationCache::new(clock.clone(), config.cache.max_age()));

    // Create services (application layer)
    let proxy_service = ProxyService::new(wris.clone(), cgwb, cache.clone());
    let station_service = StationService::new(
        wris,
        cache.clone(),
        clock.clone(),
        config.classifier.clone(),
        config.bulk.pacing(),
    );

    // Background maintenance, detached from request handling
    spawn_cache_sweeper(cache.clone(), config.cache.sweep_interval());
    spawn_states_refresher(proxy_service.clone(), config.cache.refresh_interval());

    // Create application state
    let state = Arc::new(AppState {
        proxy_service,
        station_service,
        cache,
        started_at: clock.now(),
        clock,
    });

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!(%addr, wris = %upstream.wris_base_url, cgwb = %upstream.cgwb_base_url, "starting hydrowatch proxy");

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router(state)).await?;

    Ok(())
}
