// Application state for HTTP handlers
use crate::application::cache::StationCache;
use crate::application::clock::Clock;
use crate::application::proxy_service::ProxyService;
use crate::application::station_service::StationService;
use chrono::{DateTime, Utc};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub proxy_service: ProxyService,
    pub station_service: StationService,
    pub cache: Arc<StationCache>,
    pub clock: Arc<dyn Clock>,
    pub started_at: DateTime<Utc>,
}
