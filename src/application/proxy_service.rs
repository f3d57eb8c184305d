// Proxy service - Route table and pass-through forwarding
use crate::application::cache::{CacheEntry, STATES_KEY, StationCache};
use crate::application::error::{ServiceError, ServiceResult, UpstreamError};
use crate::application::upstream::UpstreamClient;
use serde_json::{Value, json};
use std::sync::Arc;

/// A logical endpoint exposed to clients and the India-WRIS path behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub name: &'static str,
    pub path: &'static str,
    /// Successful responses are stored under this key
    pub cache_key: Option<&'static str>,
}

pub const TIME_SERIES_ROUTE: &str = "time-series";
pub const TIME_SERIES_PATH: &str = "/CommonDataSetMasterAPI/getCommonDataSetByStationCode";

pub const WRIS_ROUTES: &[Route] = &[
    Route {
        name: "states",
        path: "/masterState/StateList",
        cache_key: Some(STATES_KEY),
    },
    Route {
        name: "districts",
        path: "/masterDistrict/getDistrictbyState",
        cache_key: None,
    },
    Route {
        name: "stations",
        path: "/masterStation/getMasterStation",
        cache_key: Some("stations"),
    },
    Route {
        name: "telemetric-stations",
        path: "/masterStation/getTelemetricStation",
        cache_key: None,
    },
    Route {
        name: TIME_SERIES_ROUTE,
        path: TIME_SERIES_PATH,
        cache_key: None,
    },
];

pub fn resolve_route(name: &str) -> Option<&'static Route> {
    WRIS_ROUTES.iter().find(|route| route.name == name)
}

fn lookup(endpoint: &str) -> ServiceResult<&'static Route> {
    resolve_route(endpoint).ok_or_else(|| ServiceError::InvalidRequest(format!("unknown endpoint '{}'", endpoint)))
}

#[derive(Clone)]
pub struct ProxyService {
    wris: UpstreamClient,
    cgwb: UpstreamClient,
    cache: Arc<StationCache>,
}

impl ProxyService {
    pub fn new(wris: UpstreamClient, cgwb: UpstreamClient, cache: Arc<StationCache>) -> Self {
        Self { wris, cgwb, cache }
    }

    /// Forward `body` unchanged to the India-WRIS endpoint registered as `endpoint`.
    ///
    /// When the upstream fails on a cached route, the last cached payload is
    /// served instead, marked with `cached: true`.
    pub async fn forward(&self, endpoint: &str, body: &Value) -> ServiceResult<Value> {
        let route = lookup(endpoint)?;

        match self.fetch(route, body).await {
            Ok(value) => Ok(value),
            Err(e) => match self.cached(route).await {
                Some(entry) => {
                    tracing::warn!(endpoint, error = %e, cached_at = %entry.last_updated_at, "serving cached response");
                    Ok(entry.served())
                }
                None => Err(e.into()),
            },
        }
    }

    /// Pass a CGWB GET through; `path` may carry a query string.
    pub async fn cgwb(&self, path: &str) -> ServiceResult<Value> {
        let path = format!("/{}", path.trim_start_matches('/'));
        let response = self.cgwb.get(&path).await?;
        tracing::info!(path = %path, attempts = response.attempts, "cgwb request completed");
        Ok(response.value)
    }

    /// Re-fetch the states list into the cache. Never falls back to the cache.
    pub async fn refresh_states(&self) -> ServiceResult<()> {
        let route = lookup("states")?;
        self.fetch(route, &json!({})).await?;
        Ok(())
    }

    async fn fetch(&self, route: &Route, body: &Value) -> Result<Value, UpstreamError> {
        let response = self.wris.post(route.path, body).await?;
        tracing::info!(endpoint = route.name, attempts = response.attempts, "india-wris request completed");

        if let Some(key) = route.cache_key {
            self.cache.put(key, response.value.clone()).await;
        }

        Ok(response.value)
    }

    async fn cached(&self, route: &Route) -> Option<CacheEntry> {
        self.cache.get(route.cache_key?).await
    }

    pub fn wris_base_url(&self) -> &str {
        self.wris.base_url()
    }

    pub fn cgwb_base_url(&self) -> &str {
        self.cgwb.base_url()
    }
}
