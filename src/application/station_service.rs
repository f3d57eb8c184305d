// Station service - Water level time series with derived analytics
use crate::application::cache::StationCache;
use crate::application::clock::Clock;
use crate::application::error::{ServiceError, ServiceResult};
use crate::application::proxy_service::TIME_SERIES_PATH;
use crate::application::upstream::UpstreamClient;
use crate::domain::analytics::{ClassifierConfig, StationAnalytics, analyze};
use crate::domain::reading::{Reading, readings_from_payload};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use serde_json::{Value, json};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_DAYS: u32 = 30;
pub const MAX_DAYS: u32 = 365;
const DATASET_CODE: &str = "GWATERLVL";

/// How bulk requests are paced against the upstream.
#[derive(Debug, Clone, Copy)]
pub struct BulkPacing {
    pub chunk_size: usize,
    pub chunk_delay: Duration,
}

impl Default for BulkPacing {
    fn default() -> Self {
        Self {
            chunk_size: 5,
            chunk_delay: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StationWaterLevel {
    pub station_code: String,
    pub readings: Vec<Reading>,
    pub analytics: StationAnalytics,
    /// Set when the upstream failed and the readings came from the cache
    pub cached_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StationSummary {
    pub data: Vec<Reading>,
    pub latest: Option<Reading>,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached_at: Option<DateTime<Utc>>,
}

/// Readings for one station and, if served from the cache, when they were stored.
struct FetchedReadings {
    readings: Vec<Reading>,
    cached_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BulkWaterLevel {
    pub results: BTreeMap<String, StationSummary>,
    pub errors: BTreeMap<String, String>,
}

#[derive(Clone)]
pub struct StationService {
    wris: UpstreamClient,
    cache: Arc<StationCache>,
    clock: Arc<dyn Clock>,
    classifier: ClassifierConfig,
    pacing: BulkPacing,
}

impl StationService {
    pub fn new(
        wris: UpstreamClient,
        cache: Arc<StationCache>,
        clock: Arc<dyn Clock>,
        classifier: ClassifierConfig,
        pacing: BulkPacing,
    ) -> Self {
        Self {
            wris,
            cache,
            clock,
            classifier,
            pacing,
        }
    }

    /// Readings for one station over the last `days` days, with analytics.
    ///
    /// An empty `readings` list is a valid outcome (no data), not an error.
    pub async fn water_level(&self, station_code: &str, days: Option<u32>) -> ServiceResult<StationWaterLevel> {
        let station_code = normalize_code(station_code)?;
        let days = validate_days(days)?;

        let FetchedReadings { readings, cached_at } = self.fetch_readings(&station_code, days).await?;
        let analytics = analyze(&readings, days, self.clock.now(), &self.classifier);

        tracing::info!(
            station_code = %station_code,
            readings = readings.len(),
            trend = ?analytics.trend,
            status = ?analytics.critical_status,
            cached = cached_at.is_some(),
            "water level analysed"
        );

        Ok(StationWaterLevel {
            station_code,
            readings,
            analytics,
            cached_at,
        })
    }

    /// Fetch many stations in fixed-size chunks with a pause between chunks.
    ///
    /// A failing station is reported in `errors` and never aborts the batch.
    pub async fn bulk_water_level(&self, station_codes: &[String], days: Option<u32>) -> ServiceResult<BulkWaterLevel> {
        let days = validate_days(days)?;

        let mut seen = HashSet::new();
        let codes: Vec<String> = station_codes
            .iter()
            .map(|code| code.trim().to_string())
            .filter(|code| !code.is_empty() && seen.insert(code.clone()))
            .collect();

        if codes.is_empty() {
            return Err(ServiceError::InvalidRequest("stationCodes must contain at least one station code".into()));
        }

        let mut bulk = BulkWaterLevel::default();
        let chunk_size = self.pacing.chunk_size.max(1);

        for (index, chunk) in codes.chunks(chunk_size).enumerate() {
            if index > 0 {
                tokio::time::sleep(self.pacing.chunk_delay).await;
            }
            tracing::debug!(chunk = index, stations = chunk.len(), "fetching bulk chunk");

            let outcomes = join_all(chunk.iter().map(|code| self.fetch_readings(code, days))).await;

            for (code, outcome) in chunk.iter().zip(outcomes) {
                match outcome {
                    Ok(FetchedReadings { readings, cached_at }) => {
                        let summary = StationSummary {
                            latest: readings.first().cloned(),
                            count: readings.len(),
                            data: readings,
                            cached_at,
                        };
                        bulk.results.insert(code.clone(), summary);
                    }
                    Err(e) => {
                        tracing::warn!(station_code = %code, error = %e, "bulk station fetch failed");
                        bulk.errors.insert(code.clone(), e.to_string());
                    }
                }
            }
        }

        tracing::info!(
            stations = codes.len(),
            succeeded = bulk.results.len(),
            failed = bulk.errors.len(),
            "bulk water level completed"
        );
        Ok(bulk)
    }

    /// Fetch fresh readings, falling back to the station's cached readings when
    /// the upstream fails. The cached set may cover a different window than `days`.
    async fn fetch_readings(&self, station_code: &str, days: u32) -> ServiceResult<FetchedReadings> {
        let payload = self.time_series_request(station_code, days);
        let response = match self.wris.post(TIME_SERIES_PATH, &payload).await {
            Ok(response) => response,
            Err(e) => {
                return match self.cached_readings(station_code).await {
                    Some(fallback) => {
                        tracing::warn!(station_code, error = %e, "serving cached readings");
                        Ok(fallback)
                    }
                    None => Err(e.into()),
                };
            }
        };
        let readings = readings_from_payload(&response.value);

        if readings.is_empty() {
            tracing::debug!(station_code, "no readings returned");
        } else {
            match serde_json::to_value(&readings) {
                Ok(cached) => self.cache.put(station_code, cached).await,
                Err(e) => tracing::warn!(station_code, error = %e, "readings not cached"),
            }
        }

        Ok(FetchedReadings {
            readings,
            cached_at: None,
        })
    }

    async fn cached_readings(&self, station_code: &str) -> Option<FetchedReadings> {
        let entry = self.cache.get(station_code).await?;
        let readings = serde_json::from_value::<Vec<Reading>>(entry.payload).ok()?;
        Some(FetchedReadings {
            readings,
            cached_at: Some(entry.last_updated_at),
        })
    }

    fn time_series_request(&self, station_code: &str, days: u32) -> Value {
        let end = self.clock.now();
        let start = end - chrono::Duration::days(i64::from(days));
        json!({
            "stationCode": station_code,
            "startDate": start.format("%Y-%m-%d").to_string(),
            "endDate": end.format("%Y-%m-%d").to_string(),
            "datasetCode": DATASET_CODE,
        })
    }
}

fn normalize_code(station_code: &str) -> ServiceResult<String> {
    let code = station_code.trim();
    if code.is_empty() {
        return Err(ServiceError::InvalidRequest("stationCode is required".into()));
    }
    Ok(code.to_string())
}

fn validate_days(days: Option<u32>) -> ServiceResult<u32> {
    match days.unwrap_or(DEFAULT_DAYS) {
        0 => Err(ServiceError::InvalidRequest("days must be at least 1".into())),
        d if d > MAX_DAYS => Err(ServiceError::InvalidRequest(format!("days must be at most {}", MAX_DAYS))),
        d => Ok(d),
    }
}
