// Station cache - In-memory TTL cache of recently fetched upstream payloads
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Value, json};
use tokio::sync::RwLock;

use super::clock::Clock;

pub const STATES_KEY: &str = "states";

#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub key: String,
    pub payload: Value,
    pub last_updated_at: DateTime<Utc>,
}

impl CacheEntry {
    /// The payload as served from cache: object payloads gain `cached: true`
    /// and `cachedAt`, anything else is returned as stored.
    pub fn served(&self) -> Value {
        let mut payload = self.payload.clone();
        if let Value::Object(fields) = &mut payload {
            fields.insert("cached".to_string(), Value::Bool(true));
            fields.insert("cachedAt".to_string(), json!(self.last_updated_at));
        }
        payload
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatus {
    pub entries: usize,
    pub states_cached: bool,
    pub last_updated: Option<DateTime<Utc>>,
}

/// Keyed by station code or list name. Reads do not check freshness: an entry
/// is served until [`StationCache::sweep`] removes it.
pub struct StationCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl StationCache {
    pub fn new(clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
            ttl,
        }
    }

    pub async fn get(&self, key: &str) -> Option<CacheEntry> {
        self.entries.read().await.get(key).cloned()
    }

    /// Insert or overwrite `key`, stamped with the current time.
    pub async fn put(&self, key: impl Into<String>, payload: Value) {
        let key = key.into();
        let entry = CacheEntry {
            key: key.clone(),
            payload,
            last_updated_at: self.clock.now(),
        };
        self.entries.write().await.insert(key, entry);
    }

    /// Remove every entry older than `max_age`. Returns how many were removed.
    pub async fn sweep(&self, max_age: Duration) -> usize {
        let now = self.clock.now();
        // Durations beyond chrono's range can never be exceeded.
        let Ok(max_age) = chrono::Duration::from_std(max_age) else {
            return 0;
        };

        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| {
            let keep = now - entry.last_updated_at <= max_age;
            if !keep {
                tracing::debug!(key = %entry.key, "evicting stale cache entry");
            }
            keep
        });
        let removed = before - entries.len();

        if removed > 0 {
            tracing::info!(removed, remaining = entries.len(), "swept stale cache entries");
        }
        removed
    }

    /// Sweep with the TTL the cache was built with.
    pub async fn sweep_expired(&self) -> usize {
        self.sweep(self.ttl).await
    }

    pub async fn status(&self) -> CacheStatus {
        let entries = self.entries.read().await;
        CacheStatus {
            entries: entries.len(),
            states_cached: entries.contains_key(STATES_KEY),
            last_updated: entries.values().map(|e| e.last_updated_at).max(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ManualClock, fixed_now};

    const DAY: Duration = Duration::from_secs(24 * 3600);

    fn cache_with_clock() -> (StationCache, Arc<ManualClock>) {
        let clock = ManualClock::at(fixed_now());
        (StationCache::new(clock.clone(), DAY), clock)
    }

    #[tokio::test]
    async fn test_put_then_get_returns_payload() {
        let (cache, _) = cache_with_clock();
        cache.put("W12345", json!([1.5, 2.5])).await;

        let entry = cache.get("W12345").await.expect("entry should be present");
        assert_eq!(entry.payload, json!([1.5, 2.5]));
        assert_eq!(entry.key, "W12345");
        assert_eq!(entry.last_updated_at, fixed_now());
    }

    #[tokio::test]
    async fn test_put_overwrites_and_restamps() {
        let (cache, clock) = cache_with_clock();
        cache.put(STATES_KEY, json!(["KA"])).await;
        clock.advance(chrono::Duration::hours(2));
        cache.put(STATES_KEY, json!(["KA", "MH"])).await;

        let entry = cache.get(STATES_KEY).await.unwrap();
        assert_eq!(entry.payload, json!(["KA", "MH"]));
        assert_eq!(entry.last_updated_at, fixed_now() + chrono::Duration::hours(2));
    }

    #[tokio::test]
    async fn test_sweep_removes_entries_older_than_max_age() {
        let (cache, clock) = cache_with_clock();
        cache.put("old", json!(1)).await;
        clock.advance(chrono::Duration::hours(20));
        cache.put("young", json!(2)).await;
        clock.advance(chrono::Duration::hours(5));

        // "old" is 25h old, "young" is 5h old.
        let removed = cache.sweep(DAY).await;

        assert_eq!(removed, 1);
        assert!(cache.get("old").await.is_none());
        assert!(cache.get("young").await.is_some());
    }

    #[tokio::test]
    async fn test_entry_exactly_at_max_age_survives() {
        let (cache, clock) = cache_with_clock();
        cache.put("edge", json!(1)).await;
        clock.advance(chrono::Duration::hours(24));

        assert_eq!(cache.sweep(DAY).await, 0);
        assert!(cache.get("edge").await.is_some());
    }

    #[tokio::test]
    async fn test_reads_do_not_check_freshness() {
        let (cache, clock) = cache_with_clock();
        cache.put("stale", json!("still here")).await;
        clock.advance(chrono::Duration::days(3));

        assert!(cache.get("stale").await.is_some(), "only a sweep evicts");
        assert_eq!(cache.sweep_expired().await, 1);
        assert!(cache.get("stale").await.is_none());
    }

    #[tokio::test]
    async fn test_served_entry_is_marked_as_cached() {
        let (cache, _) = cache_with_clock();
        cache.put(STATES_KEY, json!({ "statusCode": 200, "data": ["KA"] })).await;
        cache.put("list", json!(["KA"])).await;

        let served = cache.get(STATES_KEY).await.unwrap().served();
        assert_eq!(served["data"], json!(["KA"]));
        assert_eq!(served["cached"], true);
        assert_eq!(served["cachedAt"], "2024-05-01T13:00:00Z");

        assert_eq!(cache.get("list").await.unwrap().served(), json!(["KA"]));
    }

    #[tokio::test]
    async fn test_status_reports_states_and_latest_update() {
        let (cache, clock) = cache_with_clock();
        assert_eq!(
            cache.status().await,
            CacheStatus {
                entries: 0,
                states_cached: false,
                last_updated: None
            }
        );

        cache.put(STATES_KEY, json!([])).await;
        clock.advance(chrono::Duration::minutes(10));
        cache.put("W1", json!([])).await;

        let status = cache.status().await;
        assert_eq!(status.entries, 2);
        assert!(status.states_cached);
        assert_eq!(status.last_updated, Some(fixed_now() + chrono::Duration::minutes(10)));
    }
}
