// Configuration loading - Optional TOML file plus HYDROWATCH__ environment overrides
use crate::application::retry::RetryPolicy;
use crate::application::station_service::BulkPacing;
use crate::domain::analytics::ClassifierConfig;
use serde::Deserialize;
use std::time::Duration;

pub const CONFIG_FILE: &str = "config/hydrowatch";
pub const ENV_PREFIX: &str = "HYDROWATCH";

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub upstream: UpstreamSettings,
    pub cache: CacheSettings,
    pub bulk: BulkSettings,
    pub classifier: ClassifierConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct UpstreamSettings {
    pub wris_base_url: String,
    pub cgwb_base_url: String,
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            wris_base_url: "https://indiawris.gov.in".to_string(),
            cgwb_base_url: "https://cgwb.gov.in/api".to_string(),
            timeout_secs: 30,
            max_attempts: 3,
            base_delay_ms: 1000,
        }
    }
}

impl UpstreamSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.base_delay_ms))
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CacheSettings {
    pub max_age_secs: u64,
    pub sweep_interval_secs: u64,
    pub refresh_interval_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_age_secs: 24 * 3600,
            sweep_interval_secs: 6 * 3600,
            refresh_interval_secs: 24 * 3600,
        }
    }
}

impl CacheSettings {
    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_secs)
    }

    // tokio intervals panic on a zero period
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BulkSettings {
    pub chunk_size: usize,
    pub chunk_delay_ms: u64,
}

impl Default for BulkSettings {
    fn default() -> Self {
        Self {
            chunk_size: 5,
            chunk_delay_ms: 1000,
        }
    }
}

impl BulkSettings {
    pub fn pacing(&self) -> BulkPacing {
        BulkPacing {
            chunk_size: self.chunk_size.max(1),
            chunk_delay: Duration::from_millis(self.chunk_delay_ms),
        }
    }
}

/// Load `config/hydrowatch.{toml,yaml,json}` if present, then apply
/// `HYDROWATCH__SECTION__KEY` environment overrides.
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name(CONFIG_FILE).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}
