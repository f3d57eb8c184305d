// Domain - Station analytics derived from raw readings
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::reading::Reading;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Readings per window when comparing recent against older levels.
    pub trend_window: usize,
    /// Absolute mean difference below which a station is considered stable.
    pub stable_threshold: f64,
    pub readings_per_day: f64,
    pub completeness_weight: f64,
    pub recency_weight: f64,
    pub recency: RecencyBands,
    pub quality: QualityBands,
    pub depth: DepthThresholds,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            trend_window: 10,
            stable_threshold: 0.1,
            readings_per_day: 4.0,
            completeness_weight: 0.7,
            recency_weight: 0.3,
            recency: RecencyBands::default(),
            quality: QualityBands::default(),
            depth: DepthThresholds::default(),
        }
    }
}

/// Step function from hours since the latest reading to a recency score.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecencyBands {
    pub fresh_hours: f64,
    pub recent_hours: f64,
    pub aging_hours: f64,
    pub fresh_score: f64,
    pub recent_score: f64,
    pub aging_score: f64,
    pub stale_score: f64,
}

impl Default for RecencyBands {
    fn default() -> Self {
        Self {
            fresh_hours: 12.0,
            recent_hours: 24.0,
            aging_hours: 48.0,
            fresh_score: 100.0,
            recent_score: 75.0,
            aging_score: 50.0,
            stale_score: 25.0,
        }
    }
}

/// Lower bounds (inclusive) of each quality status.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QualityBands {
    pub excellent: f64,
    pub good: f64,
    pub fair: f64,
}

impl Default for QualityBands {
    fn default() -> Self {
        Self {
            excellent: 90.0,
            good: 70.0,
            fair: 50.0,
        }
    }
}

/// Depth thresholds in meters below ground level. Comparisons are strict.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DepthThresholds {
    pub critical: f64,
    pub warning: f64,
    pub caution: f64,
}

impl Default for DepthThresholds {
    fn default() -> Self {
        Self {
            critical: 50.0,
            warning: 30.0,
            caution: 15.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Rising,
    Falling,
    Stable,
    InsufficientData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityStatus {
    Excellent,
    Good,
    Fair,
    Poor,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataQuality {
    pub score: f64,
    pub completeness: f64,
    pub recency: f64,
    pub status: QualityStatus,
}

/// Severity levels, in ascending order, plus `Unknown` for stations without data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CriticalStatus {
    Unknown,
    Normal,
    Caution,
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StationAnalytics {
    pub total_readings: usize,
    pub latest_reading: Option<Reading>,
    pub average_level: Option<f64>,
    pub trend: Trend,
    pub data_quality: DataQuality,
    pub critical_status: CriticalStatus,
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

/// Compares the mean of the most recent readings with the mean of the oldest.
///
/// The windows overlap when there are fewer than `2 * trend_window` readings.
/// At `trend_window` readings or fewer they cover the same set, the difference
/// is zero and the trend is always [`Trend::Stable`].
pub fn compute_trend(readings: &[Reading], config: &ClassifierConfig) -> Trend {
    if readings.len() < 2 {
        return Trend::InsufficientData;
    }

    let ordered = most_recent_first(readings);
    let window = config.trend_window.max(1).min(ordered.len());

    let recent = mean(ordered[..window].iter().map(|r| r.value));
    let older = mean(ordered[ordered.len() - window..].iter().map(|r| r.value));
    let difference = recent - older;

    if difference.abs() < config.stable_threshold {
        Trend::Stable
    } else if difference > 0.0 {
        Trend::Rising
    } else {
        Trend::Falling
    }
}

pub fn compute_data_quality(
    readings: &[Reading],
    expected_days: u32,
    now: DateTime<Utc>,
    config: &ClassifierConfig,
) -> DataQuality {
    let Some(latest) = latest(readings) else {
        return DataQuality {
            score: 0.0,
            completeness: 0.0,
            recency: 0.0,
            status: QualityStatus::Poor,
        };
    };

    let expected = f64::from(expected_days.max(1)) * config.readings_per_day;
    let completeness = (readings.len() as f64 / expected).min(1.0) * 100.0;

    let hours_since_latest = (now - latest.timestamp).num_seconds() as f64 / 3600.0;
    let bands = &config.recency;
    let recency = if hours_since_latest < bands.fresh_hours {
        bands.fresh_score
    } else if hours_since_latest < bands.recent_hours {
        bands.recent_score
    } else if hours_since_latest < bands.aging_hours {
        bands.aging_score
    } else {
        bands.stale_score
    };

    let score = config.completeness_weight * completeness + config.recency_weight * recency;
    let status = if score >= config.quality.excellent {
        QualityStatus::Excellent
    } else if score >= config.quality.good {
        QualityStatus::Good
    } else if score >= config.quality.fair {
        QualityStatus::Fair
    } else {
        QualityStatus::Poor
    };

    DataQuality {
        score: round_to(score, 1),
        completeness,
        recency,
        status,
    }
}

pub fn compute_critical_status(readings: &[Reading], config: &ClassifierConfig) -> CriticalStatus {
    let Some(latest) = latest(readings) else {
        return CriticalStatus::Unknown;
    };

    let depth = latest.value.abs();
    let thresholds = &config.depth;
    if depth > thresholds.critical {
        CriticalStatus::Critical
    } else if depth > thresholds.warning {
        CriticalStatus::Warning
    } else if depth > thresholds.caution {
        CriticalStatus::Caution
    } else {
        CriticalStatus::Normal
    }
}

pub fn analyze(
    readings: &[Reading],
    expected_days: u32,
    now: DateTime<Utc>,
    config: &ClassifierConfig,
) -> StationAnalytics {
    let average_level = (!readings.is_empty())
        .then(|| round_to(mean(readings.iter().map(|r| r.value)), 2));

    StationAnalytics {
        total_readings: readings.len(),
        latest_reading: latest(readings).cloned(),
        average_level,
        trend: compute_trend(readings, config),
        data_quality: compute_data_quality(readings, expected_days, now, config),
        critical_status: compute_critical_status(readings, config),
    }
}

fn latest(readings: &[Reading]) -> Option<&Reading> {
    readings.iter().max_by_key(|r| r.timestamp)
}

fn most_recent_first(readings: &[Reading]) -> Vec<&Reading> {
    let mut ordered: Vec<&Reading> = readings.iter().collect();
    ordered.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    ordered
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
