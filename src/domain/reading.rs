// Groundwater reading domain model
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const DEFAULT_UNIT: &str = "m";
const DEFAULT_TYPE: &str = "Ground Water Level";

/// India Standard Time, used for upstream timestamps without an offset.
const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    pub unit: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub type_code: String,
}

impl Reading {
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self {
            timestamp,
            value,
            unit: DEFAULT_UNIT.to_string(),
            kind: DEFAULT_TYPE.to_string(),
            type_code: String::new(),
        }
    }

    /// Build a reading from one record of an India-WRIS time-series payload.
    ///
    /// Returns `None` when the record has no parseable `dataTime` or `dataValue`.
    pub fn from_upstream(record: &Value) -> Option<Self> {
        let timestamp = record.get("dataTime").and_then(Value::as_str).and_then(parse_timestamp)?;
        let value = record.get("dataValue").and_then(parse_value)?;

        let text = |field: &str| {
            record
                .get(field)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let mut reading = Self::new(timestamp, value);
        if let Some(unit) = text("unit") {
            reading.unit = unit;
        }
        if let Some(kind) = text("datatypeDescription") {
            reading.kind = kind;
        }
        reading.type_code = text("datatypeCode").unwrap_or_default();
        Some(reading)
    }
}

/// Extract readings from the `data` array of an upstream payload, most recent first.
pub fn readings_from_payload(payload: &Value) -> Vec<Reading> {
    let Some(records) = payload.get("data").and_then(Value::as_array) else {
        return Vec::new();
    };

    let mut readings: Vec<Reading> = records
        .iter()
        .filter_map(|record| {
            let reading = Reading::from_upstream(record);
            if reading.is_none() {
                tracing::debug!(?record, "skipping upstream record without time or value");
            }
            reading
        })
        .collect();

    sort_most_recent_first(&mut readings);
    readings
}

pub fn sort_most_recent_first(readings: &mut [Reading]) {
    readings.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(time) = DateTime::parse_from_rfc3339(raw) {
        return Some(time.with_timezone(&Utc));
    }

    let ist = FixedOffset::east_opt(IST_OFFSET_SECS)?;
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .and_then(|naive| ist.from_local_datetime(&naive).single())
        .map(|time| time.with_timezone(&Utc))
}

fn parse_value(raw: &Value) -> Option<f64> {
    let value = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    value.is_finite().then_some(value)
}
