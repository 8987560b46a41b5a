//! Data models.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use serde_helpers::*;

/// One fix as posted by the logging client.
///
/// Only `key`, `track_id`, `ts`, `lat` and `lon` are guaranteed. Every other
/// field stays `None` when the client leaves it out; zero is a real reading.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IngestionRecord {
    /// Short identifier of the logging account
    pub key: String,
    /// Track name, GPSLogger sends its log file name here
    #[serde(alias = "filename")]
    pub track_id: String,
    /// Fix time, must carry a UTC offset
    pub ts: DateTime<FixedOffset>,
    pub lat: f64,
    pub lon: f64,
    #[serde(default, deserialize_with = "deserialize_optional_text")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_text")]
    pub android_id: Option<String>,
    /// Track start, either RFC 3339 or Unix epoch seconds
    #[serde(default, deserialize_with = "deserialize_start_time")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_optional_text")]
    pub profile: Option<String>,
    #[serde(default)]
    pub altitude: Option<f64>,
    #[serde(default)]
    pub speed_kph: Option<f64>,
    #[serde(default)]
    pub direction: Option<f64>,
    /// Distance travelled in meters
    #[serde(default)]
    pub distance: Option<f64>,
    /// Battery level in percent
    #[serde(default)]
    pub battery: Option<f64>,
    /// Horizontal accuracy in meters
    #[serde(default)]
    pub accuracy: Option<f64>,
}

/// Track metadata, written once on the first point of a `(track_id, key)` pair
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackDetails {
    pub track_id: String,
    pub key: String,
    pub description: Option<String>,
    pub device_id: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub profile_name: Option<String>,
}

/// Single stored fix, identified by `(track_id, ts)`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackPoint {
    pub track_id: String,
    pub ts: DateTime<Utc>,
    pub lat: f64,
    pub lon: f64,
    pub altitude: Option<f64>,
    pub speed_kph: Option<f64>,
    pub direction: Option<f64>,
    pub distance_meters: Option<f64>,
    pub battery_pct: Option<f64>,
    pub accuracy_meters: Option<f64>,
}

/// Details and points assembled at read time.
///
/// Points come from the repository newest first.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub details: TrackDetails,
    pub points: Vec<TrackPoint>,
}

impl Track {
    /// Most recent point by timestamp, independent of `points` order
    pub fn latest_point(&self) -> Option<&TrackPoint> {
        self.points.iter().max_by_key(|p| p.ts)
    }

    /// Points sorted oldest first
    pub fn chronological_points(&self) -> Vec<&TrackPoint> {
        let mut points: Vec<&TrackPoint> = self.points.iter().collect();
        points.sort_by_key(|p| p.ts);
        points
    }
}

impl From<&IngestionRecord> for TrackDetails {
    fn from(record: &IngestionRecord) -> Self {
        Self {
            track_id: record.track_id.trim().to_string(),
            key: record.key.trim().to_string(),
            description: record.description.clone(),
            device_id: record.android_id.clone(),
            start_time: record.start_time,
            profile_name: record.profile.clone(),
        }
    }
}

impl From<&IngestionRecord> for TrackPoint {
    fn from(record: &IngestionRecord) -> Self {
        Self {
            track_id: record.track_id.trim().to_string(),
            ts: record.ts.with_timezone(&Utc),
            lat: record.lat,
            lon: record.lon,
            altitude: record.altitude,
            speed_kph: record.speed_kph,
            direction: record.direction,
            distance_meters: record.distance,
            battery_pct: record.battery,
            accuracy_meters: record.accuracy,
        }
    }
}

/// Custom deserializers
mod serde_helpers {
    use chrono::{DateTime, Utc};
    use serde::{self, de, Deserialize, Deserializer};

    /// Epoch values at or above this are milliseconds rather than seconds
    const EPOCH_MILLIS_THRESHOLD: i64 = 100_000_000_000;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawStartTime {
        Seconds(i64),
        Fractional(f64),
        Text(String),
    }

    pub fn deserialize_optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: Option<String> = Option::deserialize(deserializer)?;
        Ok(s.and_then(|s| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }))
    }

    pub fn deserialize_start_time<'de, D>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<RawStartTime> = Option::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(RawStartTime::Seconds(value)) => from_epoch(value).map(Some),
            Some(RawStartTime::Fractional(value)) => from_epoch(value.trunc() as i64).map(Some),
            Some(RawStartTime::Text(text)) => {
                let text = text.trim();
                if text.is_empty() {
                    return Ok(None);
                }
                if let Ok(value) = text.parse::<i64>() {
                    return from_epoch(value).map(Some);
                }
                DateTime::parse_from_rfc3339(text)
                    .map(|dt| Some(dt.with_timezone(&Utc)))
                    .map_err(de::Error::custom)
            }
        }
    }

    fn from_epoch<E: de::Error>(value: i64) -> Result<DateTime<Utc>, E> {
        let parsed = if value.unsigned_abs() >= EPOCH_MILLIS_THRESHOLD.unsigned_abs() {
            DateTime::from_timestamp_millis(value)
        } else {
            DateTime::from_timestamp(value, 0)
        };
        parsed.ok_or_else(|| E::custom(format!("start time out of range: {}", value)))
    }
}
