// src/database/models.rs
use chrono::{DateTime, Utc};

use crate::models::{TrackDetails, TrackPoint};

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct TrackDetailsRow {
    track_id: String,
    key: String,
    description: Option<String>,
    device_id: Option<String>,
    start_time: Option<DateTime<Utc>>,
    profile_name: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct TrackPointRow {
    track_id: String,
    ts: DateTime<Utc>,
    lat: f64,
    lon: f64,
    altitude: Option<f64>,
    speed_kph: Option<f64>,
    direction: Option<f64>,
    distance_meters: Option<f64>,
    battery_pct: Option<f64>,
    accuracy_meters: Option<f64>,
}

impl From<TrackDetailsRow> for TrackDetails {
    fn from(row: TrackDetailsRow) -> Self {
        Self {
            track_id: row.track_id,
            key: row.key,
            description: row.description,
            device_id: row.device_id,
            start_time: row.start_time,
            profile_name: row.profile_name,
        }
    }
}

impl From<TrackPointRow> for TrackPoint {
    fn from(row: TrackPointRow) -> Self {
        Self {
            track_id: row.track_id,
            ts: row.ts,
            lat: row.lat,
            lon: row.lon,
            altitude: row.altitude,
            speed_kph: row.speed_kph,
            direction: row.direction,
            distance_meters: row.distance_meters,
            battery_pct: row.battery_pct,
            accuracy_meters: row.accuracy_meters,
        }
    }
}
