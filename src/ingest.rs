//! Ingestion of logged points

use tracing::debug;

use crate::{
    database::Database,
    errors::TrailRecorderError,
    models::{IngestionRecord, TrackDetails, TrackPoint},
};

/// Longest accepted key or track id
pub const MAX_IDENTIFIER_LEN: usize = 128;

/// Turns client records into stored details and points
#[derive(Clone)]
pub struct IngestionService {
    database: Database,
}

impl IngestionService {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    /// Validate `record` and store it as one unit.
    ///
    /// Details are written only for the first point of a track; later
    /// records for the same `(key, track_id)` leave them untouched.
    pub async fn ingest(&self, record: &IngestionRecord) -> Result<(), TrailRecorderError> {
        validate(record)?;

        let details = TrackDetails::from(record);
        let point = TrackPoint::from(record);
        debug!(
            "Ingesting point {} for track {} of key {}",
            point.ts, details.track_id, details.key
        );

        self.database.store_log(&details, &point).await
    }
}

/// Reject records the store should never see
pub fn validate(record: &IngestionRecord) -> Result<(), TrailRecorderError> {
    validate_identifier("key", &record.key)?;
    validate_identifier("track_id", &record.track_id)?;

    if !(-90.0..=90.0).contains(&record.lat) {
        return Err(TrailRecorderError::InvalidRecord(format!(
            "lat {} outside [-90, 90]",
            record.lat
        )));
    }
    if !(-180.0..=180.0).contains(&record.lon) {
        return Err(TrailRecorderError::InvalidRecord(format!(
            "lon {} outside [-180, 180]",
            record.lon
        )));
    }

    let optional = [
        ("altitude", record.altitude),
        ("speed_kph", record.speed_kph),
        ("direction", record.direction),
        ("distance", record.distance),
        ("battery", record.battery),
        ("accuracy", record.accuracy),
    ];
    for (name, value) in optional {
        if let Some(value) = value {
            if !value.is_finite() {
                return Err(TrailRecorderError::InvalidRecord(format!(
                    "{} is not a finite number",
                    name
                )));
            }
        }
    }

    Ok(())
}

fn validate_identifier(name: &str, value: &str) -> Result<(), TrailRecorderError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(TrailRecorderError::InvalidRecord(format!(
            "{} cannot be empty",
            name
        )));
    }
    if trimmed.chars().count() > MAX_IDENTIFIER_LEN {
        return Err(TrailRecorderError::InvalidRecord(format!(
            "{} longer than {} characters",
            name, MAX_IDENTIFIER_LEN
        )));
    }
    Ok(())
}
