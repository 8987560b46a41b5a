//! Errors for trail recorder
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Error, Debug)]
pub enum TrailRecorderError {
    #[error("Track {track_id} not found for key {key}")]
    NotFound { key: String, track_id: String },

    #[error("Point at {ts} already recorded for track {track_id}")]
    DuplicatePoint { track_id: String, ts: DateTime<Utc> },

    #[error("Track {track_id} has no details row")]
    OrphanPoint { track_id: String },

    #[error("Unrecognized track format: {0}")]
    UnrecognizedFormat(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("No free key found after {attempts} attempts")]
    KeyspaceExhausted { attempts: u32 },

    #[error("Key encoding error")]
    KeyEncoding(#[from] sqids::Error),

    #[error("Serialization error")]
    SerdeError(#[from] serde_json::Error),

    #[error("XML writing error: {0}")]
    XmlError(String),

    #[error("Configuration error")]
    ConfigError(#[from] config::ConfigError),

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("IO error")]
    IoError(#[from] std::io::Error),

    #[error("Database migration error")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("Database error")]
    DatabaseError(#[from] sqlx::Error),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for TrailRecorderError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            TrailRecorderError::NotFound { .. } => {
                (StatusCode::NOT_FOUND, "not_found", Some(self.to_string()))
            }
            TrailRecorderError::UnrecognizedFormat(_) => (
                StatusCode::BAD_REQUEST,
                "unrecognized_format",
                Some(self.to_string()),
            ),
            TrailRecorderError::InvalidRecord(_) => {
                (StatusCode::BAD_REQUEST, "invalid_record", Some(self.to_string()))
            }
            TrailRecorderError::DuplicatePoint { .. } => {
                (StatusCode::CONFLICT, "duplicate_point", Some(self.to_string()))
            }
            TrailRecorderError::OrphanPoint { .. } => {
                (StatusCode::CONFLICT, "orphan_point", Some(self.to_string()))
            }
            TrailRecorderError::KeyspaceExhausted { .. } => {
                warn!(error = %self, "Key generation exhausted");
                (StatusCode::SERVICE_UNAVAILABLE, "keyspace_exhausted", None)
            }
            TrailRecorderError::DatabaseError(e) => {
                error!(error = %e, "Database error");
                (StatusCode::SERVICE_UNAVAILABLE, "storage_unavailable", None)
            }
            _ => {
                error!(error = %self, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}
