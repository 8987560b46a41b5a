use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{FixedOffset, TimeZone};
use tempfile::TempDir;

use trail_recorder::{
    config::{AppConfig, DatabaseConfig, KeyConfig, ServerConfig},
    database::{Database, DatabaseBuilder},
    models::IngestionRecord,
    routes::create_router,
    AppState,
};

/// Fresh database in its own temporary directory.
///
/// The directory is removed when the returned `TempDir` drops.
#[allow(dead_code)]
pub async fn test_db() -> (TempDir, Database) {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db = DatabaseBuilder::new()
        .path(temp_dir.path().join("test.db"))
        .build()
        .await
        .expect("Failed to open database");
    (temp_dir, db)
}

#[allow(dead_code)]
pub fn test_config(path: PathBuf) -> AppConfig {
    AppConfig {
        server: ServerConfig {
            bind: "127.0.0.1:0".to_string(),
            public_url: "https://tracks.example.org".to_string(),
        },
        database: DatabaseConfig {
            path,
            max_connections: 5,
            busy_timeout: Duration::from_secs(5),
        },
        keys: KeyConfig::default(),
    }
}

/// Router over a fresh database, plus the state behind it
#[allow(dead_code)]
pub async fn create_test_app() -> (TempDir, axum::Router, Arc<AppState>) {
    let (temp_dir, db) = test_db().await;
    let config = test_config(temp_dir.path().join("test.db"));
    let state = Arc::new(AppState::new(config, db).expect("Failed to build state"));
    (temp_dir, create_router(state.clone()), state)
}

/// Minimal record at `2024-01-01T00:00:00Z` plus `minutes`
#[allow(dead_code)]
pub fn record(key: &str, track_id: &str, minutes: u32, lat: f64, lon: f64) -> IngestionRecord {
    IngestionRecord {
        key: key.to_string(),
        track_id: track_id.to_string(),
        ts: FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 1, 1, 0, minutes, 0)
            .unwrap(),
        lat,
        lon,
        description: None,
        android_id: None,
        start_time: None,
        profile: None,
        altitude: None,
        speed_kph: None,
        direction: None,
        distance: None,
        battery: None,
        accuracy: None,
    }
}
