// src/database.rs
use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, error, info, warn};

use crate::{
    config::DatabaseConfig,
    errors::TrailRecorderError,
    models::{Track, TrackDetails, TrackPoint},
};

pub(crate) mod models;

use models::{TrackDetailsRow, TrackPointRow};

static MIGRATOR: Migrator = sqlx::migrate!();

/// Track repository backed by an SQLite file
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Wrap an existing pool and bring its schema up to date
    pub async fn new(pool: SqlitePool) -> Result<Self, TrailRecorderError> {
        if let Err(e) = MIGRATOR.run(&pool).await {
            error!("Failed to run database migrations: {}", e);
            return Err(e.into());
        }
        Ok(Self { pool })
    }

    /// Open or create the database described by `config`
    pub async fn open(config: &DatabaseConfig) -> Result<Self, TrailRecorderError> {
        config.validate()?;

        info!(
            "Opening database: path={}, max_connections={}, busy_timeout={:?}",
            config.path.display(),
            config.max_connections,
            config.busy_timeout
        );

        let options = SqliteConnectOptions::new()
            .filename(&config.path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(config.busy_timeout);

        let pool = match SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
        {
            Ok(pool) => pool,
            Err(e) => {
                error!("Failed to open database: {}", e);
                return Err(e.into());
            }
        };

        Self::new(pool).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Insert track details unless a row with the same `(track_id, key)` exists.
    ///
    /// Existing rows are never updated. Returns `true` when a row was written.
    pub async fn upsert_details(&self, details: &TrackDetails) -> Result<bool, TrailRecorderError> {
        let mut conn = self.pool.acquire().await?;
        insert_details_if_absent(&mut conn, details).await
    }

    /// Append a point to a track whose details already exist
    pub async fn append_point(&self, point: &TrackPoint) -> Result<(), TrailRecorderError> {
        let mut conn = self.pool.acquire().await?;
        insert_point(&mut conn, point).await
    }

    /// Write details and point as one unit: both rows commit or neither does
    pub async fn store_log(
        &self,
        details: &TrackDetails,
        point: &TrackPoint,
    ) -> Result<(), TrailRecorderError> {
        let mut tx = self.pool.begin().await?;

        if insert_details_if_absent(&mut tx, details).await? {
            info!("Started track {} for key {}", details.track_id, details.key);
        }
        insert_point(&mut tx, point).await?;

        tx.commit().await?;
        debug!("Stored point {} for track {}", point.ts, point.track_id);
        Ok(())
    }

    /// Load a track with its points, newest first
    pub async fn get_track(&self, key: &str, track_id: &str) -> Result<Track, TrailRecorderError> {
        let details: Option<TrackDetailsRow> = sqlx::query_as(
            "SELECT track_id, key, description, device_id, start_time, profile_name
            FROM track_details
            WHERE key = ?1 AND track_id = ?2",
        )
        .bind(key)
        .bind(track_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(details) = details else {
            return Err(TrailRecorderError::NotFound {
                key: key.to_string(),
                track_id: track_id.to_string(),
            });
        };

        let points: Vec<TrackPointRow> = sqlx::query_as(
            "SELECT track_id, ts, lat, lon, altitude, speed_kph, direction,
                distance_meters, battery_pct, accuracy_meters
            FROM track_points
            WHERE track_id = ?1
            ORDER BY ts DESC",
        )
        .bind(track_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Track {
            details: details.into(),
            points: points.into_iter().map(TrackPoint::from).collect(),
        })
    }

    /// Track ids recorded under `key`, empty when there are none
    pub async fn list_track_ids(&self, key: &str) -> Result<Vec<String>, TrailRecorderError> {
        let ids: Vec<String> = sqlx::query_scalar(
            "SELECT track_id FROM track_details WHERE key = ?1 ORDER BY track_id",
        )
        .bind(key)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    pub async fn list_tracks(&self, key: &str) -> Result<Vec<TrackDetails>, TrailRecorderError> {
        let rows: Vec<TrackDetailsRow> = sqlx::query_as(
            "SELECT track_id, key, description, device_id, start_time, profile_name
            FROM track_details
            WHERE key = ?1
            ORDER BY track_id",
        )
        .bind(key)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(TrackDetails::from).collect())
    }

    /// Claim `candidate` as a newly issued key.
    ///
    /// Fails softly (`false`) when the key was issued before or already
    /// names a track.
    pub async fn reserve_key(&self, candidate: &str) -> Result<bool, TrailRecorderError> {
        let result = sqlx::query(
            "INSERT INTO issued_keys (key, issued_at)
            SELECT ?1, ?2
            WHERE NOT EXISTS (SELECT 1 FROM track_details WHERE key = ?1)",
        )
        .bind(candidate)
        .bind(Utc::now())
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => Ok(done.rows_affected() == 1),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Checkpoint the WAL and close every pooled connection
    pub async fn close(&self) -> Result<(), TrailRecorderError> {
        sqlx::query("PRAGMA wal_checkpoint(PASSIVE)")
            .execute(&self.pool)
            .await?;
        self.pool.close().await;
        Ok(())
    }
}

/// Insert-if-absent for track details.
///
/// Written as a plain conditional insert so the first statement of the
/// enclosing transaction already takes the write lock.
async fn insert_details_if_absent(
    conn: &mut SqliteConnection,
    details: &TrackDetails,
) -> Result<bool, TrailRecorderError> {
    let result = sqlx::query(
        "INSERT INTO track_details (
            track_id, key, description, device_id, start_time, profile_name
        )
        SELECT ?1, ?2, ?3, ?4, ?5, ?6
        WHERE NOT EXISTS (
            SELECT 1 FROM track_details WHERE track_id = ?1 AND key = ?2
        )",
    )
    .bind(&details.track_id)
    .bind(&details.key)
    .bind(&details.description)
    .bind(&details.device_id)
    .bind(details.start_time)
    .bind(&details.profile_name)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Insert a point, reporting collisions instead of overwriting history
async fn insert_point(
    conn: &mut SqliteConnection,
    point: &TrackPoint,
) -> Result<(), TrailRecorderError> {
    let result = sqlx::query(
        "INSERT INTO track_points (
            track_id, ts, lat, lon, altitude, speed_kph, direction,
            distance_meters, battery_pct, accuracy_meters
        )
        SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10
        WHERE EXISTS (SELECT 1 FROM track_details WHERE track_id = ?1)",
    )
    .bind(&point.track_id)
    .bind(point.ts)
    .bind(point.lat)
    .bind(point.lon)
    .bind(point.altitude)
    .bind(point.speed_kph)
    .bind(point.direction)
    .bind(point.distance_meters)
    .bind(point.battery_pct)
    .bind(point.accuracy_meters)
    .execute(&mut *conn)
    .await;

    match result {
        Ok(done) if done.rows_affected() == 0 => Err(TrailRecorderError::OrphanPoint {
            track_id: point.track_id.clone(),
        }),
        Ok(_) => Ok(()),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            warn!(
                "Rejected duplicate point {} for track {}",
                point.ts, point.track_id
            );
            Err(TrailRecorderError::DuplicatePoint {
                track_id: point.track_id.clone(),
                ts: point.ts,
            })
        }
        Err(e) => Err(e.into()),
    }
}

/// Builder for Database with simplified configuration
pub struct DatabaseBuilder {
    path: Option<PathBuf>,
    max_connections: Option<u32>,
    busy_timeout: Option<Duration>,
}

impl Default for DatabaseBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DatabaseBuilder {
    pub fn new() -> Self {
        Self {
            path: None,
            max_connections: None,
            busy_timeout: None,
        }
    }

    pub fn path(mut self, path: PathBuf) -> Self {
        self.path = Some(path);
        self
    }

    pub fn max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = Some(max_connections);
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = Some(timeout);
        self
    }

    pub async fn build(self) -> Result<Database, TrailRecorderError> {
        let path = self
            .path
            .unwrap_or_else(|| PathBuf::from("trail-recorder.db"));

        let config = DatabaseConfig {
            path,
            max_connections: self.max_connections.unwrap_or(5),
            busy_timeout: self.busy_timeout.unwrap_or(Duration::from_secs(5)),
        };

        Database::open(&config).await
    }
}
