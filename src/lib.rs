//! Trail recorder: stores GPS points posted by a mobile logger and serves
//! the tracks back as GeoJSON or GPX.

pub mod config;
pub mod database;
pub mod errors;
pub mod export;
pub mod ingest;
pub mod keys;
pub mod models;
pub mod profile;
pub mod routes;

use config::AppConfig;
use database::Database;
use errors::TrailRecorderError;
use ingest::IngestionService;
use keys::KeyGenerator;

/// Shared application state.
pub struct AppState {
    pub config: AppConfig,
    pub database: Database,
    pub ingestion: IngestionService,
    pub keys: KeyGenerator,
}

impl AppState {
    pub fn new(config: AppConfig, database: Database) -> Result<Self, TrailRecorderError> {
        let keys = KeyGenerator::new(&config.keys)?;
        let ingestion = IngestionService::new(database.clone());
        Ok(Self {
            config,
            database,
            ingestion,
            keys,
        })
    }
}
