//! HTTP route handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::{
    errors::TrailRecorderError,
    export::{self, TrackFormat},
    models::IngestionRecord,
    profile, AppState,
};

type Result<T> = std::result::Result<T, TrailRecorderError>;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Serialize)]
pub struct KeyResponse {
    pub key: String,
}

#[derive(Deserialize)]
pub struct KeyQuery {
    pub key: String,
}

#[derive(Deserialize)]
pub struct TrackQuery {
    pub key: String,
    pub track_id: String,
    #[serde(default = "default_format")]
    pub format: String,
    /// Include the latest-point feature in GeoJSON output
    #[serde(default = "default_latest")]
    pub latest: bool,
}

#[derive(Deserialize)]
pub struct ProfileQuery {
    pub track_id: String,
}

fn default_format() -> String {
    TrackFormat::GeoJson.to_string()
}

fn default_latest() -> bool {
    true
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    // The key is a discoverable capability, so any origin may read tracks
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    Router::new()
        .route("/health", get(health_check))
        .route("/robots.txt", get(robots))
        .route("/track", get(get_track).post(store_point))
        .route("/tracks", get(list_tracks))
        .route("/{key}/track/{track_id}/{format}", get(get_track_by_path))
        .route("/next-key", get(next_key))
        .route("/profile/{key}", get(get_profile))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

async fn robots() -> &'static str {
    "User-agent: *\nDisallow: /"
}

/// Store one point posted by the logging client
async fn store_point(
    State(state): State<Arc<AppState>>,
    Json(record): Json<IngestionRecord>,
) -> Result<StatusCode> {
    state.ingestion.ingest(&record).await?;
    Ok(StatusCode::OK)
}

async fn list_tracks(
    State(state): State<Arc<AppState>>,
    Query(query): Query<KeyQuery>,
) -> Result<Json<Vec<String>>> {
    Ok(Json(state.database.list_track_ids(&query.key).await?))
}

async fn get_track(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TrackQuery>,
) -> Result<Response> {
    render_track(&state, &query.key, &query.track_id, &query.format, query.latest).await
}

async fn get_track_by_path(
    State(state): State<Arc<AppState>>,
    Path((key, track_id, format)): Path<(String, String, String)>,
) -> Result<Response> {
    render_track(&state, &key, &track_id, &format, true).await
}

/// Format is checked before the store is touched
async fn render_track(
    state: &AppState,
    key: &str,
    track_id: &str,
    format: &str,
    include_latest: bool,
) -> Result<Response> {
    let format: TrackFormat = format.parse()?;
    let track = state.database.get_track(key, track_id).await?;
    let rendered = export::render_with(&track, format, include_latest)?;

    Ok((
        [(header::CONTENT_TYPE, rendered.content_type)],
        rendered.body,
    )
        .into_response())
}

async fn next_key(State(state): State<Arc<AppState>>) -> Result<Json<KeyResponse>> {
    let key = state.keys.next_key(&state.database).await?;
    Ok(Json(KeyResponse { key }))
}

async fn get_profile(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    Query(query): Query<ProfileQuery>,
) -> impl IntoResponse {
    let body = profile::make_profile(&key, &query.track_id, &state.config.server.public_url);
    ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body)
}
