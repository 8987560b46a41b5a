use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

mod common;

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Option<String>, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, content_type, body.to_vec())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_point(body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/track")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn gpslogger_point(minute: u32) -> Value {
    json!({
        "key": "abc12",
        "track_id": "20240101",
        "description": "",
        "ts": format!("2024-01-01T00:{:02}:00Z", minute),
        "lat": 60.17,
        "lon": 24.94,
        "altitude": 12.0,
        "speed_kph": 4.2,
        "battery": 77,
        "android_id": "",
        "start_time": 1704067200000i64,
        "profile": "walking"
    })
}

#[tokio::test]
async fn test_health_check() {
    let (_dir, app, _state) = common::create_test_app().await;

    let (status, _, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_robots_disallows_everything() {
    let (_dir, app, _state) = common::create_test_app().await;

    let (status, _, body) = send(&app, get("/robots.txt")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(String::from_utf8(body).unwrap(), "User-agent: *\nDisallow: /");
}

#[tokio::test]
async fn test_store_point_and_duplicate() {
    let (_dir, app, state) = common::create_test_app().await;

    let (status, _, _) = send(&app, post_point(&gpslogger_point(0))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, body) = send(&app, post_point(&gpslogger_point(0))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "duplicate_point");

    let track = state.database.get_track("abc12", "20240101").await.unwrap();
    assert_eq!(track.points.len(), 1);
    assert_eq!(track.details.description, None);
    assert_eq!(track.details.device_id, None);
    assert_eq!(track.details.profile_name.as_deref(), Some("walking"));
    assert_eq!(
        track.details.start_time.map(|t| t.timestamp()),
        Some(1704067200)
    );
}

#[tokio::test]
async fn test_filename_alias_for_track_id() {
    let (_dir, app, state) = common::create_test_app().await;

    let mut point = gpslogger_point(0);
    let track_id = point.as_object_mut().unwrap().remove("track_id").unwrap();
    point["filename"] = track_id;

    let (status, _, _) = send(&app, post_point(&point)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        state.database.list_track_ids("abc12").await.unwrap(),
        vec!["20240101"]
    );
}

#[tokio::test]
async fn test_invalid_point_rejected() {
    let (_dir, app, _state) = common::create_test_app().await;

    let mut point = gpslogger_point(0);
    point["lon"] = json!(200.0);
    let (status, _, body) = send(&app, post_point(&point)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "invalid_record");
}

#[tokio::test]
async fn test_get_track_formats() {
    let (_dir, app, _state) = common::create_test_app().await;
    for minute in 0..3 {
        let (status, _, _) = send(&app, post_point(&gpslogger_point(minute))).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, content_type, body) =
        send(&app, get("/track?key=abc12&track_id=20240101")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["type"], "FeatureCollection");
    assert_eq!(json["features"].as_array().unwrap().len(), 2);
    assert_eq!(
        json["features"][0]["geometry"]["coordinates"]
            .as_array()
            .unwrap()
            .len(),
        3
    );

    let (status, _, body) = send(
        &app,
        get("/track?key=abc12&track_id=20240101&latest=false"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["features"].as_array().unwrap().len(), 1);

    let (status, content_type, body) =
        send(&app, get("/track?key=abc12&track_id=20240101&format=gpx")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/xml"));
    let text = String::from_utf8(body).unwrap();
    assert_eq!(text.matches("<trkpt ").count(), 3);

    let (status, content_type, _) = send(&app, get("/abc12/track/20240101/gpx")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/xml"));
}

#[tokio::test]
async fn test_unknown_format_is_bad_request() {
    let (_dir, app, _state) = common::create_test_app().await;

    // rejected even though the track does not exist
    let (status, _, body) = send(
        &app,
        get("/track?key=abc12&track_id=missing&format=kml"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "unrecognized_format");
}

#[tokio::test]
async fn test_missing_track_is_not_found() {
    let (_dir, app, _state) = common::create_test_app().await;

    let (status, _, body) = send(&app, get("/track?key=abc12&track_id=missing")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "not_found");
}

#[tokio::test]
async fn test_list_tracks() {
    let (_dir, app, _state) = common::create_test_app().await;

    let (status, _, body) = send(&app, get("/tracks?key=abc12")).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json, json!([]));

    send(&app, post_point(&gpslogger_point(0))).await;
    let (_, _, body) = send(&app, get("/tracks?key=abc12")).await;
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json, json!(["20240101"]));
}

#[tokio::test]
async fn test_next_key() {
    let (_dir, app, state) = common::create_test_app().await;

    let (status, _, body) = send(&app, get("/next-key")).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    let key = json["key"].as_str().unwrap();
    assert!(key.len() >= 5);
    assert_eq!(state.keys.decode(key).len(), 2);

    let (_, _, body) = send(&app, get("/next-key")).await;
    let second: Value = serde_json::from_slice(&body).unwrap();
    assert_ne!(second["key"], json["key"]);
}

#[tokio::test]
async fn test_profile() {
    let (_dir, app, _state) = common::create_test_app().await;

    let (status, content_type, body) =
        send(&app, get("/profile/abc12?track_id=morning")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(content_type.unwrap().starts_with("text/plain"));
    let text = String::from_utf8(body).unwrap();
    assert!(text.contains("current_profile_name=abc12\n"));
    assert!(text.contains("new_file_custom_name=morning\n"));
    assert!(text.contains("log_customurl_url=https\\://tracks.example.org/track\n"));
}
