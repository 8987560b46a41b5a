//! GeoJSON export

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue, Value};

use super::format_timestamp;
use crate::models::{Track, TrackDetails, TrackPoint};

/// Build a FeatureCollection holding the track line and, optionally, the
/// most recent fix as a Point.
///
/// The line always runs oldest to newest, whatever order `track.points` is in.
pub fn to_geojson(track: &Track, include_latest_point_feature: bool) -> FeatureCollection {
    let coordinates = track
        .chronological_points()
        .into_iter()
        .map(position)
        .collect();

    let mut features = vec![feature(
        Value::LineString(coordinates),
        details_properties(&track.details),
    )];

    if include_latest_point_feature {
        if let Some(latest) = track.latest_point() {
            features.push(feature(
                Value::Point(position(latest)),
                latest_point_properties(latest),
            ));
        }
    }

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

fn feature(value: Value, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(value)),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

/// `[lon, lat]`, or `[lon, lat, altitude]` when altitude is known
fn position(point: &TrackPoint) -> Vec<f64> {
    let mut position = vec![point.lon, point.lat];
    if let Some(altitude) = point.altitude {
        position.push(altitude);
    }
    position
}

/// Every details field, absent ones as null
fn details_properties(details: &TrackDetails) -> JsonObject {
    let mut properties = JsonObject::new();
    properties.insert("track_id".to_string(), JsonValue::from(details.track_id.clone()));
    properties.insert("key".to_string(), JsonValue::from(details.key.clone()));
    properties.insert("description".to_string(), details.description.clone().into());
    properties.insert("device_id".to_string(), details.device_id.clone().into());
    properties.insert(
        "start_time".to_string(),
        details.start_time.as_ref().map(format_timestamp).into(),
    );
    properties.insert("profile_name".to_string(), details.profile_name.clone().into());
    properties
}

/// Only the telemetry the point actually carries
fn latest_point_properties(point: &TrackPoint) -> JsonObject {
    let mut properties = JsonObject::new();
    properties.insert("track_id".to_string(), JsonValue::from(point.track_id.clone()));
    properties.insert("time".to_string(), JsonValue::from(format_timestamp(&point.ts)));

    let telemetry = [
        ("speed", point.speed_kph),
        ("direction", point.direction),
        ("distance", point.distance_meters),
        ("battery", point.battery_pct),
        ("accuracy", point.accuracy_meters),
    ];
    for (name, value) in telemetry {
        if let Some(value) = value {
            properties.insert(name.to_string(), JsonValue::from(value));
        }
    }
    properties
}
