//! Track export formats

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::{errors::TrailRecorderError, models::Track};

mod feature_collection;
mod gpx_document;

pub use feature_collection::to_geojson;
pub use gpx_document::to_gpx;

/// Output formats a track can be rendered to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackFormat {
    /// GeoJSON FeatureCollection, also requested as `json`
    GeoJson,
    Gpx,
}

impl TrackFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            TrackFormat::GeoJson => "application/json",
            TrackFormat::Gpx => "application/xml",
        }
    }
}

impl FromStr for TrackFormat {
    type Err = TrailRecorderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "geojson" | "json" => Ok(TrackFormat::GeoJson),
            "gpx" => Ok(TrackFormat::Gpx),
            _ => Err(TrailRecorderError::UnrecognizedFormat(s.to_string())),
        }
    }
}

impl fmt::Display for TrackFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackFormat::GeoJson => write!(f, "geojson"),
            TrackFormat::Gpx => write!(f, "gpx"),
        }
    }
}

/// Finished export body together with its content type
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub body: Vec<u8>,
    pub content_type: &'static str,
}

/// Render with the latest-point feature included
pub fn render(track: &Track, format: TrackFormat) -> Result<Rendered, TrailRecorderError> {
    render_with(track, format, true)
}

/// Parse `format` and render; unknown formats fail before any output exists
pub fn render_str(track: &Track, format: &str) -> Result<Rendered, TrailRecorderError> {
    render(track, format.parse()?)
}

pub fn render_with(
    track: &Track,
    format: TrackFormat,
    include_latest_point_feature: bool,
) -> Result<Rendered, TrailRecorderError> {
    let body = match format {
        TrackFormat::GeoJson => {
            serde_json::to_vec(&to_geojson(track, include_latest_point_feature))?
        }
        TrackFormat::Gpx => to_gpx(track)?.into_bytes(),
    };

    Ok(Rendered {
        body,
        content_type: format.content_type(),
    })
}

/// RFC 3339 with whole seconds and an explicit `+00:00` offset
pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_parsing() {
        assert_eq!("geojson".parse::<TrackFormat>().unwrap(), TrackFormat::GeoJson);
        assert_eq!("json".parse::<TrackFormat>().unwrap(), TrackFormat::GeoJson);
        assert_eq!("GPX".parse::<TrackFormat>().unwrap(), TrackFormat::Gpx);
        assert!(matches!(
            "kml".parse::<TrackFormat>(),
            Err(TrailRecorderError::UnrecognizedFormat(ref f)) if f == "kml"
        ));
    }

    #[test]
    fn test_content_type() {
        assert_eq!(TrackFormat::GeoJson.content_type(), "application/json");
        assert_eq!(TrackFormat::Gpx.content_type(), "application/xml");
    }

    #[test]
    fn test_timestamp_has_second_precision() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 12, 30, 5).unwrap()
            + chrono::Duration::milliseconds(250);
        assert_eq!(format_timestamp(&ts), "2024-01-01T12:30:05+00:00");
    }
}
