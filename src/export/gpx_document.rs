//! GPX 1.1 export

use std::error::Error;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use super::format_timestamp;
use crate::{
    errors::TrailRecorderError,
    models::{Track, TrackPoint},
};

const GPX_NAMESPACE: &str = "http://www.topografix.com/GPX/1/1";
const TELEMETRY_NAMESPACE: &str = "urn:trail-recorder:telemetry:1";
const CREATOR: &str = "trail-recorder";
const LATEST_POINT_LABEL: &str = "Latest Point";

type XmlResult = Result<(), Box<dyn Error>>;

/// Write `track` as a GPX document with one track and one segment.
///
/// Segment points keep the order of `track.points`. The chronologically
/// most recent point is repeated as a waypoint labelled "Latest Point".
pub fn to_gpx(track: &Track) -> Result<String, TrailRecorderError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    write_document(&mut writer, track).map_err(|e| TrailRecorderError::XmlError(e.to_string()))?;
    String::from_utf8(writer.into_inner())
        .map_err(|e| TrailRecorderError::XmlError(e.to_string()))
}

fn write_document(writer: &mut Writer<Vec<u8>>, track: &Track) -> XmlResult {
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut root = BytesStart::new("gpx");
    root.push_attribute(("version", "1.1"));
    root.push_attribute(("creator", CREATOR));
    root.push_attribute(("xmlns", GPX_NAMESPACE));
    root.push_attribute(("xmlns:trail", TELEMETRY_NAMESPACE));
    writer.write_event(Event::Start(root))?;

    let track_id = track.details.track_id.as_str();

    if let Some(latest) = track.latest_point() {
        write_point(writer, "wpt", latest, track_id, Some(LATEST_POINT_LABEL))?;
    }

    writer.write_event(Event::Start(BytesStart::new("trk")))?;
    write_text_element(writer, "name", track_id)?;
    if let Some(description) = &track.details.description {
        write_text_element(writer, "desc", description)?;
    }
    writer.write_event(Event::Start(BytesStart::new("trkseg")))?;
    for point in &track.points {
        write_point(writer, "trkpt", point, track_id, None)?;
    }
    writer.write_event(Event::End(BytesEnd::new("trkseg")))?;
    writer.write_event(Event::End(BytesEnd::new("trk")))?;

    writer.write_event(Event::End(BytesEnd::new("gpx")))?;
    Ok(())
}

/// Children follow the order of the GPX 1.1 `wptType` sequence
fn write_point(
    writer: &mut Writer<Vec<u8>>,
    tag: &str,
    point: &TrackPoint,
    track_id: &str,
    description: Option<&str>,
) -> XmlResult {
    let lat = decimal(point.lat);
    let lon = decimal(point.lon);
    let mut start = BytesStart::new(tag);
    start.push_attribute(("lat", lat.as_str()));
    start.push_attribute(("lon", lon.as_str()));
    writer.write_event(Event::Start(start))?;

    if let Some(altitude) = point.altitude {
        write_text_element(writer, "ele", &decimal(altitude))?;
    }
    write_text_element(writer, "time", &format_timestamp(&point.ts))?;
    write_text_element(writer, "name", track_id)?;
    if let Some(description) = description {
        write_text_element(writer, "desc", description)?;
    }
    write_extensions(writer, point)?;

    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

/// Telemetry without a GPX 1.1 element goes into `<trail:telemetry>`,
/// one string attribute per known value
fn write_extensions(writer: &mut Writer<Vec<u8>>, point: &TrackPoint) -> XmlResult {
    let telemetry: Vec<(&str, String)> = [
        ("speed", point.speed_kph),
        ("direction", point.direction),
        ("distance", point.distance_meters),
        ("battery", point.battery_pct),
        ("accuracy", point.accuracy_meters),
    ]
    .into_iter()
    .filter_map(|(name, value)| value.map(|v| (name, v.to_string())))
    .collect();

    if telemetry.is_empty() {
        return Ok(());
    }

    writer.write_event(Event::Start(BytesStart::new("extensions")))?;
    let mut element = BytesStart::new("trail:telemetry");
    for (name, value) in &telemetry {
        element.push_attribute((*name, value.as_str()));
    }
    writer.write_event(Event::Empty(element))?;
    writer.write_event(Event::End(BytesEnd::new("extensions")))?;
    Ok(())
}

fn write_text_element(writer: &mut Writer<Vec<u8>>, tag: &str, text: &str) -> XmlResult {
    writer.write_event(Event::Start(BytesStart::new(tag)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

/// Plain decimal notation that always keeps a fractional part
fn decimal(value: f64) -> String {
    let text = value.to_string();
    if text.contains('.') || !value.is_finite() {
        text
    } else {
        format!("{}.0", text)
    }
}
