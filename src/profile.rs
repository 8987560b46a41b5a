//! GPSLogger profile generation
//!
//! The profile is a Java properties file GPSLogger imports to post every fix
//! to `/track` with the key already filled in.

/// Body template; `{key}` becomes a JSON string, the `%` placeholders are GPSLogger's
const BODY_TEMPLATE: &str = r#"{"key": {key},"track_id": "%FILENAME","description": "%DESC","ts": "%TIME","lat": %LAT,"lon": %LON,"altitude": %ALT,"direction": %DIR,"speed_kph": %SPD_KPH,"distance": %DIST,"battery": %BATT,"accuracy": %ACC,"android_id": "%AID","start_time": %STARTTIMESTAMP,"profile": "%PROFILE"}"#;

/// Build the profile for logging `track_id` under `key`
pub fn make_profile(key: &str, track_id: &str, public_url: &str) -> String {
    let url = format!("{}/track", public_url.trim_end_matches('/'));
    let body = BODY_TEMPLATE.replace("{key}", &serde_json::Value::from(key).to_string());

    let entries: [(&str, &str); 16] = [
        ("log_customurl_method", "POST"),
        ("log_customurl_body", body.as_str()),
        ("current_profile_name", key),
        ("log_customurl_url", url.as_str()),
        ("log_customurl_discard_offline_locations_enabled", "false"),
        ("accuracy_before_logging", "40"),
        ("new_file_creation", "custom"),
        ("log_plain_text", "true"),
        ("log_plain_text_csv_delimiter", ","),
        ("hide_notification_buttons", "false"),
        ("log_customurl_enabled", "true"),
        ("distance_before_logging", "0"),
        ("log_satellite_locations", "true"),
        ("log_network_locations", "true"),
        ("new_file_custom_name", track_id),
        ("new_file_custom_each_time", "true"),
    ];

    entries
        .iter()
        .map(|(name, value)| format!("{}={}\n", name, escape_value(value)))
        .collect()
}

/// Escape the characters java.util.Properties treats as separators
fn escape_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, ':' | '=' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
