use chrono::NaiveDateTime;
use serde_json::{Map, Value};
use sqlx::types::Json;
use sqlx::FromRow;

// Field names vary across sensor firmware revisions; the first present
// alias wins.
const SENSOR_ID_ALIASES: &[&str] = &["id", "ID", "sensor_id"];
const LATITUDE_ALIASES: &[&str] = &["Lat", "lat", "latitude"];
const LONGITUDE_ALIASES: &[&str] = &["Long", "long", "longitude"];

/// A decoded inbound telemetry message.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryEvent {
    pub sensor_id: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub raw: Value,
}

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("payload is not a JSON object: {0}")]
    NotAnObject(String),
    #[error("no sensor id field present")]
    MissingSensorId,
}

/// Decode a telemetry payload. Location fields are optional here; events
/// without them are still recorded for audit and filtered out at read time.
pub fn parse_telemetry(payload: &[u8]) -> Result<TelemetryEvent, TelemetryError> {
    let value: Value = serde_json::from_slice(payload)
        .map_err(|e| TelemetryError::NotAnObject(e.to_string()))?;
    let obj = value
        .as_object()
        .ok_or_else(|| TelemetryError::NotAnObject("top-level value is not an object".into()))?;

    let sensor_id = first_field(obj, SENSOR_ID_ALIASES)
        .and_then(coerce_string)
        .ok_or(TelemetryError::MissingSensorId)?;
    let latitude = first_field(obj, LATITUDE_ALIASES).and_then(coerce_f64);
    let longitude = first_field(obj, LONGITUDE_ALIASES).and_then(coerce_f64);

    Ok(TelemetryEvent {
        sensor_id,
        latitude,
        longitude,
        raw: value,
    })
}

fn first_field<'a>(obj: &'a Map<String, Value>, aliases: &[&str]) -> Option<&'a Value> {
    aliases.iter().find_map(|name| obj.get(*name))
}

/// Sensors frequently send numbers as strings.
fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                trimmed.parse::<f64>().ok()
            }
        }
        _ => None,
    }
}

fn coerce_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Latest authoritative snapshot for one (sensor_id, sensor_class) pair.
/// Registry reads only ever return geolocatable snapshots, so lat/lon are
/// not optional here.
#[derive(Debug, Clone, FromRow)]
pub struct SensorSnapshot {
    pub sensor_id: String,
    pub sensor_class: String,
    pub latitude: f64,
    pub longitude: f64,
    pub raw_telemetry: Option<Json<Value>>,
    pub observed_at: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_uppercase_aliases_and_numeric_strings() {
        let payload = br#"
        {
            "id": "20001_0000_62963_01",
            "Lat": "21.26",
            "Long": "77.41",
            "battery": "88",
            "firmware": "1.0.3"
        }
        "#;

        let event = parse_telemetry(payload).unwrap();
        assert_eq!(event.sensor_id, "20001_0000_62963_01");
        assert_eq!(event.latitude, Some(21.26));
        assert_eq!(event.longitude, Some(77.41));
        assert_eq!(event.raw["battery"], "88");
    }

    #[test]
    fn first_alias_wins() {
        let payload = br#"{"id": "primary", "sensor_id": "fallback", "lat": 10.0, "latitude": "99"}"#;
        let event = parse_telemetry(payload).unwrap();
        assert_eq!(event.sensor_id, "primary");
        assert_eq!(event.latitude, Some(10.0));
    }

    #[test]
    fn numeric_sensor_id_is_stringified() {
        let payload = br#"{"ID": 42, "latitude": 1.5, "longitude": 2.5}"#;
        let event = parse_telemetry(payload).unwrap();
        assert_eq!(event.sensor_id, "42");
    }

    #[test]
    fn missing_location_is_not_an_error() {
        let payload = br#"{"sensor_id": "s-9", "rain_mm": "4.2"}"#;
        let event = parse_telemetry(payload).unwrap();
        assert_eq!(event.latitude, None);
        assert_eq!(event.longitude, None);
    }

    #[test]
    fn missing_id_is_rejected() {
        let err = parse_telemetry(br#"{"lat": 1.0, "long": 2.0}"#).unwrap_err();
        assert!(matches!(err, TelemetryError::MissingSensorId));
    }

    #[test]
    fn non_object_payload_is_rejected() {
        assert!(parse_telemetry(b"[1,2,3]").is_err());
        assert!(parse_telemetry(b"not json").is_err());
    }

    #[test]
    fn blank_coordinate_strings_coerce_to_none() {
        let payload = br#"{"id": "s-1", "Lat": "  ", "Long": "bad"}"#;
        let event = parse_telemetry(payload).unwrap();
        assert_eq!(event.latitude, None);
        assert_eq!(event.longitude, None);
    }
}
