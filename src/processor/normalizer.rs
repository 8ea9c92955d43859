use serde_json::{json, Map, Value};

use crate::error::PipelineError;
use crate::models::alert::{Alert, AlertFeature, FeatureKind};
use crate::models::upstream::{GenericAlertRecord, PolygonRecord, SeismicAlertRecord};

const SEISMIC_ID_PREFIX: &str = "seismic-";

/// Normalize a generic CAP-style record plus its (optional) polygon lookup
/// result into one canonical alert.
///
/// A record without an identifier is a data-quality defect: it is rejected
/// rather than given a fabricated key that could collide on re-ingestion.
pub fn normalize_generic(
    record: &GenericAlertRecord,
    polygon: Option<&PolygonRecord>,
) -> Result<Alert, PipelineError> {
    let identifier = record
        .identifier
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| PipelineError::MalformedRecord("generic alert without identifier".into()))?;

    let mut alert = Alert::new(identifier.to_string());
    alert.disaster_type = record.disaster_type.clone();
    alert.severity = record.severity.clone();
    alert.severity_color = record.severity_color.clone();
    alert.area_description = record.area_description.clone();
    alert.warning_message = record.warning_message.clone();
    alert.effective_start_time = record.effective_start_time.clone();
    alert.effective_end_time = record.effective_end_time.clone();
    alert.raw_properties = record.raw_properties();

    match polygon.and_then(polygon_geometry) {
        Some((geometry, attributes)) => {
            alert.features.push(AlertFeature {
                kind: FeatureKind::AlertArea,
                geometry: Some(geometry),
                attributes,
            });
        }
        // No footprint available: keep the alert for display, out of
        // spatial matching.
        None => alert.features.push(AlertFeature::no_geometry()),
    }

    Ok(alert)
}

fn polygon_geometry(record: &PolygonRecord) -> Option<(Value, Map<String, Value>)> {
    let geometry = record.area_json.as_ref()?;
    if !geometry
        .as_object()
        .map(|o| o.contains_key("coordinates"))
        .unwrap_or(false)
    {
        return None;
    }

    // Bounding fields and whatever else the lookup returned ride along as
    // feature attributes.
    let mut attributes = record.extra.clone();
    if let Some(area) = &record.area_covered {
        attributes.insert("area_covered".into(), Value::String(area.clone()));
    }
    Some((geometry.clone(), attributes))
}

/// Normalize a seismic record. The upstream seismic feed never supplies an
/// identifier, so one is synthesized deterministically from the event
/// timestamp; a record without a timestamp cannot be keyed and is rejected.
pub fn normalize_seismic(record: &SeismicAlertRecord) -> Result<Alert, PipelineError> {
    let timestamp = record
        .effective_start_time
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            PipelineError::MalformedRecord("seismic alert without effective_start_time".into())
        })?;

    let mut alert = Alert::new(format!(
        "{}{}",
        SEISMIC_ID_PREFIX,
        sanitize_identifier(timestamp)
    ));
    alert.disaster_type = Some("Earthquake".to_string());
    alert.warning_message = record.warning_message.clone();
    alert.effective_start_time = record.effective_start_time.clone();

    let message = record.warning_message.as_deref().unwrap_or("");
    // Each marker is parsed independently; one malformed marker never
    // blocks the others.
    let magnitude = parse_after(message, "Magnitude:", Some(','))
        .and_then(|s| s.parse::<f64>().ok());
    let latitude = parse_after(message, "Lat:", Some('&')).and_then(|s| s.parse::<f64>().ok());
    let longitude = parse_after(message, "Long:", Some(',')).and_then(|s| s.parse::<f64>().ok());
    let location = parse_after(message, "Location:", None).map(str::to_string);

    alert.area_description = location.clone();

    let mut raw = record.extra.clone();
    if let Some(msg) = &record.warning_message {
        raw.insert("warning_message".into(), Value::String(msg.clone()));
    }
    raw.insert(
        "effective_start_time".into(),
        Value::String(timestamp.to_string()),
    );
    if let Some(depth) = &record.depth {
        raw.insert("depth".into(), depth.clone());
    }
    if let Some(m) = magnitude {
        raw.insert("magnitude".into(), json!(m));
    }
    if let Some(loc) = &location {
        raw.insert("location".into(), Value::String(loc.clone()));
    }
    alert.raw_properties = raw;

    if let (Some(lat), Some(lon)) = (latitude, longitude) {
        let mut attributes = Map::new();
        if let Some(m) = magnitude {
            attributes.insert("magnitude".into(), json!(m));
        }
        if let Some(depth) = &record.depth {
            attributes.insert("depth".into(), depth.clone());
        }
        alert.features.push(AlertFeature {
            kind: FeatureKind::Epicenter,
            geometry: Some(json!({"type": "Point", "coordinates": [lon, lat]})),
            attributes,
        });
    }

    for polygon in &record.polygons {
        let Some(geometry) = polygon.coordinates.as_ref() else {
            continue;
        };
        if !geometry
            .as_object()
            .map(|o| o.contains_key("coordinates"))
            .unwrap_or(false)
        {
            continue;
        }

        let mut attributes = Map::new();
        if let Some(i) = &polygon.intensity {
            attributes.insert("intensity".into(), i.clone());
        }
        if let Some(c) = &polygon.color {
            attributes.insert("color".into(), Value::String(c.clone()));
        }
        if let Some(r) = &polygon.radius {
            attributes.insert("radius".into(), r.clone());
        }
        if let Some(n) = &polygon.name {
            attributes.insert("zone_name".into(), Value::String(n.clone()));
        }
        alert.features.push(AlertFeature {
            kind: FeatureKind::EarthquakeZone,
            geometry: Some(geometry.clone()),
            attributes,
        });
    }

    if alert.features.is_empty() {
        alert.features.push(AlertFeature::no_geometry());
    }

    Ok(alert)
}

/// Text after `marker`, up to `terminator` (or end of string), trimmed.
fn parse_after<'a>(message: &'a str, marker: &str, terminator: Option<char>) -> Option<&'a str> {
    let (_, rest) = message.split_once(marker)?;
    let value = match terminator {
        Some(t) => rest.split(t).next().unwrap_or(rest),
        None => rest,
    };
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Replace every non-alphanumeric byte so the synthesized identifier is
/// safe as a key and as a topic segment.
fn sanitize_identifier(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::category::{categorize, Category};
    use serde_json::json;

    fn seismic_record(message: &str) -> SeismicAlertRecord {
        serde_json::from_value(json!({
            "warning_message": message,
            "effective_start_time": "Sun Feb 01 10:34:17 IST 2026",
            "depth": "10 km"
        }))
        .unwrap()
    }

    #[test]
    fn seismic_message_markers_parse_into_epicenter() {
        let record = seismic_record(
            "EQ of Magnitude: 5.2, occurred on 01-02-2026, Lat: 19.07 & Long: 72.88, Depth: 10 Km, Location: Mumbai",
        );
        let alert = normalize_seismic(&record).unwrap();

        assert!(alert.identifier.starts_with("seismic-"));
        assert_eq!(alert.area_description.as_deref(), Some("Mumbai"));
        assert!(alert.area_description.as_deref().unwrap().ends_with("Mumbai"));

        let epicenter = &alert.features[0];
        assert_eq!(epicenter.kind, FeatureKind::Epicenter);
        assert_eq!(
            epicenter.geometry,
            Some(json!({"type": "Point", "coordinates": [72.88, 19.07]}))
        );
        assert_eq!(epicenter.attributes["magnitude"], json!(5.2));

        // The tagged record categorizes as earthquake.
        assert_eq!(
            categorize(
                alert.disaster_type.as_deref().unwrap_or(""),
                alert.warning_message.as_deref().unwrap_or("")
            ),
            Category::Earthquake
        );
    }

    #[test]
    fn one_bad_marker_does_not_block_the_others() {
        let record = seismic_record("Magnitude: strong, Lat: 19.07 & Long: 72.88, Location: Pune");
        let alert = normalize_seismic(&record).unwrap();

        let epicenter = &alert.features[0];
        assert_eq!(epicenter.kind, FeatureKind::Epicenter);
        assert!(epicenter.attributes.get("magnitude").is_none());
        assert_eq!(alert.area_description.as_deref(), Some("Pune"));
    }

    #[test]
    fn seismic_identifier_is_deterministic_and_sanitized() {
        let a = normalize_seismic(&seismic_record("m")).unwrap();
        let b = normalize_seismic(&seismic_record("m")).unwrap();
        assert_eq!(a.identifier, b.identifier);
        assert_eq!(a.identifier, "seismic-Sun-Feb-01-10-34-17-IST-2026");
    }

    #[test]
    fn seismic_without_timestamp_is_rejected() {
        let record: SeismicAlertRecord =
            serde_json::from_value(json!({"warning_message": "Magnitude: 4.0"})).unwrap();
        assert!(matches!(
            normalize_seismic(&record),
            Err(PipelineError::MalformedRecord(_))
        ));
    }

    #[test]
    fn seismic_inline_polygons_become_earthquake_zones() {
        let record: SeismicAlertRecord = serde_json::from_value(json!({
            "warning_message": "Magnitude: 6.1, Lat: 28.1 & Long: 84.7, Location: Border",
            "effective_start_time": "2026-02-01 10:34:17",
            "polygons": [
                {
                    "coordinates": {"type": "MultiPolygon", "coordinates": [[[[84.0, 27.5], [85.5, 27.5], [85.5, 28.8], [84.0, 27.5]]]]},
                    "intensity": 7,
                    "color": "#d7191c",
                    "radius": 50,
                    "name": "Severe zone"
                },
                {"intensity": 2, "name": "no shape, skipped"}
            ]
        }))
        .unwrap();

        let alert = normalize_seismic(&record).unwrap();
        let zones: Vec<_> = alert
            .features
            .iter()
            .filter(|f| f.kind == FeatureKind::EarthquakeZone)
            .collect();
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].attributes["zone_name"], "Severe zone");
        assert_eq!(zones[0].attributes["intensity"], json!(7));
        // Epicenter + one zone fold into a collection footprint.
        assert_eq!(alert.spatial_geometry().unwrap()["type"], "GeometryCollection");
    }

    #[test]
    fn generic_without_identifier_is_rejected() {
        let record: GenericAlertRecord =
            serde_json::from_value(json!({"disaster_type": "Rainfall/Floods"})).unwrap();
        assert!(matches!(
            normalize_generic(&record, None),
            Err(PipelineError::MalformedRecord(_))
        ));
    }

    #[test]
    fn generic_with_polygon_gets_alert_area() {
        let record: GenericAlertRecord = serde_json::from_value(json!({
            "identifier": "test-rainfall-alert-005",
            "disaster_type": "Rainfall/Floods",
            "severity": "Severe",
            "area_description": "Jabalpur District"
        }))
        .unwrap();
        let polygon: PolygonRecord = serde_json::from_value(json!({
            "area_json": {
                "type": "Polygon",
                "coordinates": [[[77.2, 21.0], [77.6, 21.0], [77.6, 21.5], [77.2, 21.5], [77.2, 21.0]]]
            },
            "area_covered": "Jabalpur District"
        }))
        .unwrap();

        let alert = normalize_generic(&record, Some(&polygon)).unwrap();
        assert_eq!(alert.features.len(), 1);
        assert_eq!(alert.features[0].kind, FeatureKind::AlertArea);
        assert_eq!(alert.features[0].attributes["area_covered"], "Jabalpur District");
        assert!(alert.spatial_geometry().is_some());
    }

    #[test]
    fn generic_without_polygon_keeps_metadata_with_no_geometry() {
        let record: GenericAlertRecord = serde_json::from_value(json!({
            "identifier": "alert-77",
            "disaster_type": "Drought",
            "area_description": "Marathwada"
        }))
        .unwrap();

        let alert = normalize_generic(&record, None).unwrap();
        assert_eq!(alert.features.len(), 1);
        assert_eq!(alert.features[0].kind, FeatureKind::NoGeometry);
        assert!(alert.spatial_geometry().is_none());
        assert_eq!(alert.area_description.as_deref(), Some("Marathwada"));

        // Same for a lookup result whose body has no usable shape.
        let empty_polygon: PolygonRecord = serde_json::from_value(json!({"area_json": null})).unwrap();
        let alert = normalize_generic(&record, Some(&empty_polygon)).unwrap();
        assert_eq!(alert.features[0].kind, FeatureKind::NoGeometry);
    }
}
