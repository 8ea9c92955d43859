use serde::Deserialize;
use serde_json::{Map, Value};

/// A generic CAP-style alert record as delivered by the authority feed.
/// Known fields are typed; everything else passes through `extra` so the
/// stored record keeps the full upstream payload for audit.
#[derive(Debug, Clone, Deserialize)]
pub struct GenericAlertRecord {
    pub identifier: Option<String>,
    pub severity: Option<String>,
    pub effective_start_time: Option<String>,
    pub effective_end_time: Option<String>,
    pub disaster_type: Option<String>,
    pub area_description: Option<String>,
    pub warning_message: Option<String>,
    pub severity_color: Option<String>,
    pub alert_source: Option<String>,
    pub area_covered: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GenericAlertRecord {
    /// Reassemble the full upstream field bag.
    pub fn raw_properties(&self) -> Map<String, Value> {
        let mut props = self.extra.clone();
        insert_opt(&mut props, "identifier", &self.identifier);
        insert_opt(&mut props, "severity", &self.severity);
        insert_opt(&mut props, "effective_start_time", &self.effective_start_time);
        insert_opt(&mut props, "effective_end_time", &self.effective_end_time);
        insert_opt(&mut props, "disaster_type", &self.disaster_type);
        insert_opt(&mut props, "area_description", &self.area_description);
        insert_opt(&mut props, "warning_message", &self.warning_message);
        insert_opt(&mut props, "severity_color", &self.severity_color);
        insert_opt(&mut props, "alert_source", &self.alert_source);
        insert_opt(&mut props, "area_covered", &self.area_covered);
        props
    }
}

/// A seismic alert record. The feed embeds magnitude, epicenter and
/// location inside the free-text warning message and attaches intensity
/// polygons inline instead of requiring a secondary lookup.
#[derive(Debug, Clone, Deserialize)]
pub struct SeismicAlertRecord {
    pub warning_message: Option<String>,
    pub effective_start_time: Option<String>,
    pub depth: Option<Value>,
    #[serde(default)]
    pub polygons: Vec<SeismicPolygon>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeismicPolygon {
    /// A GeoJSON-shaped object: `{"type": ..., "coordinates": [...]}`.
    pub coordinates: Option<Value>,
    pub intensity: Option<Value>,
    pub color: Option<String>,
    pub radius: Option<Value>,
    pub name: Option<String>,
}

/// Result of the per-identifier polygon lookup for generic alerts.
#[derive(Debug, Clone, Deserialize)]
pub struct PolygonRecord {
    pub area_json: Option<Value>,
    pub area_covered: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn insert_opt(map: &mut Map<String, Value>, key: &str, value: &Option<String>) {
    if let Some(v) = value {
        map.insert(key.to_string(), Value::String(v.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generic_record_keeps_unknown_fields() {
        let payload = r#"
        {
            "identifier": "alert-1",
            "severity": "Severe",
            "disaster_type": "Rainfall/Floods",
            "warning_message": "Heavy rain expected",
            "sender_org_id": "IMD",
            "min_lat": "28.4"
        }
        "#;

        let record: GenericAlertRecord = serde_json::from_str(payload).unwrap();
        assert_eq!(record.identifier.as_deref(), Some("alert-1"));
        assert_eq!(record.extra["sender_org_id"], "IMD");

        let props = record.raw_properties();
        assert_eq!(props["identifier"], "alert-1");
        assert_eq!(props["min_lat"], "28.4");
    }

    #[test]
    fn seismic_record_with_inline_polygons() {
        let payload = r##"
        {
            "warning_message": "EQ of Magnitude: 5.2, Lat: 19.07 & Long: 72.88",
            "effective_start_time": "Sun Feb 01 10:34:17 IST 2026",
            "depth": "10 km",
            "polygons": [
                {
                    "coordinates": {"type": "MultiPolygon", "coordinates": []},
                    "intensity": 6,
                    "color": "#ff0000",
                    "radius": 25.5,
                    "name": "Zone A"
                },
                {"intensity": 3}
            ]
        }
        "##;

        let record: SeismicAlertRecord = serde_json::from_str(payload).unwrap();
        assert_eq!(record.polygons.len(), 2);
        assert!(record.polygons[0].coordinates.is_some());
        assert!(record.polygons[1].coordinates.is_none());
    }
}
