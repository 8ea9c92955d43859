use chrono::NaiveDateTime;
use serde_json::{json, Map, Value};
use sqlx::types::Json;
use sqlx::FromRow;

use super::category::Category;

/// Tag describing what a single geographic shape on an alert represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(dead_code)]
pub enum FeatureKind {
    Epicenter,
    IntensityZone,
    AlertArea,
    EarthquakeZone,
    /// Sentinel for alerts that carry no footprint at all. Such alerts are
    /// stored for display but never participate in spatial matching.
    NoGeometry,
}

impl FeatureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureKind::Epicenter => "epicenter",
            FeatureKind::IntensityZone => "intensity_zone",
            FeatureKind::AlertArea => "alert_area",
            FeatureKind::EarthquakeZone => "earthquake_zone",
            FeatureKind::NoGeometry => "no_geometry",
        }
    }
}

/// One geographic shape of an alert footprint plus its styling/metadata.
#[derive(Debug, Clone)]
pub struct AlertFeature {
    pub kind: FeatureKind,
    /// GeoJSON geometry object. `None` only for the `NoGeometry` sentinel.
    pub geometry: Option<Value>,
    /// Per-shape attributes (intensity, color, radius, zone name, magnitude, ...).
    pub attributes: Map<String, Value>,
}

impl AlertFeature {
    pub fn no_geometry() -> AlertFeature {
        AlertFeature {
            kind: FeatureKind::NoGeometry,
            geometry: None,
            attributes: Map::new(),
        }
    }
}

/// Canonical alert record produced by the normalizer.
///
/// Effective times stay as the raw upstream strings here; the store parses
/// them leniently when the record is persisted.
#[derive(Debug, Clone)]
pub struct Alert {
    pub identifier: String,
    pub category: Category,
    pub disaster_type: Option<String>,
    pub severity: Option<String>,
    pub severity_color: Option<String>,
    pub area_description: Option<String>,
    pub warning_message: Option<String>,
    pub effective_start_time: Option<String>,
    pub effective_end_time: Option<String>,
    pub features: Vec<AlertFeature>,
    pub raw_properties: Map<String, Value>,
}

impl Alert {
    pub fn new(identifier: String) -> Alert {
        Alert {
            identifier,
            category: Category::Other,
            disaster_type: None,
            severity: None,
            severity_color: None,
            area_description: None,
            warning_message: None,
            effective_start_time: None,
            effective_end_time: None,
            features: Vec::new(),
            raw_properties: Map::new(),
        }
    }

    /// The alert's spatial footprint for the geometry column: the single
    /// shape when there is one, a GeometryCollection when there are several,
    /// `None` when the alert has no shape at all.
    pub fn spatial_geometry(&self) -> Option<Value> {
        let shapes: Vec<&Value> = self
            .features
            .iter()
            .filter_map(|f| f.geometry.as_ref())
            .collect();
        match shapes.len() {
            0 => None,
            1 => Some(shapes[0].clone()),
            _ => Some(json!({
                "type": "GeometryCollection",
                "geometries": shapes.into_iter().cloned().collect::<Vec<_>>(),
            })),
        }
    }

    /// Per-shape records for the features JSONB column.
    pub fn features_json(&self) -> Value {
        Value::Array(
            self.features
                .iter()
                .map(|f| {
                    json!({
                        "feature_type": f.kind.as_str(),
                        "geometry": f.geometry,
                        "attributes": Value::Object(f.attributes.clone()),
                    })
                })
                .collect(),
        )
    }

    /// Project the alert into GeoJSON Features for category bundle
    /// publication: one Feature per shape, descriptive fields merged into
    /// each Feature's properties.
    pub fn to_geojson_features(&self) -> Vec<Value> {
        let mut base = Map::new();
        base.insert("identifier".into(), Value::String(self.identifier.clone()));
        base.insert(
            "alert_category".into(),
            Value::String(self.category.as_str().to_string()),
        );
        insert_opt(&mut base, "disaster_type", &self.disaster_type);
        insert_opt(&mut base, "severity", &self.severity);
        insert_opt(&mut base, "severity_color", &self.severity_color);
        insert_opt(&mut base, "area_description", &self.area_description);
        insert_opt(&mut base, "warning_message", &self.warning_message);
        insert_opt(&mut base, "effective_start_time", &self.effective_start_time);
        insert_opt(&mut base, "effective_end_time", &self.effective_end_time);

        self.features
            .iter()
            .map(|f| {
                let mut props = base.clone();
                props.insert(
                    "feature_type".into(),
                    Value::String(f.kind.as_str().to_string()),
                );
                for (k, v) in &f.attributes {
                    props.insert(k.clone(), v.clone());
                }
                json!({
                    "type": "Feature",
                    "geometry": f.geometry,
                    "properties": Value::Object(props),
                })
            })
            .collect()
    }
}

fn insert_opt(map: &mut Map<String, Value>, key: &str, value: &Option<String>) {
    if let Some(v) = value {
        map.insert(key.to_string(), Value::String(v.clone()));
    }
}

/// An alert row as returned by the store's containment query.
#[derive(Debug, Clone, FromRow)]
pub struct StoredAlert {
    pub identifier: String,
    pub category: String,
    pub disaster_type: Option<String>,
    pub severity: Option<String>,
    pub area_description: Option<String>,
    pub warning_message: Option<String>,
    pub effective_start_time: Option<NaiveDateTime>,
    pub effective_end_time: Option<NaiveDateTime>,
    pub geometry: Option<Json<Value>>,
    pub raw_properties: Option<Json<Value>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spatial_geometry_folds_shapes() {
        let mut alert = Alert::new("a-1".into());
        assert!(alert.spatial_geometry().is_none());

        let poly = json!({"type": "Polygon", "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]});
        alert.features.push(AlertFeature {
            kind: FeatureKind::AlertArea,
            geometry: Some(poly.clone()),
            attributes: Map::new(),
        });
        assert_eq!(alert.spatial_geometry(), Some(poly.clone()));

        alert.features.push(AlertFeature {
            kind: FeatureKind::Epicenter,
            geometry: Some(json!({"type": "Point", "coordinates": [0.5, 0.5]})),
            attributes: Map::new(),
        });
        let collected = alert.spatial_geometry().unwrap();
        assert_eq!(collected["type"], "GeometryCollection");
        assert_eq!(collected["geometries"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn no_geometry_sentinel_stays_out_of_spatial_footprint() {
        let mut alert = Alert::new("a-2".into());
        alert.features.push(AlertFeature::no_geometry());
        assert!(alert.spatial_geometry().is_none());
        assert_eq!(
            alert.features_json()[0]["feature_type"],
            Value::String("no_geometry".into())
        );
    }

    #[test]
    fn geojson_features_carry_descriptive_fields_and_attributes() {
        let mut alert = Alert::new("a-3".into());
        alert.category = Category::Earthquake;
        alert.area_description = Some("Mumbai".into());
        let mut attrs = Map::new();
        attrs.insert("intensity".into(), json!(6));
        alert.features.push(AlertFeature {
            kind: FeatureKind::EarthquakeZone,
            geometry: Some(json!({"type": "Polygon", "coordinates": []})),
            attributes: attrs,
        });

        let features = alert.to_geojson_features();
        assert_eq!(features.len(), 1);
        let props = &features[0]["properties"];
        assert_eq!(props["identifier"], "a-3");
        assert_eq!(props["alert_category"], "earthquake");
        assert_eq!(props["feature_type"], "earthquake_zone");
        assert_eq!(props["area_description"], "Mumbai");
        assert_eq!(props["intensity"], 6);
    }
}
