pub const CREATE_POSTGIS_EXTENSION: &str = r#"
CREATE EXTENSION IF NOT EXISTS postgis;
"#;

pub const CREATE_ALERTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS cap_alerts (
    identifier VARCHAR(255) PRIMARY KEY,
    category VARCHAR(100) NOT NULL DEFAULT 'other',
    disaster_type VARCHAR(100),
    severity VARCHAR(50),
    severity_color VARCHAR(50),
    area_description TEXT,
    warning_message TEXT,
    effective_start_time TIMESTAMP,
    effective_end_time TIMESTAMP,
    geometry GEOMETRY,
    features JSONB,
    raw_properties JSONB,
    updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
"#;

pub const CREATE_ALERTS_GEOMETRY_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_cap_alerts_geometry ON cap_alerts USING GIST (geometry);
"#;

pub const CREATE_ALERTS_CATEGORY_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_cap_alerts_category ON cap_alerts (category);
"#;

pub const CREATE_SENSOR_STATUS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS sensor_status (
    id BIGSERIAL PRIMARY KEY,
    sensor_id VARCHAR(255) NOT NULL,
    sensor_class VARCHAR(255) NOT NULL,
    latitude DOUBLE PRECISION,
    longitude DOUBLE PRECISION,
    raw_telemetry JSONB,
    observed_at TIMESTAMP NOT NULL,
    UNIQUE (sensor_id, sensor_class, observed_at)
);
"#;

pub const CREATE_SENSOR_STATUS_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_sensor_status_sensor_id ON sensor_status (sensor_id);",
    "CREATE INDEX IF NOT EXISTS idx_sensor_status_class ON sensor_status (sensor_class);",
    "CREATE INDEX IF NOT EXISTS idx_sensor_status_observed_at ON sensor_status (observed_at);",
];

// Last-write-wins by contract: every non-key column is overwritten on
// conflict, geometry included. `(xmax = 0)` distinguishes a fresh insert
// from an update of an existing row.
pub const UPSERT_ALERT: &str = r#"
INSERT INTO cap_alerts (
    identifier, category, disaster_type, severity, severity_color,
    area_description, warning_message, effective_start_time, effective_end_time,
    geometry, features, raw_properties, updated_at
) VALUES (
    $1, $2, $3, $4, $5,
    $6, $7, $8, $9,
    ST_SetSRID(ST_GeomFromGeoJSON($10), 4326), $11, $12, NOW()
)
ON CONFLICT (identifier) DO UPDATE SET
    category = EXCLUDED.category,
    disaster_type = EXCLUDED.disaster_type,
    severity = EXCLUDED.severity,
    severity_color = EXCLUDED.severity_color,
    area_description = EXCLUDED.area_description,
    warning_message = EXCLUDED.warning_message,
    effective_start_time = EXCLUDED.effective_start_time,
    effective_end_time = EXCLUDED.effective_end_time,
    geometry = EXCLUDED.geometry,
    features = EXCLUDED.features,
    raw_properties = EXCLUDED.raw_properties,
    updated_at = NOW()
RETURNING (xmax = 0) AS inserted;
"#;

pub const SELECT_ALERTS_CONTAINING_POINT: &str = r#"
SELECT identifier, category, disaster_type, severity, area_description,
       warning_message, effective_start_time, effective_end_time,
       ST_AsGeoJSON(geometry)::jsonb AS geometry, raw_properties
FROM (
    SELECT DISTINCT ON (identifier) *
    FROM cap_alerts
    WHERE geometry IS NOT NULL
      AND ST_Contains(geometry, ST_SetSRID(ST_MakePoint($1, $2), 4326))
    ORDER BY identifier, effective_start_time DESC
) matched
ORDER BY effective_start_time DESC NULLS LAST;
"#;

pub const SELECT_ALERTS_CONTAINING_POINT_IN_CATEGORIES: &str = r#"
SELECT identifier, category, disaster_type, severity, area_description,
       warning_message, effective_start_time, effective_end_time,
       ST_AsGeoJSON(geometry)::jsonb AS geometry, raw_properties
FROM (
    SELECT DISTINCT ON (identifier) *
    FROM cap_alerts
    WHERE geometry IS NOT NULL
      AND category = ANY($3)
      AND ST_Contains(geometry, ST_SetSRID(ST_MakePoint($1, $2), 4326))
    ORDER BY identifier, effective_start_time DESC
) matched
ORDER BY effective_start_time DESC NULLS LAST;
"#;

pub const INSERT_SENSOR_STATUS: &str = r#"
INSERT INTO sensor_status (sensor_id, sensor_class, latitude, longitude, raw_telemetry, observed_at)
VALUES ($1, $2, $3, $4, $5, $6)
ON CONFLICT (sensor_id, sensor_class, observed_at) DO UPDATE SET
    latitude = EXCLUDED.latitude,
    longitude = EXCLUDED.longitude,
    raw_telemetry = EXCLUDED.raw_telemetry;
"#;

// Latest snapshot per (sensor_id, sensor_class); `id DESC` breaks
// observed_at ties by insertion order. Only geolocatable rows are eligible
// for matching.
pub const SELECT_LATEST_SENSORS: &str = r#"
SELECT DISTINCT ON (sensor_id, sensor_class)
    sensor_id, sensor_class, latitude, longitude, raw_telemetry, observed_at
FROM sensor_status
WHERE latitude IS NOT NULL
  AND longitude IS NOT NULL
ORDER BY sensor_id, sensor_class, observed_at DESC, id DESC;
"#;

pub const SELECT_LATEST_SENSORS_BY_CLASS: &str = r#"
SELECT DISTINCT ON (sensor_id, sensor_class)
    sensor_id, sensor_class, latitude, longitude, raw_telemetry, observed_at
FROM sensor_status
WHERE sensor_class = $1
  AND latitude IS NOT NULL
  AND longitude IS NOT NULL
ORDER BY sensor_id, sensor_class, observed_at DESC, id DESC;
"#;
