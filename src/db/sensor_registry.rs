use chrono::NaiveDateTime;
use serde_json::Value;
use sqlx::types::Json;

use crate::db::{queries, DbPool};
use crate::models::telemetry::SensorSnapshot;

/// Append-only registry of sensor telemetry snapshots. History is kept for
/// audit; reads always resolve the latest snapshot per
/// (sensor_id, sensor_class) and only return geolocatable rows.
#[derive(Clone)]
pub struct SensorRegistry {
    pool: DbPool,
}

impl SensorRegistry {
    pub fn new(pool: DbPool) -> SensorRegistry {
        SensorRegistry { pool }
    }

    /// Record one telemetry event. Events without coordinates are stored
    /// for audit but will never appear in `all_latest`/`latest_by_class`.
    pub async fn record(
        &self,
        sensor_id: &str,
        sensor_class: &str,
        latitude: Option<f64>,
        longitude: Option<f64>,
        raw_telemetry: &Value,
        observed_at: NaiveDateTime,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(queries::INSERT_SENSOR_STATUS)
            .bind(sensor_id)
            .bind(sensor_class)
            .bind(latitude)
            .bind(longitude)
            .bind(Json(raw_telemetry.clone()))
            .bind(observed_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn all_latest(&self) -> Result<Vec<SensorSnapshot>, sqlx::Error> {
        sqlx::query_as(queries::SELECT_LATEST_SENSORS)
            .fetch_all(&self.pool)
            .await
    }

    pub async fn latest_by_class(
        &self,
        sensor_class: &str,
    ) -> Result<Vec<SensorSnapshot>, sqlx::Error> {
        sqlx::query_as(queries::SELECT_LATEST_SENSORS_BY_CLASS)
            .bind(sensor_class)
            .fetch_all(&self.pool)
            .await
    }
}
