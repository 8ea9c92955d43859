use anyhow::Result;
use chrono::NaiveDateTime;
use sqlx::types::Json;
use sqlx::Row;
use tracing::debug;

use crate::db::{queries, DbPool};
use crate::models::alert::{Alert, StoredAlert};
use crate::models::category::Category;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// Geometry-indexed alert store over Postgres/PostGIS.
#[derive(Clone)]
pub struct AlertStore {
    pool: DbPool,
}

impl AlertStore {
    pub fn new(pool: DbPool) -> AlertStore {
        AlertStore { pool }
    }

    /// Idempotent schema initialization: extension, tables, indexes.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(queries::CREATE_POSTGIS_EXTENSION)
            .execute(&self.pool)
            .await?;
        sqlx::query(queries::CREATE_ALERTS_TABLE)
            .execute(&self.pool)
            .await?;
        sqlx::query(queries::CREATE_ALERTS_GEOMETRY_INDEX)
            .execute(&self.pool)
            .await?;
        sqlx::query(queries::CREATE_ALERTS_CATEGORY_INDEX)
            .execute(&self.pool)
            .await?;
        sqlx::query(queries::CREATE_SENSOR_STATUS_TABLE)
            .execute(&self.pool)
            .await?;
        for stmt in queries::CREATE_SENSOR_STATUS_INDEXES {
            sqlx::query(stmt).execute(&self.pool).await?;
        }
        debug!("database schema verified");
        Ok(())
    }

    /// Insert or overwrite the alert keyed by its identifier. On conflict
    /// every non-key field is replaced, geometry included.
    pub async fn upsert(&self, alert: &Alert) -> Result<UpsertOutcome, sqlx::Error> {
        let geometry = alert
            .spatial_geometry()
            .map(|g| g.to_string());
        let effective_start = parse_effective_timestamp(alert.effective_start_time.as_deref());
        let effective_end = parse_effective_timestamp(alert.effective_end_time.as_deref());

        let row = sqlx::query(queries::UPSERT_ALERT)
            .bind(&alert.identifier)
            .bind(alert.category.as_str())
            .bind(&alert.disaster_type)
            .bind(&alert.severity)
            .bind(&alert.severity_color)
            .bind(&alert.area_description)
            .bind(&alert.warning_message)
            .bind(effective_start)
            .bind(effective_end)
            .bind(geometry)
            .bind(Json(alert.features_json()))
            .bind(Json(serde_json::Value::Object(alert.raw_properties.clone())))
            .fetch_one(&self.pool)
            .await?;

        let inserted: bool = row.try_get("inserted")?;
        Ok(if inserted {
            UpsertOutcome::Inserted
        } else {
            UpsertOutcome::Updated
        })
    }

    /// Every alert whose footprint contains the point, deduplicated by
    /// identifier, most recent effective start first.
    ///
    /// `categories = None` matches any category; an empty slice is a
    /// defined empty result and never reaches the database.
    pub async fn find_containing(
        &self,
        longitude: f64,
        latitude: f64,
        categories: Option<&[Category]>,
    ) -> Result<Vec<StoredAlert>, sqlx::Error> {
        match categories {
            Some([]) => Ok(Vec::new()),
            Some(cats) => {
                let tags: Vec<String> = cats.iter().map(|c| c.as_str().to_string()).collect();
                sqlx::query_as(queries::SELECT_ALERTS_CONTAINING_POINT_IN_CATEGORIES)
                    .bind(longitude)
                    .bind(latitude)
                    .bind(tags)
                    .fetch_all(&self.pool)
                    .await
            }
            None => {
                sqlx::query_as(queries::SELECT_ALERTS_CONTAINING_POINT)
                    .bind(longitude)
                    .bind(latitude)
                    .fetch_all(&self.pool)
                    .await
            }
        }
    }
}

/// Lenient effective-time parsing. The feed mixes ISO-ish timestamps with
/// a legacy `Sun Feb 01 10:34:17 IST 2026` shape; anything unparseable
/// stores as NULL so one bad field never rejects the whole record.
pub fn parse_effective_timestamp(raw: Option<&str>) -> Option<NaiveDateTime> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }

    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(ts);
        }
    }

    // "Sun Feb 01 10:34:17 IST 2026": drop weekday and timezone token.
    let parts: Vec<&str> = raw.split_whitespace().collect();
    if parts.len() >= 6 {
        let cleaned = format!("{} {} {} {}", parts[1], parts[2], parts[3], parts[5]);
        if let Ok(ts) = NaiveDateTime::parse_from_str(&cleaned, "%b %d %H:%M:%S %Y") {
            return Some(ts);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};

    #[test]
    fn parses_iso_style_timestamps() {
        let ts = parse_effective_timestamp(Some("2026-02-01 10:34:17")).unwrap();
        assert_eq!(ts.date(), NaiveDate::from_ymd_opt(2026, 2, 1).unwrap());
        assert!(parse_effective_timestamp(Some("2026-02-01T10:34:17")).is_some());
    }

    #[test]
    fn parses_legacy_timezone_shape() {
        let ts = parse_effective_timestamp(Some("Sun Feb 01 10:34:17 IST 2026")).unwrap();
        assert_eq!(ts.date(), NaiveDate::from_ymd_opt(2026, 2, 1).unwrap());
        assert_eq!(ts.hour(), 10);
    }

    #[test]
    fn malformed_timestamps_store_as_null() {
        assert!(parse_effective_timestamp(None).is_none());
        assert!(parse_effective_timestamp(Some("")).is_none());
        assert!(parse_effective_timestamp(Some("yesterday-ish")).is_none());
        assert!(parse_effective_timestamp(Some("Sun Feb 01")).is_none());
    }
}
