use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use tracing::warn;

use crate::config::AppConfig;
use crate::error::PipelineError;
use crate::models::upstream::{GenericAlertRecord, PolygonRecord, SeismicAlertRecord};

/// Upstream alert authority, seen as an opaque provider of raw records.
#[async_trait]
pub trait AlertFeed: Send + Sync {
    async fn fetch_alerts(&self) -> Result<Vec<GenericAlertRecord>, PipelineError>;
    async fn fetch_seismic_alerts(&self) -> Result<Vec<SeismicAlertRecord>, PipelineError>;
    /// Secondary polygon lookup for a generic alert. `Ok(None)` means the
    /// authority has no footprint for this identifier (or returned an
    /// unusable body); transport failures and non-2xx are `Err`.
    async fn fetch_polygon(&self, identifier: &str) -> Result<Option<PolygonRecord>, PipelineError>;
}

pub struct HttpAlertFeed {
    client: reqwest::Client,
    alerts_url: String,
    seismic_url: String,
    polygon_url: String,
}

impl HttpAlertFeed {
    pub fn new(config: &AppConfig) -> Result<HttpAlertFeed, PipelineError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .map_err(|e| PipelineError::Config(e.to_string()))?;
        Ok(HttpAlertFeed {
            client,
            alerts_url: config.alert_feed_url.clone(),
            seismic_url: config.seismic_feed_url.clone(),
            polygon_url: config.polygon_lookup_url.clone(),
        })
    }

    async fn fetch_record_array(&self, url: &str) -> Result<Vec<Value>, PipelineError> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(PipelineError::Upstream(format!(
                "{} returned {}",
                url,
                response.status()
            )));
        }
        let body: Value = response.json().await?;
        Ok(record_array(body))
    }
}

/// The feed sometimes wraps its records in `{"alerts": [...]}` and
/// sometimes returns a bare array.
fn record_array(body: Value) -> Vec<Value> {
    match body {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.remove("alerts") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

fn decode_records<T: serde::de::DeserializeOwned>(items: Vec<Value>, what: &str) -> Vec<T> {
    let mut records = Vec::with_capacity(items.len());
    for item in items {
        match serde_json::from_value(item) {
            Ok(record) => records.push(record),
            Err(e) => warn!("skipping undecodable {} record: {}", what, e),
        }
    }
    records
}

#[async_trait]
impl AlertFeed for HttpAlertFeed {
    async fn fetch_alerts(&self) -> Result<Vec<GenericAlertRecord>, PipelineError> {
        let items = self.fetch_record_array(&self.alerts_url).await?;
        Ok(decode_records(items, "generic alert"))
    }

    async fn fetch_seismic_alerts(&self) -> Result<Vec<SeismicAlertRecord>, PipelineError> {
        let items = self.fetch_record_array(&self.seismic_url).await?;
        Ok(decode_records(items, "seismic alert"))
    }

    async fn fetch_polygon(&self, identifier: &str) -> Result<Option<PolygonRecord>, PipelineError> {
        let response = self
            .client
            .get(&self.polygon_url)
            .query(&[("identifier", identifier)])
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(PipelineError::Upstream(format!(
                "polygon lookup for {} returned {}",
                identifier,
                response.status()
            )));
        }

        match response.json::<PolygonRecord>().await {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                warn!("polygon body for {} unusable: {}", identifier, e);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_array_accepts_both_envelope_shapes() {
        assert_eq!(record_array(json!([{"a": 1}])).len(), 1);
        assert_eq!(record_array(json!({"alerts": [{"a": 1}, {"b": 2}]})).len(), 2);
        assert!(record_array(json!({"unexpected": true})).is_empty());
        assert!(record_array(json!("nope")).is_empty());
    }

    #[test]
    fn undecodable_records_are_skipped_not_fatal() {
        let items = vec![
            json!({"identifier": "ok-1", "severity": "Severe"}),
            json!("not an object"),
            json!({"identifier": "ok-2"}),
        ];
        let records: Vec<GenericAlertRecord> = decode_records(items, "generic alert");
        assert_eq!(records.len(), 2);
    }
}
