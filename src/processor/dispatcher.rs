use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{info, warn};

use crate::models::alert::StoredAlert;
use crate::models::category::{interest_for_class, Category};
use crate::models::telemetry::SensorSnapshot;
use crate::mqtt::Publisher;
use crate::topics;

/// Containment lookup seam, implemented by the alert store.
#[async_trait]
pub trait AlertLookup: Send + Sync {
    async fn find_containing(
        &self,
        longitude: f64,
        latitude: f64,
        categories: Option<&[Category]>,
    ) -> Result<Vec<StoredAlert>, sqlx::Error>;
}

#[async_trait]
impl AlertLookup for crate::db::alert_store::AlertStore {
    async fn find_containing(
        &self,
        longitude: f64,
        latitude: f64,
        categories: Option<&[Category]>,
    ) -> Result<Vec<StoredAlert>, sqlx::Error> {
        crate::db::alert_store::AlertStore::find_containing(self, longitude, latitude, categories)
            .await
    }
}

/// Latest-snapshot seam, implemented by the sensor registry.
#[async_trait]
pub trait SensorLookup: Send + Sync {
    async fn all_latest(&self) -> Result<Vec<SensorSnapshot>, sqlx::Error>;
}

#[async_trait]
impl SensorLookup for crate::db::sensor_registry::SensorRegistry {
    async fn all_latest(&self) -> Result<Vec<SensorSnapshot>, sqlx::Error> {
        crate::db::sensor_registry::SensorRegistry::all_latest(self).await
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub checked: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub publish_failures: usize,
}

/// Matches every known sensor position against active alert footprints
/// and publishes one match event per contained alert to the sensor's
/// own topic.
pub struct Dispatcher<S, R, P> {
    store: S,
    sensors: R,
    publisher: P,
}

impl<S: AlertLookup, R: SensorLookup, P: Publisher> Dispatcher<S, R, P> {
    pub fn new(store: S, sensors: R, publisher: P) -> Dispatcher<S, R, P> {
        Dispatcher {
            store,
            sensors,
            publisher,
        }
    }

    pub async fn run_once(&self) -> anyhow::Result<DispatchReport> {
        let snapshots = self.sensors.all_latest().await?;
        info!("dispatch pass over {} sensor(s)", snapshots.len());

        let mut report = DispatchReport::default();
        for snapshot in snapshots {
            report.checked += 1;

            // Wildcard and unrecognized classes get no filter: unknown
            // device types must never be silently excluded.
            let filter = interest_for_class(&snapshot.sensor_class);
            let alerts = match self
                .store
                .find_containing(snapshot.longitude, snapshot.latitude, filter)
                .await
            {
                Ok(alerts) => alerts,
                Err(e) => {
                    warn!(
                        "alert lookup failed for sensor {}: {}",
                        snapshot.sensor_id, e
                    );
                    continue;
                }
            };

            if alerts.is_empty() {
                report.unmatched += 1;
                continue;
            }

            let topic = topics::sensor_topic(&snapshot.sensor_class, &snapshot.sensor_id);
            for alert in &alerts {
                let event = match_event(&snapshot, alert);
                let payload = match serde_json::to_vec(&event) {
                    Ok(p) => p,
                    Err(e) => {
                        warn!("failed to encode match for {}: {}", topic, e);
                        report.publish_failures += 1;
                        continue;
                    }
                };
                match self.publisher.publish(&topic, payload).await {
                    Ok(()) => {
                        info!(
                            "published {} [{}] to {}",
                            alert.identifier, alert.category, topic
                        );
                        report.matched += 1;
                    }
                    Err(e) => {
                        warn!("failed to publish to {}: {}", topic, e);
                        report.publish_failures += 1;
                    }
                }
            }
        }

        info!(
            "dispatch pass done: checked={} matched={} unmatched={} publish_failures={}",
            report.checked, report.matched, report.unmatched, report.publish_failures
        );
        Ok(report)
    }

    /// Fixed-interval loop. Passes are independent and idempotent, so
    /// there is no backoff; a failed pass is logged and the next one runs
    /// on schedule. Exits only on interrupt, after the in-flight pass
    /// has completed.
    pub async fn run_loop(&self, interval: Duration) -> anyhow::Result<()> {
        info!("dispatch loop every {}s, Ctrl+C to stop", interval.as_secs());
        loop {
            if let Err(e) = self.run_once().await {
                warn!("dispatch pass failed: {}", e);
            }
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = tokio::signal::ctrl_c() => {
                    info!("interrupt received, stopping dispatch loop");
                    return Ok(());
                }
            }
        }
    }
}

/// The match event published per (sensor, alert) pair. Ephemeral: built,
/// published, never stored.
fn match_event(snapshot: &SensorSnapshot, alert: &StoredAlert) -> Value {
    json!({
        "type": "cap_alert_match",
        "sensor": {
            "id": snapshot.sensor_id,
            "class": snapshot.sensor_class,
            "lat": snapshot.latitude,
            "lon": snapshot.longitude,
        },
        "alert": {
            "identifier": alert.identifier,
            "category": alert.category,
            "disaster_type": alert.disaster_type,
            "severity": alert.severity,
            "area_description": alert.area_description,
            "warning_message": alert.warning_message,
            "effective_start_time": alert
                .effective_start_time
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string()),
            "effective_end_time": alert
                .effective_end_time
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string()),
            "geometry": alert.geometry.as_ref().map(|g| g.0.clone()),
            "raw_properties": alert.raw_properties.as_ref().map(|p| p.0.clone()),
        },
    })
}
