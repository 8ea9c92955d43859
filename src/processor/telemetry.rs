use chrono::Utc;
use tracing::{info, warn};

use crate::db::sensor_registry::SensorRegistry;
use crate::models::telemetry;
use crate::topics;

/// Record one inbound telemetry message into the registry. The sensor
/// class is the first segment of the topic the message arrived on.
pub async fn record_event(
    registry: &SensorRegistry,
    topic: &str,
    payload: &[u8],
) -> anyhow::Result<()> {
    let event = match telemetry::parse_telemetry(payload) {
        Ok(event) => event,
        Err(e) => {
            warn!("skipping telemetry message on {}: {}", topic, e);
            return Ok(());
        }
    };

    let sensor_class = topics::class_from_topic(topic);
    if event.latitude.is_none() || event.longitude.is_none() {
        // Kept for audit; never eligible for spatial matching.
        warn!(
            "sensor {} on {} reported no usable location",
            event.sensor_id, topic
        );
    }

    registry
        .record(
            &event.sensor_id,
            sensor_class,
            event.latitude,
            event.longitude,
            &event.raw,
            Utc::now().naive_utc(),
        )
        .await?;

    info!(
        "recorded sensor {} class {} at ({:?}, {:?})",
        event.sensor_id, sensor_class, event.latitude, event.longitude
    );
    Ok(())
}
