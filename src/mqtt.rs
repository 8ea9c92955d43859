use crate::config::AppConfig;
use crate::db::sensor_registry::SensorRegistry;
use crate::error::PipelineError;
use crate::processor::telemetry;
use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS, Transport};
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Publish capability consumed by the ingest cycle and the dispatcher.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> anyhow::Result<()>;
}

pub fn connect(config: &AppConfig) -> (AsyncClient, EventLoop) {
    let client_id = format!("cap-dispatch-{}", Uuid::new_v4());
    let mut mqttoptions = MqttOptions::new(client_id, &config.broker_url, config.broker_port);
    mqttoptions.set_keep_alive(Duration::from_secs(5));
    if !config.mqtt_username.is_empty() {
        mqttoptions.set_credentials(&config.mqtt_username, &config.mqtt_password);
    }
    if config.mqtt_tls {
        mqttoptions.set_transport(Transport::tls_with_default_config());
    }

    AsyncClient::new(mqttoptions, 100)
}

/// Drive the connection in the background for publish-only commands. The
/// bus client owns its network I/O; application code only enqueues.
pub fn spawn_event_loop(mut eventloop: EventLoop) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    info!("MQTT connected");
                }
                Ok(_) => {}
                Err(e) => {
                    error!("MQTT connection error: {}", e);
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }
    })
}

pub struct MqttPublisher {
    client: AsyncClient,
    timeout: Duration,
}

impl MqttPublisher {
    pub fn new(client: AsyncClient, timeout: Duration) -> MqttPublisher {
        MqttPublisher { client, timeout }
    }
}

#[async_trait]
impl Publisher for MqttPublisher {
    /// At-least-once publish with a bounded wait on the enqueue.
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> anyhow::Result<()> {
        tokio::time::timeout(
            self.timeout,
            self.client.publish(topic, QoS::AtLeastOnce, false, payload),
        )
        .await
        .map_err(|_| PipelineError::Publish(format!("publish to {} timed out", topic)))?
        .map_err(|e| PipelineError::Publish(e.to_string()))?;
        Ok(())
    }
}

/// Consume sensor telemetry from the configured status topics into the
/// registry until the process is interrupted.
pub async fn run_listener(
    config: &AppConfig,
    registry: &SensorRegistry,
    client: AsyncClient,
    mut eventloop: EventLoop,
) -> anyhow::Result<()> {
    loop {
        tokio::select! {
            event = eventloop.poll() => match event {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    info!("MQTT connected");
                    for topic in &config.sensor_status_topics {
                        client.subscribe(topic.as_str(), QoS::AtLeastOnce).await?;
                        info!("Subscribed to {}", topic);
                    }
                }
                Ok(Event::Incoming(Packet::SubAck(_))) => {
                    debug!("subscription confirmed");
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    if let Err(e) =
                        telemetry::record_event(registry, &publish.topic, &publish.payload).await
                    {
                        warn!("failed to record telemetry: {}", e);
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    error!("MQTT connection error: {}", e);
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("interrupt received, stopping listener");
                client.disconnect().await.ok();
                return Ok(());
            }
        }
    }
}
