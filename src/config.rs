use dotenvy::dotenv;
use std::env;

use crate::error::PipelineError;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub broker_url: String,
    pub broker_port: u16,
    pub mqtt_username: String,
    pub mqtt_password: String,
    pub mqtt_tls: bool,
    pub sensor_status_topics: Vec<String>,
    pub alert_feed_url: String,
    pub seismic_feed_url: String,
    pub polygon_lookup_url: String,
    pub http_timeout_secs: u64,
    pub publish_timeout_secs: u64,
    pub dispatch_interval_secs: u64,
    pub log_level: String,
}

impl AppConfig {
    /// Load configuration from the environment (a `.env` file is honored).
    /// Missing connection parameters are fatal; everything else defaults.
    pub fn load() -> Result<Self, PipelineError> {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| PipelineError::Config("DATABASE_URL is not set".into()))?;
        let broker_url = env::var("BROKER_URL")
            .map_err(|_| PipelineError::Config("BROKER_URL is not set".into()))?;

        let broker_port = env::var("BROKER_PORT")
            .unwrap_or_else(|_| "8883".to_string())
            .parse()
            .unwrap_or(8883);
        let mqtt_username = env::var("MQTT_USERNAME").unwrap_or_default();
        let mqtt_password = env::var("MQTT_PASSWORD").unwrap_or_default();
        let mqtt_tls = env::var("MQTT_TLS")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        let sensor_status_topics = env::var("SENSOR_STATUS_TOPICS")
            .unwrap_or_else(|_| "rainfall/status".to_string())
            .split(',')
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();

        let alert_feed_url = env::var("ALERT_FEED_URL").unwrap_or_else(|_| {
            "https://sachet.ndma.gov.in/cap_public_website/FetchAllAlertDetails".to_string()
        });
        let seismic_feed_url = env::var("SEISMIC_FEED_URL").unwrap_or_else(|_| {
            "https://sachet.ndma.gov.in/cap_public_website/FetchEarthquakeAlerts".to_string()
        });
        let polygon_lookup_url = env::var("POLYGON_LOOKUP_URL").unwrap_or_else(|_| {
            "https://sachet.ndma.gov.in/cap_public_website/FetchPolygonFromAlertId".to_string()
        });

        let http_timeout_secs = env::var("HTTP_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .unwrap_or(30);
        let publish_timeout_secs = env::var("PUBLISH_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .unwrap_or(10);
        let dispatch_interval_secs = env::var("DISPATCH_INTERVAL_SECS")
            .unwrap_or_else(|_| "300".to_string())
            .parse()
            .unwrap_or(300);

        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            database_url,
            broker_url,
            broker_port,
            mqtt_username,
            mqtt_password,
            mqtt_tls,
            sensor_status_topics,
            alert_feed_url,
            seismic_feed_url,
            polygon_lookup_url,
            http_timeout_secs,
            publish_timeout_secs,
            dispatch_interval_secs,
            log_level,
        })
    }
}
