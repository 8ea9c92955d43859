mod config;
mod db;
mod error;
mod feed;
mod models;
mod mqtt;
mod processor;
mod topics;

use std::time::Duration;

use clap::{Parser, Subcommand};
use config::AppConfig;
use db::alert_store::AlertStore;
use db::sensor_registry::SensorRegistry;
use feed::HttpAlertFeed;
use mqtt::MqttPublisher;
use processor::dispatcher::Dispatcher;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "cap-dispatch",
    about = "Disaster alert ingestion, categorization and spatial sensor dispatch"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch the upstream alert feeds, store them, publish category bundles
    Ingest,
    /// Listen for sensor telemetry and record snapshots
    Listen,
    /// Match sensor locations against stored alert footprints
    Dispatch {
        /// Run continuously instead of once
        #[arg(long)]
        r#loop: bool,
        /// Seconds between passes when --loop is active (default from config)
        #[arg(long)]
        interval: Option<u64>,
    },
    /// Print the latest geolocated snapshot per sensor
    Sensors {
        /// Restrict to one sensor class
        #[arg(long)]
        class: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load config
    let config = AppConfig::load()?;

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(&config.log_level)
        .init();

    info!("Starting cap-dispatch...");

    // Init DB
    let pool = db::init_pool(&config.database_url).await?;
    info!("Connected to database");

    let store = AlertStore::new(pool.clone());
    store.ensure_schema().await?;
    let registry = SensorRegistry::new(pool.clone());

    match cli.command {
        Command::Ingest => {
            let (client, eventloop) = mqtt::connect(&config);
            let _net = mqtt::spawn_event_loop(eventloop);
            let publisher = MqttPublisher::new(
                client.clone(),
                Duration::from_secs(config.publish_timeout_secs),
            );
            let feed = HttpAlertFeed::new(&config)?;

            processor::ingest::run(&feed, &store, &publisher).await?;
            client.disconnect().await.ok();
        }
        Command::Listen => {
            let (client, eventloop) = mqtt::connect(&config);
            mqtt::run_listener(&config, &registry, client, eventloop).await?;
        }
        Command::Dispatch { r#loop, interval } => {
            let (client, eventloop) = mqtt::connect(&config);
            let _net = mqtt::spawn_event_loop(eventloop);
            let publisher = MqttPublisher::new(
                client.clone(),
                Duration::from_secs(config.publish_timeout_secs),
            );

            let dispatcher = Dispatcher::new(store, registry, publisher);
            if r#loop {
                let interval = interval.unwrap_or(config.dispatch_interval_secs);
                dispatcher.run_loop(Duration::from_secs(interval)).await?;
            } else {
                dispatcher.run_once().await?;
            }
            client.disconnect().await.ok();
        }
        Command::Sensors { class } => {
            let snapshots = match class {
                Some(class) => registry.latest_by_class(&class).await?,
                None => registry.all_latest().await?,
            };
            println!("{} sensor(s)", snapshots.len());
            for snap in snapshots {
                println!(
                    "{:<30} class={:<12} ({}, {}) observed_at={}",
                    snap.sensor_id,
                    snap.sensor_class,
                    snap.latitude,
                    snap.longitude,
                    snap.observed_at
                );
            }
        }
    }

    pool.close().await;
    Ok(())
}
