use async_trait::async_trait;
use serde_json::json;
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::db::alert_store::{AlertStore, UpsertOutcome};
use crate::error::PipelineError;
use crate::feed::AlertFeed;
use crate::models::alert::Alert;
use crate::models::category::{categorize, Category};
use crate::mqtt::Publisher;
use crate::processor::normalizer;
use crate::topics;

/// Persistence seam for the ingest cycle.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn upsert(&self, alert: &Alert) -> Result<UpsertOutcome, sqlx::Error>;
}

#[async_trait]
impl AlertSink for AlertStore {
    async fn upsert(&self, alert: &Alert) -> Result<UpsertOutcome, sqlx::Error> {
        AlertStore::upsert(self, alert).await
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub fetched: usize,
    pub skipped: usize,
    pub inserted: usize,
    pub updated: usize,
    pub published_topics: usize,
    pub publish_failures: usize,
}

/// One fetch/normalize/categorize/store/publish cycle.
///
/// A single unusable record or failed store write skips that record only;
/// a feed being unreachable drops that feed's records for this cycle; the
/// cycle aborts only when no feed responded at all.
pub async fn run(
    feed: &dyn AlertFeed,
    sink: &dyn AlertSink,
    publisher: &dyn Publisher,
) -> Result<IngestReport, PipelineError> {
    let generic = match feed.fetch_alerts().await {
        Ok(records) => Some(records),
        Err(e) => {
            warn!("generic alert feed unavailable: {}", e);
            None
        }
    };
    let seismic = match feed.fetch_seismic_alerts().await {
        Ok(records) => Some(records),
        Err(e) => {
            warn!("seismic alert feed unavailable: {}", e);
            None
        }
    };
    if generic.is_none() && seismic.is_none() {
        return Err(PipelineError::Upstream(
            "no alert feed responded this cycle".into(),
        ));
    }

    let mut report = IngestReport::default();
    let mut alerts: Vec<Alert> = Vec::new();

    for record in generic.unwrap_or_default() {
        report.fetched += 1;
        let identifier = record
            .identifier
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty());
        let Some(identifier) = identifier else {
            warn!("skipping generic alert without identifier");
            report.skipped += 1;
            continue;
        };

        // Transport failures here abort the whole cycle; a missing or
        // unusable footprint only downgrades this alert to no-geometry.
        let polygon = feed.fetch_polygon(identifier).await?;
        match normalizer::normalize_generic(&record, polygon.as_ref()) {
            Ok(alert) => alerts.push(alert),
            Err(e) => {
                warn!("skipping generic alert {}: {}", identifier, e);
                report.skipped += 1;
            }
        }
    }

    for record in seismic.unwrap_or_default() {
        report.fetched += 1;
        match normalizer::normalize_seismic(&record) {
            Ok(alert) => alerts.push(alert),
            Err(e) => {
                warn!("skipping seismic alert: {}", e);
                report.skipped += 1;
            }
        }
    }

    for alert in &mut alerts {
        alert.category = categorize(
            alert.disaster_type.as_deref().unwrap_or(""),
            alert.warning_message.as_deref().unwrap_or(""),
        );
    }

    for alert in &alerts {
        match sink.upsert(alert).await {
            Ok(UpsertOutcome::Inserted) => report.inserted += 1,
            Ok(UpsertOutcome::Updated) => report.updated += 1,
            Err(e) => {
                warn!("failed to store alert {}: {}", alert.identifier, e);
                report.skipped += 1;
            }
        }
    }

    publish_category_bundles(&alerts, publisher, &mut report).await;

    info!(
        "ingest cycle done: fetched={} inserted={} updated={} skipped={} topics={} publish_failures={}",
        report.fetched,
        report.inserted,
        report.updated,
        report.skipped,
        report.published_topics,
        report.publish_failures
    );
    Ok(report)
}

/// Publish one GeoJSON bundle per category present in this cycle to
/// `alerts/{category}`. Publish failures never abort the cycle.
async fn publish_category_bundles(
    alerts: &[Alert],
    publisher: &dyn Publisher,
    report: &mut IngestReport,
) {
    let mut by_category: BTreeMap<Category, Vec<&Alert>> = BTreeMap::new();
    for alert in alerts {
        by_category.entry(alert.category).or_default().push(alert);
    }

    for (category, group) in by_category {
        let topic = topics::category_topic(category);
        let features: Vec<_> = group
            .iter()
            .flat_map(|a| a.to_geojson_features())
            .collect();
        let bundle = json!({
            "type": "FeatureCollection",
            "features": features,
            "metadata": {
                "category": category.as_str(),
                "count": group.len(),
                "topic": topic,
            },
        });

        let payload = match serde_json::to_vec(&bundle) {
            Ok(p) => p,
            Err(e) => {
                warn!("failed to encode bundle for {}: {}", topic, e);
                report.publish_failures += 1;
                continue;
            }
        };
        match publisher.publish(&topic, payload).await {
            Ok(()) => {
                info!("published {} alert(s) to {}", group.len(), topic);
                report.published_topics += 1;
            }
            Err(e) => {
                warn!("failed to publish to {}: {}", topic, e);
                report.publish_failures += 1;
            }
        }
    }
}
