//! Read-only health alerts. The app never writes alerts except through the
//! developer seeding action.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::backend::{timestamp_value, Document, DocumentStore, Fields};
use crate::error::Result;

pub const ALERTS_COLLECTION: &str = "alerts";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub id: String,
    pub title: String,
    pub status: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub description: Option<String>,
}

#[derive(Deserialize)]
struct StoredAlert {
    title: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    description: Option<String>,
}

impl Alert {
    fn from_document(doc: Document) -> Result<Self> {
        let stored: StoredAlert = serde_json::from_value(Value::Object(doc.fields))?;
        Ok(Self {
            id: doc.id,
            title: stored.title,
            status: stored.status,
            timestamp: stored.timestamp,
            description: stored.description.filter(|d| !d.trim().is_empty()),
        })
    }
}

/// Counts per status label for the dashboard header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AlertSummary {
    pub critical: usize,
    pub warning: usize,
    pub info: usize,
    pub other: usize,
}

impl AlertSummary {
    pub fn from_alerts(alerts: &[Alert]) -> Self {
        alerts
            .iter()
            .fold(Self::default(), |mut summary, alert| {
                match alert.status.to_ascii_lowercase().as_str() {
                    "critical" => summary.critical += 1,
                    "warning" => summary.warning += 1,
                    "info" => summary.info += 1,
                    _ => summary.other += 1,
                }
                summary
            })
    }

    pub fn total(&self) -> usize {
        self.critical + self.warning + self.info + self.other
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AlertsDashboard {
    pub alerts: Vec<Alert>,
    pub summary: AlertSummary,
}

/// All alerts in store order. Documents that don't parse are skipped.
pub async fn list_alerts(store: &dyn DocumentStore) -> Result<Vec<Alert>> {
    let docs = store.get_all(ALERTS_COLLECTION).await?;
    let total = docs.len();
    let alerts: Vec<Alert> = docs
        .into_iter()
        .filter_map(|doc| {
            let id = doc.id.clone();
            Alert::from_document(doc)
                .map_err(|e| warn!("Skipping malformed alert {}: {}", id, e))
                .ok()
        })
        .collect();
    info!("Loaded {} of {} alerts", alerts.len(), total);
    Ok(alerts)
}

/// Newest first; undated alerts sink to the bottom.
pub fn sort_newest_first(alerts: &mut [Alert]) {
    alerts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}

pub async fn load_dashboard(store: &dyn DocumentStore) -> Result<AlertsDashboard> {
    let mut alerts = list_alerts(store).await?;
    sort_newest_first(&mut alerts);
    let summary = AlertSummary::from_alerts(&alerts);
    Ok(AlertsDashboard { alerts, summary })
}

/// The demo alerts written by the seeding action. Timestamps are stored as
/// native timestamps.
pub fn demo_alerts() -> Vec<Fields> {
    let seeds = [
        ("High blood pressure detected", "critical", "2025-07-29T08:30:00Z"),
        ("Heart rate dropped below 40 BPM", "critical", "2025-07-29T09:15:00Z"),
        ("Oxygen saturation warning", "warning", "2025-07-28T15:40:00Z"),
        ("Routine glucose test available", "info", "2025-07-27T10:00:00Z"),
        ("Blood sample not received", "warning", "2025-07-26T12:25:00Z"),
    ];
    seeds
        .iter()
        .filter_map(|(title, status, timestamp)| {
            let at: DateTime<Utc> = timestamp.parse().ok()?;
            json!({ "title": title, "status": status, "timestamp": timestamp_value(at) })
                .as_object()
                .cloned()
        })
        .collect()
}

/// Write the demo alerts. Development only.
pub async fn seed_alerts(store: &dyn DocumentStore) -> Result<usize> {
    let mut written = 0;
    for alert in demo_alerts() {
        store.add(ALERTS_COLLECTION, alert).await?;
        written += 1;
    }
    info!("Seeded {} alerts", written);
    Ok(written)
}
