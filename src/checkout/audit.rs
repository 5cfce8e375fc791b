use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::TransactionStatus;
use crate::error::Result;

/// Record appended to the host's order ledger once a transaction outcome is
/// known. `report` is the gateway's full field report (or the anomaly text)
/// with pairs in the order received.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub reference: String,
    pub pay_request_id: String,
    pub status: TransactionStatus,
    /// Amount in minor units
    pub amount: i64,
    pub currency: String,
    pub report: String,
    pub recorded_at: DateTime<Utc>,
}

/// Receives audit records; the storefront's order history is the real
/// implementation.
#[async_trait]
pub trait OrderLedger: Send + Sync {
    async fn append(&self, record: AuditRecord) -> Result<()>;
}

/// Receives a human-readable outcome summary for operator notification.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, summary: &str) -> Result<()>;
}

/// Ledger that writes records to the log. Useful for the CLI and tests.
#[derive(Debug, Default)]
pub struct LogLedger;

#[async_trait]
impl OrderLedger for LogLedger {
    async fn append(&self, record: AuditRecord) -> Result<()> {
        match serde_json::to_string(&record) {
            Ok(json) => info!(record = %json, "audit record"),
            Err(err) => info!(
                reference = %record.reference,
                error = %err,
                "audit record (not serializable)"
            ),
        }
        Ok(())
    }
}

/// Notifier that writes summaries to the log.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, summary: &str) -> Result<()> {
        info!(%summary, "outcome notification");
        Ok(())
    }
}
