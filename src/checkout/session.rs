use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::config::Secret;
use crate::domain::CheckoutState;
use crate::error::Result;

/// Per-checkout state retained between the redirect and the follow-up query.
///
/// The merchant id, reference and key recorded here are the trusted side of
/// callback validation; the callback itself is never allowed to supply them.
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    pub paygate_id: String,
    pub reference: String,
    pub secret: Secret,
    /// Gateway-issued id, captured at initiate and refreshed from the
    /// verified callback
    pub pay_request_id: Option<String>,
    /// Amount in minor units, kept for the audit record
    pub amount: i64,
    pub currency: String,
    pub state: CheckoutState,
    pub created_at: DateTime<Utc>,
}

/// Durable association of in-flight checkouts with customer sessions.
/// The host storefront owns the real implementation.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn put(&self, session_id: &str, session: CheckoutSession) -> Result<()>;

    async fn get(&self, session_id: &str) -> Result<Option<CheckoutSession>>;

    async fn remove(&self, session_id: &str) -> Result<Option<CheckoutSession>>;
}

/// In-memory session store for tests and the CLI.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: DashMap<String, CheckoutSession>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn put(&self, session_id: &str, session: CheckoutSession) -> Result<()> {
        self.sessions.insert(session_id.to_string(), session);
        Ok(())
    }

    async fn get(&self, session_id: &str) -> Result<Option<CheckoutSession>> {
        Ok(self.sessions.get(session_id).map(|s| s.value().clone()))
    }

    async fn remove(&self, session_id: &str) -> Result<Option<CheckoutSession>> {
        Ok(self.sessions.remove(session_id).map(|(_, s)| s))
    }
}
