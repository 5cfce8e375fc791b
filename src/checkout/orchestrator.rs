use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};

use crate::checkout::audit::{AuditRecord, Notifier, OrderLedger};
use crate::checkout::session::{CheckoutSession, SessionStore};
use crate::config::MerchantConfig;
use crate::domain::{
    CheckoutOrder, CheckoutState, Outcome, QueryOutcome, RedirectForm, TransactionRequest,
    TransactionStatus,
};
use crate::error::{describe_gateway_code, PaywebError, Result};
use crate::gateway::GatewayApi;
use crate::protocol::{names, ChecksumCodec, FieldSet};

/// Drives a checkout attempt through the three gateway phases.
///
/// One orchestrator serves any number of concurrent checkouts; per-attempt
/// state lives in the session store, keyed by an opaque session id the host
/// supplies.
pub struct TransactionOrchestrator {
    gateway: Arc<dyn GatewayApi>,
    sessions: Arc<dyn SessionStore>,
    ledger: Arc<dyn OrderLedger>,
    notifier: Option<Arc<dyn Notifier>>,
    codec: ChecksumCodec,
    merchant: MerchantConfig,
    process_url: String,
}

impl TransactionOrchestrator {
    pub fn new(
        merchant: MerchantConfig,
        process_url: impl Into<String>,
        gateway: Arc<dyn GatewayApi>,
        sessions: Arc<dyn SessionStore>,
        ledger: Arc<dyn OrderLedger>,
    ) -> Self {
        let codec = ChecksumCodec::with_debug(merchant.debug);
        Self {
            gateway,
            sessions,
            ledger,
            notifier: None,
            codec,
            merchant,
            process_url: process_url.into(),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Initiate phase: build the transaction request, open it with the
    /// gateway and hand back the redirect payload for the customer's
    /// browser. Nothing is redirected if any step fails.
    pub async fn begin_checkout(
        &self,
        session_id: &str,
        order: &CheckoutOrder,
    ) -> Result<RedirectForm> {
        if !self.merchant.enabled {
            return Err(PaywebError::Validation(
                "payment method is disabled".to_string(),
            ));
        }

        let request = TransactionRequest::new(
            &self.merchant.paygate_id,
            &self.merchant.return_url,
            &self.merchant.locale,
            order,
        )?;

        let mut session = CheckoutSession {
            paygate_id: request.paygate_id.clone(),
            reference: request.reference.clone(),
            secret: self.merchant.encryption_key.clone(),
            pay_request_id: None,
            amount: request.amount,
            currency: request.currency.clone(),
            state: CheckoutState::Created,
            created_at: Utc::now(),
        };
        self.sessions.put(session_id, session.clone()).await?;

        let response = match self
            .gateway
            .initiate(&request.to_field_set(), &session.secret)
            .await
        {
            Ok(response) => response,
            Err(err) => {
                self.mark_errored(session_id, &mut session).await;
                return Err(err);
            }
        };

        if !self.codec.verify(&response, &session.secret) {
            self.mark_errored(session_id, &mut session).await;
            return Err(PaywebError::Integrity(
                "initiate response checksum mismatch".to_string(),
            ));
        }

        let (pay_request_id, checksum) = match (
            response.get(names::PAY_REQUEST_ID),
            response.get(names::CHECKSUM),
        ) {
            (Some(id), Some(checksum)) => (id.to_string(), checksum.to_string()),
            _ => {
                self.mark_errored(session_id, &mut session).await;
                return Err(PaywebError::ProtocolState(
                    "initiate response is missing PAY_REQUEST_ID".to_string(),
                ));
            }
        };

        session.pay_request_id = Some(pay_request_id.clone());
        self.transition(session_id, &mut session, CheckoutState::Initiated)
            .await?;
        self.transition(session_id, &mut session, CheckoutState::AwaitingCallback)
            .await?;

        info!(
            reference = %session.reference,
            %pay_request_id,
            "checkout initiated; customer can be redirected"
        );

        Ok(RedirectForm {
            process_url: self.process_url.clone(),
            pay_request_id,
            checksum,
        })
    }

    /// Process phase: validate the gateway's callback and fix the outcome.
    ///
    /// The merchant id and reference are taken from the trusted session, so
    /// a forged callback cannot supply its own; the status, pay request id
    /// and checksum come from the post. A checksum failure invalidates the
    /// whole payload, whatever status it claims.
    pub async fn handle_callback(&self, session_id: &str, posted: &FieldSet) -> Result<Outcome> {
        let mut session = self
            .sessions
            .get(session_id)
            .await?
            .ok_or_else(|| {
                PaywebError::ProtocolState("no checkout session for callback".to_string())
            })?;

        if session.state != CheckoutState::AwaitingCallback {
            return Err(PaywebError::ProtocolState(format!(
                "callback received in state {}",
                session.state
            )));
        }

        let mut signed = FieldSet::new()
            .with(names::PAYGATE_ID, &session.paygate_id)
            .with(
                names::PAY_REQUEST_ID,
                posted.get(names::PAY_REQUEST_ID).unwrap_or(""),
            )
            .with(
                names::TRANSACTION_STATUS,
                posted.get(names::TRANSACTION_STATUS).unwrap_or(""),
            )
            .with(names::REFERENCE, &session.reference);
        if let Some(checksum) = posted.get(names::CHECKSUM) {
            signed.insert(names::CHECKSUM, checksum);
        }

        if !self.codec.verify(&signed, &session.secret) {
            self.mark_errored(session_id, &mut session).await;
            return Err(PaywebError::Integrity(
                "process callback checksum mismatch".to_string(),
            ));
        }

        let status =
            TransactionStatus::from_code(signed.get(names::TRANSACTION_STATUS).unwrap_or(""));
        let pay_request_id = signed
            .get(names::PAY_REQUEST_ID)
            .unwrap_or("")
            .to_string();

        session.pay_request_id = Some(pay_request_id.clone());
        self.transition(session_id, &mut session, CheckoutState::Decided(status))
            .await?;

        info!(
            reference = %session.reference,
            %status,
            "process callback verified"
        );

        Ok(Outcome {
            status,
            reference: session.reference.clone(),
            pay_request_id,
            amount: session.amount,
            currency: session.currency.clone(),
        })
    }

    /// Query phase: obtain the gateway's authoritative record of the
    /// transaction and append it to the audit ledger.
    ///
    /// A gateway error here is recorded as an anomaly and returned in the
    /// outcome; it never reverses a decision already made. Transport errors
    /// propagate so the caller can decide whether to retry.
    pub async fn confirm_final(&self, session_id: &str) -> Result<QueryOutcome> {
        let mut session = self
            .sessions
            .get(session_id)
            .await?
            .ok_or_else(|| {
                PaywebError::ProtocolState("no checkout session for query".to_string())
            })?;

        let Some(status) = session.state.decided_status() else {
            return Err(PaywebError::ProtocolState(format!(
                "query attempted in state {}",
                session.state
            )));
        };

        let Some(pay_request_id) = session.pay_request_id.clone() else {
            return Err(PaywebError::ProtocolState(
                "no pay request id recorded for query".to_string(),
            ));
        };

        let request = FieldSet::new()
            .with(names::PAYGATE_ID, &session.paygate_id)
            .with(names::PAY_REQUEST_ID, &pay_request_id)
            .with(names::REFERENCE, &session.reference);

        match self.gateway.query(&request, &session.secret).await {
            Ok(report) => {
                self.ledger
                    .append(AuditRecord {
                        reference: session.reference.clone(),
                        pay_request_id: pay_request_id.clone(),
                        status,
                        amount: session.amount,
                        currency: session.currency.clone(),
                        report: report.audit_report(),
                        recorded_at: Utc::now(),
                    })
                    .await?;

                self.notify(&session, status).await;

                if status == TransactionStatus::Approved {
                    self.transition(session_id, &mut session, CheckoutState::Confirmed)
                        .await?;
                }

                Ok(QueryOutcome {
                    report: Some(report),
                    anomaly: None,
                })
            }
            Err(PaywebError::Gateway { code }) => {
                warn!(
                    %code,
                    reference = %session.reference,
                    "query returned a gateway error; recording as anomaly"
                );

                let detail =
                    describe_gateway_code(&code).unwrap_or("unrecognized gateway error code");
                self.ledger
                    .append(AuditRecord {
                        reference: session.reference.clone(),
                        pay_request_id,
                        status,
                        amount: session.amount,
                        currency: session.currency.clone(),
                        report: format!("Query anomaly {code}: {detail}"),
                        recorded_at: Utc::now(),
                    })
                    .await?;

                Ok(QueryOutcome {
                    report: None,
                    anomaly: Some(code),
                })
            }
            Err(err) => Err(err),
        }
    }

    async fn notify(&self, session: &CheckoutSession, status: TransactionStatus) {
        let Some(notifier) = &self.notifier else {
            return;
        };
        let summary = format_summary(status, &session.reference, session.amount, &session.currency);
        if let Err(err) = notifier.notify(&summary).await {
            warn!(error = %err, "outcome notification failed");
        }
    }

    async fn transition(
        &self,
        session_id: &str,
        session: &mut CheckoutSession,
        to: CheckoutState,
    ) -> Result<()> {
        if !session.state.can_transition_to(to) {
            return Err(PaywebError::InvalidStateTransition {
                from: session.state.to_string(),
                to: to.to_string(),
            });
        }
        info!(
            session = session_id,
            reference = %session.reference,
            from = %session.state,
            to = %to,
            "checkout state transition"
        );
        session.state = to;
        self.sessions.put(session_id, session.clone()).await
    }

    /// Best-effort move to `Errored`; the original failure is what the
    /// caller sees, so persistence problems here are only logged.
    async fn mark_errored(&self, session_id: &str, session: &mut CheckoutSession) {
        if !session.state.can_transition_to(CheckoutState::Errored) {
            return;
        }
        session.state = CheckoutState::Errored;
        if let Err(err) = self.sessions.put(session_id, session.clone()).await {
            warn!(error = %err, "failed to persist errored checkout state");
        }
    }
}

/// Operator-facing outcome summary, amount rendered back in major units.
fn format_summary(
    status: TransactionStatus,
    reference: &str,
    amount: i64,
    currency: &str,
) -> String {
    let major = Decimal::from(amount) / Decimal::from(100);
    format!(
        "Order has been {}\nPayment reference: {}\nProcessed amount: {:.2} {}",
        status.as_str(),
        reference,
        major,
        currency
    )
}
