use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{PaywebError, Result};
use crate::protocol::{names, FieldSet};

/// Final outcome of a transaction as reported by the gateway.
///
/// Status codes other than 1/2/4 are reported uniformly as `Unknown` and
/// treated as an error condition by the checkout flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionStatus {
    Approved,
    Declined,
    Cancelled,
    Unknown,
}

impl TransactionStatus {
    /// Map the numeric `TRANSACTION_STATUS` code from the gateway.
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "1" => TransactionStatus::Approved,
            "2" => TransactionStatus::Declined,
            "4" => TransactionStatus::Cancelled,
            _ => TransactionStatus::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Approved => "Approved",
            TransactionStatus::Declined => "Declined",
            TransactionStatus::Cancelled => "Cancelled",
            TransactionStatus::Unknown => "Unknown",
        }
    }

    /// Only an approved transaction may continue to order finalization.
    pub fn allows_finalization(&self) -> bool {
        matches!(self, TransactionStatus::Approved)
    }

    /// Status-specific text to show the customer.
    pub fn customer_message(&self) -> &'static str {
        match self {
            TransactionStatus::Approved => "Transaction approved",
            TransactionStatus::Declined => "Transaction has been declined",
            TransactionStatus::Cancelled => "User cancelled transaction",
            TransactionStatus::Unknown => "Unknown error",
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Order data handed in by the host storefront when checkout begins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutOrder {
    /// Order total in major currency units
    pub total: Decimal,
    /// ISO-4217 currency code
    pub currency: String,
    /// Customer country, ISO-3166 alpha-3
    pub country: String,
    /// Customer email address
    pub email: String,
}

impl CheckoutOrder {
    /// Convert the major-unit total into integer minor units (cents), with
    /// truncation past two decimals.
    pub fn amount_minor(&self) -> Result<i64> {
        let minor = (self.total * Decimal::from(100)).trunc();
        let minor = minor
            .to_i64()
            .ok_or_else(|| PaywebError::Validation(format!("amount out of range: {}", self.total)))?;
        if minor <= 0 {
            return Err(PaywebError::Validation(format!(
                "amount must be positive: {}",
                self.total
            )));
        }
        Ok(minor)
    }
}

/// A single transaction attempt, immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub paygate_id: String,
    /// Merchant reference, globally unique per attempt
    pub reference: String,
    /// Amount in integer minor units
    pub amount: i64,
    pub currency: String,
    pub return_url: String,
    pub transaction_date: DateTime<Utc>,
    pub locale: String,
    pub country: String,
    pub email: String,
}

impl TransactionRequest {
    /// Build a request for one checkout attempt with a freshly generated
    /// reference and the current UTC time.
    pub fn new(
        paygate_id: impl Into<String>,
        return_url: impl Into<String>,
        locale: impl Into<String>,
        order: &CheckoutOrder,
    ) -> Result<Self> {
        Ok(Self {
            paygate_id: paygate_id.into(),
            reference: Uuid::new_v4().to_string(),
            amount: order.amount_minor()?,
            currency: order.currency.clone(),
            return_url: return_url.into(),
            transaction_date: Utc::now(),
            locale: locale.into(),
            country: order.country.clone(),
            email: order.email.clone(),
        })
    }

    /// Render the nine initiate fields in the order the gateway signs them.
    pub fn to_field_set(&self) -> FieldSet {
        FieldSet::new()
            .with(names::PAYGATE_ID, &self.paygate_id)
            .with(names::REFERENCE, &self.reference)
            .with(names::AMOUNT, self.amount.to_string())
            .with(names::CURRENCY, &self.currency)
            .with(names::RETURN_URL, &self.return_url)
            .with(
                names::TRANSACTION_DATE,
                self.transaction_date.format("%Y-%m-%d %H:%M").to_string(),
            )
            .with(names::LOCALE, &self.locale)
            .with(names::COUNTRY, &self.country)
            .with(names::EMAIL, &self.email)
    }
}

/// The payload the customer's browser forwards to the gateway process page.
/// Carries exactly the gateway-issued pay request id and checksum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectForm {
    pub process_url: String,
    pub pay_request_id: String,
    pub checksum: String,
}

impl RedirectForm {
    pub fn fields(&self) -> FieldSet {
        FieldSet::new()
            .with(names::PAY_REQUEST_ID, &self.pay_request_id)
            .with(names::CHECKSUM, &self.checksum)
    }
}

/// Result of handling the gateway's process callback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outcome {
    pub status: TransactionStatus,
    pub reference: String,
    pub pay_request_id: String,
    /// Amount in minor units, echoed from the session for the ledger
    pub amount: i64,
    pub currency: String,
}

impl Outcome {
    pub fn allows_finalization(&self) -> bool {
        self.status.allows_finalization()
    }

    pub fn customer_message(&self) -> &'static str {
        self.status.customer_message()
    }
}

/// Result of the merchant-initiated follow-up query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryOutcome {
    /// The full field report, in the order received, when the query succeeded
    pub report: Option<FieldSet>,
    /// Gateway error code recorded as an auditable anomaly
    pub anomaly: Option<String>,
}

impl QueryOutcome {
    pub fn is_anomalous(&self) -> bool {
        self.anomaly.is_some()
    }

    pub fn audit_report(&self) -> Option<String> {
        self.report.as_ref().map(FieldSet::audit_report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn order(total: Decimal) -> CheckoutOrder {
        CheckoutOrder {
            total,
            currency: "ZAR".to_string(),
            country: "ZAF".to_string(),
            email: "a@b.com".to_string(),
        }
    }

    #[test]
    fn status_code_mapping() {
        assert_eq!(TransactionStatus::from_code("1"), TransactionStatus::Approved);
        assert_eq!(TransactionStatus::from_code("2"), TransactionStatus::Declined);
        assert_eq!(TransactionStatus::from_code("4"), TransactionStatus::Cancelled);
        assert_eq!(TransactionStatus::from_code("3"), TransactionStatus::Unknown);
        assert_eq!(TransactionStatus::from_code("0"), TransactionStatus::Unknown);
        assert_eq!(TransactionStatus::from_code("99"), TransactionStatus::Unknown);
        assert_eq!(TransactionStatus::from_code(""), TransactionStatus::Unknown);
        assert_eq!(TransactionStatus::from_code("abc"), TransactionStatus::Unknown);
    }

    #[test]
    fn only_approved_allows_finalization() {
        assert!(TransactionStatus::Approved.allows_finalization());
        assert!(!TransactionStatus::Declined.allows_finalization());
        assert!(!TransactionStatus::Cancelled.allows_finalization());
        assert!(!TransactionStatus::Unknown.allows_finalization());
    }

    #[test]
    fn customer_messages_are_distinct() {
        let statuses = [
            TransactionStatus::Approved,
            TransactionStatus::Declined,
            TransactionStatus::Cancelled,
            TransactionStatus::Unknown,
        ];
        for a in &statuses {
            for b in &statuses {
                if a != b {
                    assert_ne!(a.customer_message(), b.customer_message());
                }
            }
        }
    }

    #[test]
    fn amount_converts_to_minor_units_with_truncation() {
        assert_eq!(order(dec!(100.00)).amount_minor().unwrap(), 10000);
        assert_eq!(order(dec!(99.999)).amount_minor().unwrap(), 9999);
        assert_eq!(order(dec!(0.01)).amount_minor().unwrap(), 1);
    }

    #[test]
    fn non_positive_amounts_are_rejected() {
        assert!(order(dec!(0)).amount_minor().is_err());
        assert!(order(dec!(-5)).amount_minor().is_err());
    }

    #[test]
    fn initiate_fields_are_rendered_in_protocol_order() {
        let request = TransactionRequest::new(
            "10011072130",
            "https://shop.example/return",
            "en-za",
            &order(dec!(100)),
        )
        .unwrap();

        let fields = request.to_field_set();
        let rendered: Vec<&str> = fields.iter().map(|(n, _)| n).collect();
        assert_eq!(
            rendered,
            vec![
                "PAYGATE_ID",
                "REFERENCE",
                "AMOUNT",
                "CURRENCY",
                "RETURN_URL",
                "TRANSACTION_DATE",
                "LOCALE",
                "COUNTRY",
                "EMAIL",
            ]
        );
        assert_eq!(fields.get("AMOUNT"), Some("10000"));
    }

    #[test]
    fn transaction_date_is_minute_precision() {
        let request = TransactionRequest::new(
            "10011072130",
            "https://shop.example/return",
            "en-za",
            &order(dec!(1)),
        )
        .unwrap();
        let fields = request.to_field_set();
        let date = fields.get("TRANSACTION_DATE").unwrap();
        // e.g. "2024-01-01 10:00" -- no seconds component
        assert_eq!(date.len(), 16);
    }

    #[test]
    fn references_are_unique_per_attempt() {
        let o = order(dec!(1));
        let a = TransactionRequest::new("id", "https://r.example", "en-za", &o).unwrap();
        let b = TransactionRequest::new("id", "https://r.example", "en-za", &o).unwrap();
        assert_ne!(a.reference, b.reference);
        assert!(Uuid::parse_str(&a.reference).is_ok());
    }

    #[test]
    fn redirect_form_carries_exactly_two_fields() {
        let form = RedirectForm {
            process_url: "https://gw.example/process".to_string(),
            pay_request_id: "X1".to_string(),
            checksum: "abc".to_string(),
        };
        let fields = form.fields();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields.get("PAY_REQUEST_ID"), Some("X1"));
        assert_eq!(fields.get("CHECKSUM"), Some("abc"));
    }
}
