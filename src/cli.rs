//! Operator CLI commands: checksum diagnostics, a live initiate and a
//! follow-up query against the configured gateway.

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::checkout::{InMemorySessionStore, LogLedger, LogNotifier, TransactionOrchestrator};
use crate::config::AppConfig;
use crate::domain::CheckoutOrder;
use crate::error::{describe_gateway_code, PaywebError, Result};
use crate::gateway::{GatewayApi, HttpGatewayClient};
use crate::protocol::{names, ChecksumCodec, FieldSet};

#[derive(Parser)]
#[command(name = "payweb", about = "Hosted-redirect payment gateway client")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration directory
    #[arg(long, default_value = "config", global = true)]
    pub config_dir: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compute the checksum over ordered NAME=VALUE fields with the configured key
    Checksum {
        /// Fields in transmission order, e.g. PAYGATE_ID=... REFERENCE=...
        #[arg(required = true)]
        fields: Vec<String>,
    },
    /// Open a transaction with the gateway and print the redirect payload
    Initiate {
        /// Order total in major currency units
        #[arg(long)]
        amount: Decimal,
        /// ISO-4217 currency code
        #[arg(long, default_value = "ZAR")]
        currency: String,
        /// Customer country, ISO-3166 alpha-3
        #[arg(long, default_value = "ZAF")]
        country: String,
        /// Customer email address
        #[arg(long)]
        email: String,
    },
    /// Re-query a transaction's final outcome
    Query {
        /// Gateway-issued pay request id
        #[arg(long)]
        pay_request_id: String,
        /// Merchant reference used at initiate
        #[arg(long)]
        reference: String,
    },
}

/// Parse ordered NAME=VALUE arguments into a FieldSet.
fn parse_fields(args: &[String]) -> Result<FieldSet> {
    let mut fields = FieldSet::new();
    for arg in args {
        let (name, value) = arg.split_once('=').ok_or_else(|| {
            PaywebError::Validation(format!("expected NAME=VALUE, got '{arg}'"))
        })?;
        fields.insert(name, value);
    }
    Ok(fields)
}

pub fn compute_checksum(config: &AppConfig, raw_fields: &[String]) -> Result<()> {
    let fields = parse_fields(raw_fields)?;
    let codec = ChecksumCodec::with_debug(config.merchant.debug);
    let checksum = codec.compute(&fields, &config.merchant.encryption_key);
    println!("{checksum}");
    Ok(())
}

pub async fn run_initiate(
    config: &AppConfig,
    amount: Decimal,
    currency: &str,
    country: &str,
    email: &str,
) -> Result<()> {
    let gateway = HttpGatewayClient::new(&config.gateway, config.merchant.debug)?;
    let orchestrator = TransactionOrchestrator::new(
        config.merchant.clone(),
        config.gateway.process_url.clone(),
        Arc::new(gateway),
        Arc::new(InMemorySessionStore::new()),
        Arc::new(LogLedger),
    )
    .with_notifier(Arc::new(LogNotifier));

    let order = CheckoutOrder {
        total: amount,
        currency: currency.to_string(),
        country: country.to_string(),
        email: email.to_string(),
    };

    let form = orchestrator.begin_checkout("cli", &order).await?;

    println!("Process URL: {}", form.process_url);
    for (name, value) in form.fields().iter() {
        println!("{name}={value}");
    }
    Ok(())
}

pub async fn run_query(config: &AppConfig, pay_request_id: &str, reference: &str) -> Result<()> {
    let gateway = HttpGatewayClient::new(&config.gateway, config.merchant.debug)?;

    let request = FieldSet::new()
        .with(names::PAYGATE_ID, &config.merchant.paygate_id)
        .with(names::PAY_REQUEST_ID, pay_request_id)
        .with(names::REFERENCE, reference);

    match gateway.query(&request, &config.merchant.encryption_key).await {
        Ok(report) => {
            print!("{}", report.audit_report());
            Ok(())
        }
        Err(PaywebError::Gateway { code }) => {
            match describe_gateway_code(&code) {
                Some(detail) => eprintln!("Gateway error {code}: {detail}"),
                None => eprintln!("Gateway error {code}"),
            }
            Err(PaywebError::Gateway { code })
        }
        Err(err) => Err(err),
    }
}
