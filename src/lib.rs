pub mod checkout;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod gateway;
pub mod protocol;

pub use checkout::{
    AuditRecord, CheckoutSession, InMemorySessionStore, LogLedger, LogNotifier, Notifier,
    OrderLedger, SessionStore, TransactionOrchestrator,
};
pub use config::{AppConfig, Secret};
pub use domain::{
    CheckoutOrder, CheckoutState, Outcome, QueryOutcome, RedirectForm, TransactionRequest,
    TransactionStatus,
};
pub use error::{PaywebError, Result};
pub use gateway::{GatewayApi, HttpGatewayClient};
pub use protocol::{ChecksumCodec, FieldSet};
