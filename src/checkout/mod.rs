mod audit;
mod orchestrator;
mod session;

pub use audit::{AuditRecord, LogLedger, LogNotifier, Notifier, OrderLedger};
pub use orchestrator::TransactionOrchestrator;
pub use session::{CheckoutSession, InMemorySessionStore, SessionStore};
