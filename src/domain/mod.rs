mod state;
mod transaction;

pub use state::CheckoutState;
pub use transaction::{
    CheckoutOrder, Outcome, QueryOutcome, RedirectForm, TransactionRequest, TransactionStatus,
};
