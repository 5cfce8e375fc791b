use serde::{Deserialize, Serialize};
use std::fmt;

use super::transaction::TransactionStatus;

/// Checkout lifecycle states.
///
/// A checkout normally walks `Created -> Initiated -> AwaitingCallback ->
/// Decided -> Confirmed`; `Errored` is reachable from any live state. Once
/// decided, the status never changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CheckoutState {
    /// Transaction request built, not yet sent
    Created,
    /// Gateway accepted the initiate request
    Initiated,
    /// Customer redirected, waiting for the process callback
    AwaitingCallback,
    /// Callback verified, outcome fixed
    Decided(TransactionStatus),
    /// Outcome re-confirmed by the follow-up query
    Confirmed,
    /// Aborted by a transport, gateway, integrity or state failure
    Errored,
}

impl CheckoutState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutState::Created => "CREATED",
            CheckoutState::Initiated => "INITIATED",
            CheckoutState::AwaitingCallback => "AWAITING_CALLBACK",
            CheckoutState::Decided(TransactionStatus::Approved) => "DECIDED_APPROVED",
            CheckoutState::Decided(TransactionStatus::Declined) => "DECIDED_DECLINED",
            CheckoutState::Decided(TransactionStatus::Cancelled) => "DECIDED_CANCELLED",
            CheckoutState::Decided(TransactionStatus::Unknown) => "DECIDED_UNKNOWN",
            CheckoutState::Confirmed => "CONFIRMED",
            CheckoutState::Errored => "ERRORED",
        }
    }

    /// Check if this state can transition to another state
    pub fn can_transition_to(&self, target: CheckoutState) -> bool {
        use CheckoutState::*;

        match (self, target) {
            // Normal forward path
            (Created, Initiated) => true,
            (Initiated, AwaitingCallback) => true,
            (AwaitingCallback, Decided(_)) => true,
            // Only an approved decision is ever confirmed
            (Decided(TransactionStatus::Approved), Confirmed) => true,

            // Any live state can fail
            (Created, Errored) => true,
            (Initiated, Errored) => true,
            (AwaitingCallback, Errored) => true,
            (Decided(_), Errored) => true,

            // All other transitions are invalid
            _ => false,
        }
    }

    /// Has the transaction outcome been fixed?
    pub fn is_decided(&self) -> bool {
        matches!(self, CheckoutState::Decided(_) | CheckoutState::Confirmed)
    }

    pub fn decided_status(&self) -> Option<TransactionStatus> {
        match self {
            CheckoutState::Decided(status) => Some(*status),
            _ => None,
        }
    }

    /// Is this a terminal state for the checkout attempt?
    pub fn is_terminal(&self) -> bool {
        matches!(self, CheckoutState::Confirmed | CheckoutState::Errored)
    }
}

impl fmt::Display for CheckoutState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for CheckoutState {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s.to_uppercase().as_str() {
            "CREATED" => Ok(CheckoutState::Created),
            "INITIATED" => Ok(CheckoutState::Initiated),
            "AWAITING_CALLBACK" => Ok(CheckoutState::AwaitingCallback),
            "DECIDED_APPROVED" => Ok(CheckoutState::Decided(TransactionStatus::Approved)),
            "DECIDED_DECLINED" => Ok(CheckoutState::Decided(TransactionStatus::Declined)),
            "DECIDED_CANCELLED" => Ok(CheckoutState::Decided(TransactionStatus::Cancelled)),
            "DECIDED_UNKNOWN" => Ok(CheckoutState::Decided(TransactionStatus::Unknown)),
            "CONFIRMED" => Ok(CheckoutState::Confirmed),
            "ERRORED" => Ok(CheckoutState::Errored),
            _ => Err(format!("Unknown state: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_transitions() {
        use CheckoutState::*;

        assert!(Created.can_transition_to(Initiated));
        assert!(Initiated.can_transition_to(AwaitingCallback));
        assert!(AwaitingCallback.can_transition_to(Decided(TransactionStatus::Approved)));
        assert!(AwaitingCallback.can_transition_to(Decided(TransactionStatus::Declined)));
        assert!(Decided(TransactionStatus::Approved).can_transition_to(Confirmed));
    }

    #[test]
    fn test_invalid_transitions() {
        use CheckoutState::*;

        assert!(!Created.can_transition_to(AwaitingCallback));
        assert!(!Created.can_transition_to(Confirmed));
        assert!(!Initiated.can_transition_to(Decided(TransactionStatus::Approved)));
        assert!(!Decided(TransactionStatus::Declined).can_transition_to(Confirmed));
        assert!(!Decided(TransactionStatus::Cancelled).can_transition_to(Confirmed));
        assert!(!Confirmed.can_transition_to(Errored));
        assert!(!Errored.can_transition_to(Created));
        // A decision is final
        assert!(!Decided(TransactionStatus::Approved)
            .can_transition_to(Decided(TransactionStatus::Declined)));
    }

    #[test]
    fn errored_is_reachable_from_all_live_states() {
        use CheckoutState::*;

        for state in [
            Created,
            Initiated,
            AwaitingCallback,
            Decided(TransactionStatus::Approved),
            Decided(TransactionStatus::Unknown),
        ] {
            assert!(state.can_transition_to(Errored), "{state} cannot error");
        }
    }

    #[test]
    fn test_state_from_str() {
        assert_eq!(
            CheckoutState::try_from("CREATED").unwrap(),
            CheckoutState::Created
        );
        assert_eq!(
            CheckoutState::try_from("decided_approved").unwrap(),
            CheckoutState::Decided(TransactionStatus::Approved)
        );
        assert!(CheckoutState::try_from("INVALID").is_err());
    }

    #[test]
    fn round_trip_through_as_str() {
        use CheckoutState::*;

        for state in [
            Created,
            Initiated,
            AwaitingCallback,
            Decided(TransactionStatus::Approved),
            Decided(TransactionStatus::Declined),
            Decided(TransactionStatus::Cancelled),
            Decided(TransactionStatus::Unknown),
            Confirmed,
            Errored,
        ] {
            assert_eq!(CheckoutState::try_from(state.as_str()).unwrap(), state);
        }
    }

    #[test]
    fn terminal_states() {
        assert!(CheckoutState::Confirmed.is_terminal());
        assert!(CheckoutState::Errored.is_terminal());
        assert!(!CheckoutState::Decided(TransactionStatus::Approved).is_terminal());
        assert!(!CheckoutState::AwaitingCallback.is_terminal());
    }
}
