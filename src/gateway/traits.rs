use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use crate::config::Secret;
use crate::error::Result;
use crate::protocol::FieldSet;

/// The two outbound exchanges of the hosted-redirect protocol.
///
/// Implementations sign the outgoing field set with the shared key, perform
/// the POST and hand back the parsed response fields. A gateway-level
/// `ERROR` response surfaces as `PaywebError::Gateway`; transport failures
/// (including timeouts and empty bodies) surface as the transport class.
/// Neither call is retried here; retry policy belongs to the caller, and
/// repeating a call with the same reference addresses the same gateway-side
/// transaction record.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait GatewayApi: Send + Sync {
    /// Open a transaction; returns the pay request id and checksum needed
    /// for the customer redirect.
    async fn initiate(&self, request: &FieldSet, secret: &Secret) -> Result<FieldSet>;

    /// Re-confirm a transaction's final outcome independently of the
    /// process callback.
    async fn query(&self, request: &FieldSet, secret: &Secret) -> Result<FieldSet>;
}
