use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::{GatewayConfig, Secret};
use crate::error::{PaywebError, Result};
use crate::gateway::traits::GatewayApi;
use crate::protocol::{names, ChecksumCodec, FieldSet};

/// HTTP client for the gateway's initiate and query endpoints.
pub struct HttpGatewayClient {
    http: reqwest::Client,
    initiate_url: String,
    query_url: String,
    codec: ChecksumCodec,
    debug: bool,
}

impl HttpGatewayClient {
    /// Build a client from gateway configuration.
    ///
    /// Certificate verification is on unless the config explicitly opts out
    /// for legacy/test gateways; the opt-out is logged loudly.
    pub fn new(config: &GatewayConfig, debug: bool) -> Result<Self> {
        let mut builder =
            reqwest::Client::builder().timeout(Duration::from_millis(config.request_timeout_ms));

        if config.danger_accept_invalid_certs {
            warn!("gateway TLS certificate verification is DISABLED (legacy/test mode)");
            builder = builder.danger_accept_invalid_certs(true);
        }

        Ok(Self {
            http: builder.build()?,
            initiate_url: config.initiate_url.clone(),
            query_url: config.query_url.clone(),
            codec: ChecksumCodec::with_debug(debug),
            debug,
        })
    }

    /// Append the checksum computed over the request fields.
    fn signed_request(&self, request: &FieldSet, secret: &Secret) -> FieldSet {
        let checksum = self.codec.compute(request, secret);
        request.clone().with(names::CHECKSUM, checksum)
    }

    async fn post_form(&self, url: &str, fields: &FieldSet) -> Result<FieldSet> {
        let body = fields.to_form_encoded();
        if self.debug {
            debug!(%url, %body, "posting to gateway");
        }

        let response = self
            .http
            .post(url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await?
            .error_for_status()?;

        let raw = response.text().await?;
        if self.debug {
            debug!(raw = %raw, "gateway response");
        }

        interpret_response(&raw)
    }
}

#[async_trait]
impl GatewayApi for HttpGatewayClient {
    async fn initiate(&self, request: &FieldSet, secret: &Secret) -> Result<FieldSet> {
        let signed = self.signed_request(request, secret);
        self.post_form(&self.initiate_url, &signed).await
    }

    async fn query(&self, request: &FieldSet, secret: &Secret) -> Result<FieldSet> {
        let signed = self.signed_request(request, secret);
        self.post_form(&self.query_url, &signed).await
    }
}

/// Translate a raw response body into a field set.
///
/// No bytes at all is a transport failure; a present `ERROR` field is a
/// gateway error and ends interpretation.
fn interpret_response(raw: &str) -> Result<FieldSet> {
    if raw.is_empty() {
        return Err(PaywebError::EmptyGatewayResponse);
    }

    let fields = FieldSet::from_form_encoded(raw);
    if let Some(code) = fields.get(names::ERROR) {
        return Err(PaywebError::Gateway {
            code: code.to_string(),
        });
    }

    Ok(fields)
}
