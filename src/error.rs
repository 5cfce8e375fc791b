use thiserror::Error;

/// Main error type for the gateway client
#[derive(Error, Debug)]
pub enum PaywebError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // Transport errors (network, TLS, timeout)
    #[error("HTTP request error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Gateway returned an empty response body")]
    EmptyGatewayResponse,

    // Gateway-level errors (explicit ERROR field in a response)
    #[error("Gateway error: {code}")]
    Gateway { code: String },

    // Integrity errors (checksum verification failure on inbound data)
    #[error("Checksum verification failed: {0}")]
    Integrity(String),

    // Protocol state errors
    #[error("Protocol state error: {0}")]
    ProtocolState(String),

    #[error("Invalid state transition: from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    // Validation errors
    #[error("Validation failed: {0}")]
    Validation(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for PaywebError
pub type Result<T> = std::result::Result<T, PaywebError>;

impl PaywebError {
    /// Whether this error belongs to the transport class (no usable bytes
    /// came back from the gateway). Timeouts land here via reqwest.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            PaywebError::Transport(_) | PaywebError::EmptyGatewayResponse
        )
    }

    /// Safe text to show the paying customer. Integrity failures map to a
    /// generic message: the failing field must not be revealed.
    pub fn customer_message(&self) -> &'static str {
        match self {
            PaywebError::Integrity(_) => "An error occurred while processing the transaction",
            PaywebError::Gateway { .. } => "The payment could not be started. Please try again",
            PaywebError::Transport(_) | PaywebError::EmptyGatewayResponse => {
                "The payment service is currently unavailable. Please try again"
            }
            _ => "An error occurred while processing the transaction",
        }
    }
}

/// Explanation of the gateway error codes seen most often in practice.
pub fn describe_gateway_code(code: &str) -> Option<&'static str> {
    match code {
        "DATA_CHK" => Some(
            "Checksum posted does not match the one calculated by the gateway, \
             either due to an incorrect encryption key or a field excluded from \
             the checksum calculation",
        ),
        "DATA_PW" => Some("Mandatory fields have been excluded from the post to the gateway"),
        "DATA_CUR" => Some("The posted currency is not supported"),
        "PGID_NOT_EN" => Some(
            "The merchant id used to post data has not yet been enabled, \
             or has no payment methods set up on it",
        ),
        _ => None,
    }
}
