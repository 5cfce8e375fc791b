use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use url::Url;
use zeroize::Zeroize;

/// Shared encryption key configured per merchant account.
///
/// # Security
/// The key is only ever handed to the checksum codec. It is wiped from
/// memory on drop and redacted from `Debug` output; nothing in this crate
/// logs it.
#[derive(Clone, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The raw key, for checksum computation only.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Drop for Secret {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub merchant: MerchantConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MerchantConfig {
    /// Merchant account id issued by the gateway
    pub paygate_id: String,
    /// Encryption key as set up on the gateway back office
    pub encryption_key: Secret,
    /// Whether the payment method is enabled at all
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// URL the gateway redirects the customer back to
    pub return_url: String,
    /// Locale sent with every initiate request
    #[serde(default = "default_locale")]
    pub locale: String,
    /// Log checksum sources and wire payloads at debug level
    #[serde(default)]
    pub debug: bool,
}

fn default_enabled() -> bool {
    true
}

fn default_locale() -> String {
    "en-za".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Initiate endpoint
    #[serde(default = "default_initiate_url")]
    pub initiate_url: String,
    /// Process page the customer's browser is redirected to
    #[serde(default = "default_process_url")]
    pub process_url: String,
    /// Query endpoint
    #[serde(default = "default_query_url")]
    pub query_url: String,
    /// Request timeout for both endpoints in milliseconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Accept invalid TLS certificates from the gateway.
    ///
    /// This is a deliberate weakening kept only for legacy/test gateway
    /// certificates. Leave it off in production.
    #[serde(default)]
    pub danger_accept_invalid_certs: bool,
}

fn default_initiate_url() -> String {
    "https://secure.paygate.co.za/payweb3/initiate.trans".to_string()
}

fn default_process_url() -> String {
    "https://secure.paygate.co.za/payweb3/process.trans".to_string()
}

fn default_query_url() -> String {
    "https://secure.paygate.co.za/payweb3/query.trans".to_string()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            initiate_url: default_initiate_url(),
            process_url: default_process_url(),
            query_url: default_query_url(),
            request_timeout_ms: default_request_timeout_ms(),
            danger_accept_invalid_certs: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Start with default values
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            .set_default("merchant.enabled", true)?
            .set_default("merchant.locale", "en-za")?
            .set_default("merchant.debug", false)?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("PAYWEB_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (PAYWEB_MERCHANT__PAYGATE_ID, etc.)
            .add_source(
                Environment::with_prefix("PAYWEB")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.merchant.paygate_id.trim().is_empty() {
            errors.push("merchant.paygate_id must not be empty".to_string());
        }

        if self.merchant.encryption_key.is_empty() {
            errors.push("merchant.encryption_key must not be empty".to_string());
        }

        if Url::parse(&self.merchant.return_url).is_err() {
            errors.push(format!(
                "merchant.return_url is not a valid URL: {}",
                self.merchant.return_url
            ));
        }

        for (name, value) in [
            ("gateway.initiate_url", &self.gateway.initiate_url),
            ("gateway.process_url", &self.gateway.process_url),
            ("gateway.query_url", &self.gateway.query_url),
        ] {
            if Url::parse(value).is_err() {
                errors.push(format!("{name} is not a valid URL: {value}"));
            }
        }

        if self.gateway.request_timeout_ms == 0 {
            errors.push("gateway.request_timeout_ms must be greater than zero".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AppConfig {
        AppConfig {
            merchant: MerchantConfig {
                paygate_id: "10011072130".to_string(),
                encryption_key: Secret::new("secret"),
                enabled: true,
                return_url: "https://shop.example/return".to_string(),
                locale: "en-za".to_string(),
                debug: false,
            },
            gateway: GatewayConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn empty_merchant_id_is_rejected() {
        let mut cfg = test_config();
        cfg.merchant.paygate_id = "  ".to_string();
        let errors = cfg.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.contains("paygate_id")));
    }

    #[test]
    fn bad_return_url_is_rejected() {
        let mut cfg = test_config();
        cfg.merchant.return_url = "not a url".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let mut cfg = test_config();
        cfg.gateway.request_timeout_ms = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn secret_debug_output_is_redacted() {
        let secret = Secret::new("hunter2");
        assert_eq!(format!("{:?}", secret), "Secret(***)");
    }

    #[test]
    fn gateway_defaults_point_at_production() {
        let cfg = GatewayConfig::default();
        assert!(cfg.initiate_url.ends_with("initiate.trans"));
        assert!(cfg.query_url.ends_with("query.trans"));
        assert!(!cfg.danger_accept_invalid_certs);
    }
}
