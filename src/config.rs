use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use validator::{Validate, ValidationError};

const DEFAULT_DATABASE_URL: &str = "sqlite::memory:";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_ENV: &str = "development";
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_SETTLEMENT_CURRENCY: &str = "USD";
const DEFAULT_GATEWAY_MODE: &str = "sandbox";
const DEFAULT_PAYPAL_BASE_URL: &str = "https://api.sandbox.paypal.com";
const CONFIG_DIR: &str = "config";

/// Application configuration with validation.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct AppConfig {
    /// Database connection URL (Postgres in production, SQLite for local runs)
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Server bind host
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Whether to run database migrations on startup
    #[serde(default = "default_true")]
    pub auto_migrate: bool,

    /// DB pool: max connections
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    /// DB pool: min connections
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    /// DB timeouts (seconds)
    #[serde(default = "default_db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,
    #[serde(default = "default_db_idle_timeout_secs")]
    pub db_idle_timeout_secs: u64,
    #[serde(default = "default_db_acquire_timeout_secs")]
    pub db_acquire_timeout_secs: u64,

    /// Payment gateway backend: "paypal" or "sandbox"
    #[serde(default = "default_gateway_mode")]
    pub gateway_mode: String,

    /// Base URL of the PayPal REST API
    #[serde(default = "default_paypal_base_url")]
    pub paypal_base_url: String,

    /// PayPal REST credentials (required when gateway_mode = "paypal")
    #[serde(default)]
    pub paypal_client_id: Option<String>,
    #[serde(default)]
    pub paypal_client_secret: Option<String>,

    /// Where the gateway sends the customer after approving / cancelling
    #[serde(default = "default_return_url")]
    pub checkout_return_url: String,
    #[serde(default = "default_cancel_url")]
    pub checkout_cancel_url: String,

    /// Single fixed settlement currency, independent of the storefront's
    /// display currency. Keeps intents clear of cross-currency restrictions
    /// at the gateway.
    #[validate(length(equal = 3), custom = "validate_currency")]
    #[serde(default = "default_settlement_currency")]
    pub settlement_currency: String,

    /// Timeout for outbound gateway calls (seconds)
    #[serde(default = "default_gateway_timeout_secs")]
    pub gateway_timeout_secs: u64,
}

fn default_database_url() -> String {
    DEFAULT_DATABASE_URL.to_string()
}
fn default_host() -> String {
    DEFAULT_HOST.to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}
fn default_true() -> bool {
    true
}
fn default_db_max_connections() -> u32 {
    10
}
fn default_db_min_connections() -> u32 {
    1
}
fn default_db_connect_timeout_secs() -> u64 {
    30
}
fn default_db_idle_timeout_secs() -> u64 {
    600
}
fn default_db_acquire_timeout_secs() -> u64 {
    8
}
fn default_gateway_mode() -> String {
    DEFAULT_GATEWAY_MODE.to_string()
}
fn default_paypal_base_url() -> String {
    DEFAULT_PAYPAL_BASE_URL.to_string()
}
fn default_return_url() -> String {
    "http://localhost:5173/shop/paypal-return".to_string()
}
fn default_cancel_url() -> String {
    "http://localhost:5173/shop/paypal-cancel".to_string()
}
fn default_settlement_currency() -> String {
    DEFAULT_SETTLEMENT_CURRENCY.to_string()
}
fn default_gateway_timeout_secs() -> u64 {
    30
}

fn validate_currency(currency: &str) -> Result<(), ValidationError> {
    if currency.len() == 3 && currency.chars().all(|c| c.is_ascii_uppercase()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("currency");
        err.message = Some("Settlement currency must be a 3-letter uppercase ISO code".into());
        Err(err)
    }
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read configuration: {0}")]
    Read(#[from] ConfigError),
    #[error("invalid configuration: {0}")]
    Invalid(#[from] validator::ValidationErrors),
}

impl AppConfig {
    /// Programmatic constructor, used by tests and tooling. Everything not
    /// passed in gets the same defaults the file/env loader applies.
    pub fn new(
        database_url: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        environment: impl Into<String>,
    ) -> Self {
        Self {
            database_url: database_url.into(),
            host: host.into(),
            port,
            environment: environment.into(),
            log_level: default_log_level(),
            log_json: false,
            auto_migrate: true,
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            db_connect_timeout_secs: default_db_connect_timeout_secs(),
            db_idle_timeout_secs: default_db_idle_timeout_secs(),
            db_acquire_timeout_secs: default_db_acquire_timeout_secs(),
            gateway_mode: default_gateway_mode(),
            paypal_base_url: default_paypal_base_url(),
            paypal_client_id: None,
            paypal_client_secret: None,
            checkout_return_url: default_return_url(),
            checkout_cancel_url: default_cancel_url(),
            settlement_currency: default_settlement_currency(),
            gateway_timeout_secs: default_gateway_timeout_secs(),
        }
    }

    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }
}

/// Loads configuration from `config/{default,<env>}.toml` (both optional)
/// with `APP__`-prefixed environment overrides, then validates it.
pub fn load_config() -> Result<AppConfig, ConfigLoadError> {
    let run_env = std::env::var("APP_ENV").unwrap_or_else(|_| DEFAULT_ENV.to_string());

    let cfg: AppConfig = Config::builder()
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?
        .try_deserialize()?;

    cfg.validate()?;
    Ok(cfg)
}

/// Initializes the global tracing subscriber from the configured level and
/// format. `RUST_LOG` takes precedence over the configured level.
pub fn init_tracing(level: &str, json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        let _ = builder.json().try_init();
    } else {
        let _ = builder.try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructor_applies_defaults() {
        let cfg = AppConfig::new("sqlite::memory:", "127.0.0.1", 18080, "test");
        assert_eq!(cfg.settlement_currency, "USD");
        assert_eq!(cfg.gateway_mode, "sandbox");
        assert!(cfg.auto_migrate);
        assert!(!cfg.is_development());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn lowercase_currency_is_rejected() {
        let mut cfg = AppConfig::new("sqlite::memory:", "127.0.0.1", 18080, "test");
        cfg.settlement_currency = "usd".to_string();
        assert!(cfg.validate().is_err());
    }
}
