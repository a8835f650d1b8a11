use config::{Config, ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::env;
use thiserror::Error;
use tracing::{error, info};
use validator::Validate;

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const CONFIG_DIR: &str = "config";
const DEFAULT_DATABASE_URL: &str = "sqlite://coupons.db?mode=rwc";
const DEFAULT_SHIPPING_BASE_CENTS: i64 = 500;
const DEFAULT_TAX_RATE: f64 = 0.19; // German VAT

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Database connection URL
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Flat shipping rate charged unless a free-shipping coupon applies
    #[serde(default = "default_shipping_base_cents")]
    #[validate(range(min = 0))]
    pub shipping_base_cents: i64,

    /// Tax applied to the discounted subtotal, as a fraction
    #[serde(default = "default_tax_rate")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub default_tax_rate: f64,

    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Runtime environment name (development, production, ...)
    #[serde(default = "default_environment")]
    pub environment: String,
}

fn default_database_url() -> String {
    DEFAULT_DATABASE_URL.to_string()
}

fn default_shipping_base_cents() -> i64 {
    DEFAULT_SHIPPING_BASE_CENTS
}

fn default_tax_rate() -> f64 {
    DEFAULT_TAX_RATE
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            shipping_base_cents: default_shipping_base_cents(),
            default_tax_rate: default_tax_rate(),
            log_level: default_log_level(),
            environment: default_environment(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

impl AppConfig {
    /// The tax rate as a `Decimal`, the form the totals aggregator consumes.
    pub fn tax_rate(&self) -> Decimal {
        Decimal::from_f64_retain(self.default_tax_rate).unwrap_or(Decimal::ZERO)
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

/// Loads configuration from `config/` files and the environment.
///
/// Profile selection honors RUN_ENV/APP_ENV; environment overrides use the
/// COUPON_ENGINE prefix with `__` separators (e.g.
/// `COUPON_ENGINE__SHIPPING_BASE_CENTS=0`).
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    let config = Config::builder()
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(Environment::with_prefix("COUPON_ENGINE").separator("__"))
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    Ok(app_config)
}
