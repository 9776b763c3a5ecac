//! services/storefront/src/config.rs
//!
//! Defines the client's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// One bank account shown on the transfer instructions screen.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct BankAccount {
    pub bank: String,
    pub account: String,
    pub cci: String,
    pub holder: String,
}

/// Merchant-facing checkout settings.
#[derive(Clone, Debug, PartialEq)]
pub struct PaymentProfile {
    pub culqi_public_key: Option<String>,
    pub store_title: String,
    pub currency: String,
    pub currency_symbol: String,
    pub merchant_phone: String,
    pub bank_accounts: Vec<BankAccount>,
}

impl Default for PaymentProfile {
    fn default() -> Self {
        Self {
            culqi_public_key: None,
            store_title: "PROMELAB".to_string(),
            currency: "PEN".to_string(),
            currency_symbol: "S/".to_string(),
            merchant_phone: "51962162027".to_string(),
            bank_accounts: Vec::new(),
        }
    }
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub api_url: String,
    pub log_level: Level,
    pub token_store_path: PathBuf,
    pub search_debounce: Duration,
    pub payment: PaymentProfile,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Reads `primary`, falling back to the legacy `NEXT_PUBLIC_` spelling.
/// Blank values count as unset.
fn var_with_fallback(lookup: &impl Fn(&str) -> Option<String>, primary: &str, legacy: &str) -> Option<String> {
    [primary, legacy]
        .into_iter()
        .filter_map(|name| lookup(name))
        .find(|value| !value.trim().is_empty())
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // --- API endpoint ---
        let api_url = var_with_fallback(&lookup, "API_URL", "NEXT_PUBLIC_API_URL")
            .unwrap_or_else(|| "http://localhost:8000/api".to_string());
        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue(
                "API_URL".to_string(),
                format!("'{}' is not an http(s) URL", api_url),
            ));
        }

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let token_store_path = lookup("TOKEN_STORE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./.storefront/session.json"));

        let search_debounce = match lookup("SEARCH_DEBOUNCE_MS") {
            Some(raw) => Duration::from_millis(raw.parse::<u64>().map_err(|e| {
                ConfigError::InvalidValue("SEARCH_DEBOUNCE_MS".to_string(), e.to_string())
            })?),
            None => Duration::from_millis(300),
        };

        // --- Checkout ---
        let defaults = PaymentProfile::default();
        let bank_accounts = match lookup("BANK_ACCOUNTS") {
            Some(raw) => serde_json::from_str::<Vec<BankAccount>>(&raw).map_err(|e| {
                ConfigError::InvalidValue("BANK_ACCOUNTS".to_string(), e.to_string())
            })?,
            None => Vec::new(),
        };
        let payment = PaymentProfile {
            culqi_public_key: var_with_fallback(
                &lookup,
                "CULQI_PUBLIC_KEY",
                "NEXT_PUBLIC_CULQI_PUBLIC_KEY",
            ),
            store_title: lookup("STORE_TITLE").unwrap_or(defaults.store_title),
            currency: lookup("CURRENCY").unwrap_or(defaults.currency),
            currency_symbol: lookup("CURRENCY_SYMBOL").unwrap_or(defaults.currency_symbol),
            merchant_phone: lookup("MERCHANT_PHONE").unwrap_or(defaults.merchant_phone),
            bank_accounts,
        };

        // --- Optional smoke-run login ---
        let username = lookup("STOREFRONT_USERNAME");
        let password = lookup("STOREFRONT_PASSWORD");
        if username.is_some() && password.is_none() {
            return Err(ConfigError::MissingVar("STOREFRONT_PASSWORD".to_string()));
        }

        Ok(Self {
            api_url,
            log_level,
            token_store_path,
            search_debounce,
            payment,
            username,
            password,
        })
    }
}
