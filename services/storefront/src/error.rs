//! services/storefront/src/error.rs
//!
//! Defines the primary error type for the storefront client.

use crate::config::ConfigError;
use storefront_core::ports::PortError;

/// The primary error type for the `storefront` service.
#[derive(Debug, thiserror::Error)]
pub enum StorefrontError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error from the underlying HTTP client library.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

}
