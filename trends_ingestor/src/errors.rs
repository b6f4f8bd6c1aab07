use thiserror::Error;

use crate::config::ConfigError;
use crate::io::sink::SinkError;
use crate::providers::ProviderError;

/// The unified error type for the `trends_ingestor` crate.
#[derive(Debug, Error)]
pub enum Error {
    /// An error originating from a trends provider (e.g., quota, API error).
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// An error originating from a data sink (e.g., file I/O, parse failure).
    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    /// An error related to configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A generic I/O error.
    #[error("I/O error")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this failure is the upstream quota saying "not now".
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, Error::Provider(ProviderError::QuotaExceeded { .. }))
    }
}
