//! Provider abstraction for trends data sources.
//!
//! This module defines the [`TrendsProvider`] trait, a unified interface for
//! fetching interest-over-time series from any upstream trends vendor.
//!
//! Each concrete provider implementation (currently only
//! [`google_rest`](crate::providers::google_rest)) handles vendor-specific
//! request plumbing and validation behind this trait.
//!
//! The trait is designed for async usage and supports dynamic dispatch
//! (`dyn TrendsProvider`), which the fetch pipeline and its tests rely on.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use trends_ingestor::models::{
//!     observation::Observation,
//!     request_params::InterestRequestParams,
//! };
//! use trends_ingestor::providers::{ProviderError, TrendsProvider};
//!
//! struct MyProvider;
//!
//! #[async_trait]
//! impl TrendsProvider for MyProvider {
//!     async fn fetch_interest(
//!         &self,
//!         _params: InterestRequestParams,
//!     ) -> Result<Vec<Observation>, ProviderError> {
//!         Ok(vec![])
//!     }
//! }
//! ```

pub mod google_rest;

use async_trait::async_trait;
use snafu::{Backtrace, Snafu};

use crate::models::{observation::Observation, request_params::InterestRequestParams};

/// Trait for fetching an interest-over-time series from a trends provider.
///
/// Implement this trait for each concrete upstream. One call fetches the
/// full rolling window for a single search term; the pipeline merges the
/// result into the on-disk dataset.
#[async_trait]
pub trait TrendsProvider {
    /// Fetches the interest series for the given request parameters.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<Observation>)` - the points covering the requested window,
    ///   in upstream order (not necessarily sorted).
    /// * `Err(ProviderError)` - if the request fails; the caller records the
    ///   failure for this series and moves on.
    async fn fetch_interest(
        &self,
        params: InterestRequestParams,
    ) -> Result<Vec<Observation>, ProviderError>;
}

/// Errors that can occur during the creation of a provider instance.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderInitError {
    /// failed to init reqwest client
    #[snafu(display("Failed to build HTTP client: {source}"))]
    ClientBuild {
        source: reqwest::Error,
        backtrace: Backtrace,
    },
}

/// Errors that can occur within a `TrendsProvider` implementation.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderError {
    /// An error during an API request (e.g., network failure, timeout).
    #[snafu(display("API request failed: {source}"))]
    Reqwest {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// The upstream's request quota for this period is exhausted. Recoverable:
    /// the series is skipped this run and retried on the next trigger.
    #[snafu(display("Upstream request quota exceeded"))]
    QuotaExceeded { backtrace: Backtrace },

    /// The upstream returned a non-success status with an error body.
    #[snafu(display("API error: {message}"))]
    Api {
        message: String,
        backtrace: Backtrace,
    },

    /// The upstream responded, but the body did not match the expected shape.
    #[snafu(display("Malformed response: {message}"))]
    MalformedResponse {
        message: String,
        backtrace: Backtrace,
    },

    /// The request parameters were invalid for this specific provider.
    #[snafu(display("Invalid parameters for provider: {message}"))]
    Validation {
        message: String,
        backtrace: Backtrace,
    },
}
