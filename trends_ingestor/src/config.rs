//! Run configuration: parsing, normalization, and loading.
//!
//! A TOML file declares the tracked series (symbol -> search term), the
//! rolling window requested from the upstream, the rate-limit policy, and
//! where output files live.
//!
//! Normalization trims whitespace, rejects blank or non-identifier symbols,
//! and de-duplicates series by symbol while preserving declaration order.
//! Config errors are fatal at startup; they are the only fatal error class
//! in the program.

use std::path::{Path, PathBuf};
use std::time::Duration;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_utils::env::get_env_var;

use crate::fetch::RateLimitPolicy;
use crate::models::request_params::RollingWindow;
use crate::validate::DEFAULT_MAX_AGE_DAYS;

/// Overrides `data_dir` when set, so CI can redirect output without editing
/// the checked-in config.
pub const DATA_DIR_ENV: &str = "TREND_SEEDS_DATA_DIR";

/// Fallback for the `--config` CLI argument.
pub const CONFIG_PATH_ENV: &str = "TREND_SEEDS_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level run configuration.
#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Directory the per-series CSV files are written to.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Rolling window requested from the upstream on each fetch.
    #[serde(default = "RollingWindow::default_window")]
    pub window: RollingWindow,

    #[serde(default)]
    pub rate_limit: RateLimitCfg,

    #[serde(default)]
    pub provider: ProviderCfg,

    #[serde(default)]
    pub freshness: FreshnessCfg,

    /// Map of series symbol -> series configuration, order-preserving.
    /// The symbol doubles as the output file stem.
    pub series: IndexMap<String, SeriesCfg>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SeriesCfg {
    /// The search term sent upstream (e.g. "stock market").
    pub term: String,
    /// Optional human-readable label for logs.
    pub label: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitCfg {
    /// Minimum seconds between consecutive upstream requests.
    #[serde(default = "default_request_delay_secs")]
    pub request_delay_secs: u64,

    /// Hard cap on upstream requests per run.
    #[serde(default = "default_max_requests_per_run")]
    pub max_requests_per_run: u32,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for RateLimitCfg {
    fn default() -> Self {
        Self {
            request_delay_secs: default_request_delay_secs(),
            max_requests_per_run: default_max_requests_per_run(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl RateLimitCfg {
    pub fn policy(&self) -> RateLimitPolicy {
        RateLimitPolicy {
            request_delay: Duration::from_secs(self.request_delay_secs),
            max_requests_per_run: self.max_requests_per_run,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderCfg {
    /// Host language for upstream requests.
    #[serde(default = "default_hl")]
    pub hl: String,

    /// Timezone offset in minutes, as the upstream expects.
    #[serde(default = "default_tz")]
    pub tz: i32,
}

impl Default for ProviderCfg {
    fn default() -> Self {
        Self {
            hl: default_hl(),
            tz: default_tz(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FreshnessCfg {
    /// Age in days beyond which the newest data point triggers a warning.
    #[serde(default = "default_max_age_days")]
    pub max_age_days: i64,
}

impl Default for FreshnessCfg {
    fn default() -> Self {
        Self {
            max_age_days: default_max_age_days(),
        }
    }
}

/// One flattened series definition, as the fetch pipeline consumes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesDef {
    pub symbol: String,
    pub term: String,
    pub label: Option<String>,
}

impl Config {
    /// Parses and normalizes a config from a file path.
    pub fn load_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::load_str(&content)
    }

    /// Parses and normalizes a config from a TOML string.
    pub fn load_str(content: &str) -> Result<Self, ConfigError> {
        let mut config: Config = toml::from_str(content)?;
        config.normalize()?;
        Ok(config)
    }

    /// Applies environment overrides. Kept separate from parsing so tests
    /// stay independent of the ambient environment.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(dir) = get_env_var(DATA_DIR_ENV) {
            self.data_dir = PathBuf::from(dir);
        }
    }

    /// The series list in declaration order.
    pub fn series_defs(&self) -> Vec<SeriesDef> {
        self.series
            .iter()
            .map(|(symbol, cfg)| SeriesDef {
                symbol: symbol.clone(),
                term: cfg.term.clone(),
                label: cfg.label.clone(),
            })
            .collect()
    }

    fn normalize(&mut self) -> Result<(), ConfigError> {
        if self.series.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one [series.<SYMBOL>] entry is required".to_string(),
            ));
        }
        if self.rate_limit.max_requests_per_run == 0 {
            return Err(ConfigError::Invalid(
                "rate_limit.max_requests_per_run must be at least 1".to_string(),
            ));
        }

        let entries = std::mem::take(&mut self.series);
        for (symbol, mut cfg) in entries {
            let symbol = symbol.trim().to_string();
            if symbol.is_empty() {
                return Err(ConfigError::Invalid("series symbol is blank".to_string()));
            }
            if !symbol
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
            {
                return Err(ConfigError::Invalid(format!(
                    "series symbol `{symbol}` must contain only ASCII letters, digits and underscores"
                )));
            }

            cfg.term = cfg.term.trim().to_string();
            if cfg.term.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "series `{symbol}` has a blank search term"
                )));
            }
            cfg.label = cfg
                .label
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty());

            if self.series.insert(symbol.clone(), cfg).is_some() {
                return Err(ConfigError::Invalid(format!(
                    "duplicate series symbol `{symbol}`"
                )));
            }
        }

        Ok(())
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_request_delay_secs() -> u64 {
    5
}

fn default_max_requests_per_run() -> u32 {
    10
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_hl() -> String {
    "en-US".to_string()
}

fn default_tz() -> i32 {
    360
}

fn default_max_age_days() -> i64 {
    DEFAULT_MAX_AGE_DAYS
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE: &str = r#"
data_dir = "data"
window = { years = 5 }

[rate_limit]
request_delay_secs = 5
max_requests_per_run = 10

[series.GOOGL_TRENDS_BITCOIN]
term = "bitcoin"
label = "Bitcoin search interest"

[series.GOOGL_TRENDS_RECESSION]
term = "recession"
"#;

    #[test]
    fn example_config_parses() {
        let config = Config::load_str(EXAMPLE).unwrap();

        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.window, RollingWindow::Years(5));
        assert_eq!(config.rate_limit.request_delay_secs, 5);

        let defs = config.series_defs();
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[0].symbol, "GOOGL_TRENDS_BITCOIN");
        assert_eq!(defs[0].term, "bitcoin");
        assert_eq!(defs[1].symbol, "GOOGL_TRENDS_RECESSION");
        assert_eq!(defs[1].label, None);
    }

    #[test]
    fn defaults_fill_in_missing_sections() {
        let config = Config::load_str(
            r#"
[series.X]
term = "x"
"#,
        )
        .unwrap();

        assert_eq!(config.window, RollingWindow::Years(5));
        assert_eq!(config.rate_limit.max_requests_per_run, 10);
        assert_eq!(config.rate_limit.request_timeout_secs, 30);
        assert_eq!(config.provider.hl, "en-US");
        assert_eq!(config.provider.tz, 360);
        assert_eq!(config.freshness.max_age_days, 7);
    }

    #[test]
    fn series_are_required() {
        let err = Config::load_str("data_dir = \"data\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));

        let err = Config::load_str("[series]\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = Config::load_str(
            r#"
surprise = true

[series.X]
term = "x"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn blank_term_is_rejected() {
        let err = Config::load_str(
            r#"
[series.X]
term = "   "
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn symbols_must_be_identifiers() {
        let err = Config::load_str(
            r#"
[series."bad symbol!"]
term = "x"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn symbols_deduplicate_after_trimming() {
        let err = Config::load_str(
            r#"
[series."X"]
term = "x"

[series."X "]
term = "y"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn zero_request_cap_is_rejected() {
        let err = Config::load_str(
            r#"
[rate_limit]
max_requests_per_run = 0

[series.X]
term = "x"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
