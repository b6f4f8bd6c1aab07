use std::fmt;

use serde::{Deserialize, Serialize};

/// Universal parameters for requesting an interest-over-time series from a
/// trends data provider.
///
/// This struct is vendor-agnostic. **Validation of allowed values is
/// performed by each provider implementation, according to its own API
/// rules** (for example, the Google widget API only accepts a fixed set of
/// rolling windows).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct InterestRequestParams {
    /// The search term to fetch interest for (e.g. `"bitcoin"`).
    pub term: String,

    /// The rolling time window bounding the request.
    pub window: RollingWindow,

    /// Geographic scope. The empty string means worldwide.
    #[serde(default)]
    pub geo: String,

    /// Upstream category id. `0` means all categories.
    #[serde(default)]
    pub category: u32,
}

impl InterestRequestParams {
    /// Worldwide, all-categories request for one term.
    pub fn new(term: impl Into<String>, window: RollingWindow) -> Self {
        Self {
            term: term.into(),
            window,
            geo: String::new(),
            category: 0,
        }
    }
}

/// A trailing time span, anchored at "now" on each fetch.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RollingWindow {
    Days(u32),
    Months(u32),
    Years(u32),
}

impl RollingWindow {
    pub const fn default_window() -> Self {
        RollingWindow::Years(5)
    }

    /// The window in the upstream's `time` parameter syntax
    /// (`"now 7-d"`, `"today 3-m"`, `"today 5-y"`).
    pub fn as_api_param(&self) -> String {
        match self {
            RollingWindow::Days(n) => format!("now {n}-d"),
            RollingWindow::Months(n) => format!("today {n}-m"),
            RollingWindow::Years(n) => format!("today {n}-y"),
        }
    }
}

impl Default for RollingWindow {
    fn default() -> Self {
        Self::default_window()
    }
}

impl fmt::Display for RollingWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RollingWindow::Days(n) => write!(f, "trailing {n} day(s)"),
            RollingWindow::Months(n) => write!(f, "trailing {n} month(s)"),
            RollingWindow::Years(n) => write!(f, "trailing {n} year(s)"),
        }
    }
}
