use chrono::DateTime;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::models::observation::Observation;
use crate::providers::{MalformedResponseSnafu, ProviderError};

/// Widget id of the interest-over-time series in an explore response.
pub const TIMESERIES_WIDGET: &str = "TIMESERIES";

/// Strips the anti-JSON-hijacking prefix (`)]}'`, sometimes followed by a
/// comma or newline) that the trends endpoints prepend, then deserializes
/// the remainder.
pub fn parse_json_body<T: DeserializeOwned>(body: &str) -> Result<T, ProviderError> {
    let start = body.find(['{', '[']).ok_or_else(|| {
        MalformedResponseSnafu {
            message: "no JSON payload in response body".to_string(),
        }
        .build()
    })?;

    serde_json::from_str(&body[start..]).map_err(|e| {
        MalformedResponseSnafu {
            message: e.to_string(),
        }
        .build()
    })
}

#[derive(Debug, Deserialize)]
pub struct ExploreResponse {
    pub widgets: Vec<Widget>,
}

/// One widget descriptor from the explore endpoint. Only the timeseries
/// widget carries the token and request we need; other widgets (related
/// queries, geo maps) are ignored.
#[derive(Debug, Deserialize)]
pub struct Widget {
    pub id: String,
    pub token: Option<String>,
    pub request: Option<Value>,
}

impl ExploreResponse {
    pub fn timeseries_widget(&self) -> Option<&Widget> {
        self.widgets
            .iter()
            .find(|w| w.id == TIMESERIES_WIDGET && w.token.is_some() && w.request.is_some())
    }
}

#[derive(Debug, Deserialize)]
pub struct WidgetdataResponse {
    pub default: Timeline,
}

#[derive(Debug, Deserialize)]
pub struct Timeline {
    #[serde(rename = "timelineData")]
    pub timeline_data: Vec<TimelinePoint>,
}

/// One point of the multiline widget data. `value` and `hasData` are arrays
/// because the endpoint supports multi-term comparisons; we only ever send
/// one term, so only the first element matters.
#[derive(Debug, Deserialize)]
pub struct TimelinePoint {
    pub time: String,
    #[serde(default)]
    pub value: Vec<f64>,
    #[serde(rename = "hasData", default)]
    pub has_data: Vec<bool>,
    #[serde(rename = "isPartial", default)]
    pub is_partial: bool,
}

impl WidgetdataResponse {
    /// Converts the timeline into canonical observations.
    ///
    /// Points flagged `hasData: false` become missing scores rather than
    /// zeros. Partial (still-accumulating) points are kept; the next fetch
    /// overwrites them under the new-response-wins merge rule.
    pub fn into_observations(self) -> Result<Vec<Observation>, ProviderError> {
        self.default
            .timeline_data
            .into_iter()
            .map(|point| {
                let secs: i64 = point.time.parse().map_err(|_| {
                    MalformedResponseSnafu {
                        message: format!("invalid timestamp `{}` in timeline", point.time),
                    }
                    .build()
                })?;
                let time = DateTime::from_timestamp(secs, 0).ok_or_else(|| {
                    MalformedResponseSnafu {
                        message: format!("timestamp `{secs}` out of range"),
                    }
                    .build()
                })?;

                let score = match (point.has_data.first(), point.value.first()) {
                    (Some(false), _) => None,
                    (_, Some(v)) => Some(*v),
                    (_, None) => None,
                };
                if let Some(v) = score {
                    if !(0.0..=100.0).contains(&v) {
                        return MalformedResponseSnafu {
                            message: format!("interest score {v} outside [0, 100]"),
                        }
                        .fail();
                    }
                }

                Ok(Observation { time, score })
            })
            .collect()
    }
}
