use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use snafu::ResultExt;
use tracing::debug;

use crate::models::{observation::Observation, request_params::InterestRequestParams};
use crate::providers::google_rest::{
    params::{build_explore_request, validate_window},
    response::{ExploreResponse, WidgetdataResponse, parse_json_body},
};
use crate::providers::{
    ApiSnafu, ClientBuildSnafu, MalformedResponseSnafu, ProviderError, ProviderInitError,
    QuotaExceededSnafu, ReqwestSnafu, TrendsProvider,
};

const DEFAULT_BASE_URL: &str = "https://trends.google.com";
const EXPLORE_PATH: &str = "/trends/api/explore";
const WIDGETDATA_PATH: &str = "/trends/api/widgetdata/multiline";

/// Provider speaking the public trends widget API.
///
/// Fetching one term is a two-step exchange: an explore call that hands out
/// a widget token, then a widgetdata call that returns the actual timeline.
/// The API is unauthenticated but aggressively rate limited; 429s surface as
/// [`ProviderError::QuotaExceeded`] and the caller is expected to back off
/// until the next scheduled run.
pub struct GoogleTrendsProvider {
    client: Client,
    base_url: String,
    hl: String,
    tz: i32,
}

impl GoogleTrendsProvider {
    /// Creates a provider against the production endpoint.
    ///
    /// `hl` is the host language (e.g. `"en-US"`), `tz` the timezone offset
    /// in minutes the upstream uses to bucket daily points.
    pub fn new(hl: &str, tz: i32, timeout: Duration) -> Result<Self, ProviderInitError> {
        Self::with_base_url(DEFAULT_BASE_URL, hl, tz, timeout)
    }

    /// Same as [`GoogleTrendsProvider::new`] but against an arbitrary base
    /// URL, so tests can point the provider at a local server.
    pub fn with_base_url(
        base_url: &str,
        hl: &str,
        tz: i32,
        timeout: Duration,
    ) -> Result<Self, ProviderInitError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context(ClientBuildSnafu)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            hl: hl.to_string(),
            tz,
        })
    }

    async fn get_text(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<String, ProviderError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "requesting upstream endpoint");

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .context(ReqwestSnafu)?;

        match response.status() {
            status if status.is_success() => response.text().await.context(ReqwestSnafu),
            StatusCode::TOO_MANY_REQUESTS => QuotaExceededSnafu.fail(),
            status => {
                let message = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown API error".to_string());
                ApiSnafu {
                    message: format!("{status}: {message}"),
                }
                .fail()
            }
        }
    }
}

#[async_trait]
impl TrendsProvider for GoogleTrendsProvider {
    async fn fetch_interest(
        &self,
        params: InterestRequestParams,
    ) -> Result<Vec<Observation>, ProviderError> {
        validate_window(&params.window)?;

        // Step 1: explore, to obtain the timeseries widget token.
        let explore_req = build_explore_request(&params);
        let req_json = serde_json::to_string(&explore_req).map_err(|e| {
            MalformedResponseSnafu {
                message: format!("could not serialize explore request: {e}"),
            }
            .build()
        })?;
        let query = [
            ("hl", self.hl.clone()),
            ("tz", self.tz.to_string()),
            ("req", req_json),
        ];
        let body = self.get_text(EXPLORE_PATH, &query).await?;
        let explore: ExploreResponse = parse_json_body(&body)?;
        let widget = explore.timeseries_widget().ok_or_else(|| {
            MalformedResponseSnafu {
                message: "no TIMESERIES widget in explore response".to_string(),
            }
            .build()
        })?;

        // Step 2: widgetdata, with the token and the widget's own request
        // object echoed back verbatim.
        let widget_req = widget
            .request
            .as_ref()
            .map(|r| r.to_string())
            .unwrap_or_default();
        let token = widget.token.clone().unwrap_or_default();
        let query = [
            ("hl", self.hl.clone()),
            ("tz", self.tz.to_string()),
            ("req", widget_req),
            ("token", token),
        ];
        let body = self.get_text(WIDGETDATA_PATH, &query).await?;
        let data: WidgetdataResponse = parse_json_body(&body)?;

        data.into_observations()
    }
}
