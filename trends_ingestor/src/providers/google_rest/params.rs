use serde::Serialize;

use crate::models::request_params::{InterestRequestParams, RollingWindow};
use crate::providers::{ProviderError, ValidationSnafu};

/// The JSON payload the explore endpoint expects in its `req` query
/// parameter.
#[derive(Debug, Serialize)]
pub struct ExploreRequest {
    #[serde(rename = "comparisonItem")]
    pub comparison_item: Vec<ComparisonItem>,
    pub category: u32,
    pub property: String,
}

#[derive(Debug, Serialize)]
pub struct ComparisonItem {
    pub keyword: String,
    pub geo: String,
    pub time: String,
}

pub fn build_explore_request(params: &InterestRequestParams) -> ExploreRequest {
    ExploreRequest {
        comparison_item: vec![ComparisonItem {
            keyword: params.term.clone(),
            geo: params.geo.clone(),
            time: params.window.as_api_param(),
        }],
        category: params.category,
        property: String::new(),
    }
}

/// Rejects rolling windows the widget API does not accept.
///
/// The endpoint only understands a fixed set of presets; anything else
/// comes back as an opaque 400.
pub fn validate_window(window: &RollingWindow) -> Result<(), ProviderError> {
    let supported = match window {
        RollingWindow::Days(n) => [1, 7].contains(n),
        RollingWindow::Months(n) => [1, 3, 12].contains(n),
        RollingWindow::Years(n) => *n == 5,
    };

    if supported {
        Ok(())
    } else {
        ValidationSnafu {
            message: format!(
                "unsupported rolling window `{}`; supported windows are \
                 now 1-d, now 7-d, today 1-m, today 3-m, today 12-m, today 5-y",
                window.as_api_param()
            ),
        }
        .fail()
    }
}
