//! Per-run fetch orchestration.
//!
//! [`fetch_all`] walks the configured series sequentially, spacing upstream
//! requests out with a rate limiter and isolating failures per series: one
//! bad fetch is recorded in the [`FetchReport`](report::FetchReport) and the
//! run moves on. Output files are only touched after a successful fetch and
//! merge, so a failed series leaves its previous file byte-identical.

pub mod report;

use std::path::PathBuf;
use std::time::Duration;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use nonzero_ext::nonzero;
use tracing::{info, warn};

use crate::config::SeriesDef;
use crate::io::sink::DataSink;
use crate::models::observation::SeriesData;
use crate::models::request_params::{InterestRequestParams, RollingWindow};
use crate::providers::{MalformedResponseSnafu, QuotaExceededSnafu, TrendsProvider};
use crate::fetch::report::{FetchOutcome, FetchReport};

/// Pacing rules for upstream requests within one run.
///
/// The upstream allows only a small number of requests per day, so requests
/// are spaced by `request_delay` and hard-capped at `max_requests_per_run`;
/// series beyond the cap fail with a quota error and are retried by the next
/// scheduled run.
#[derive(Clone, Debug)]
pub struct RateLimitPolicy {
    /// Minimum spacing between consecutive upstream requests.
    pub request_delay: Duration,

    /// Upper bound on upstream requests in a single run.
    pub max_requests_per_run: u32,
}

impl RateLimitPolicy {
    fn limiter(&self) -> Option<DefaultDirectRateLimiter> {
        // A zero delay disables pacing (used by tests).
        Quota::with_period(self.request_delay)
            .map(|quota| RateLimiter::direct(quota.allow_burst(nonzero!(1u32))))
    }
}

/// Fetches every series in `series` through `provider` and rewrites changed
/// output files via `sink`.
///
/// Never fails as a whole: the returned report carries one outcome per
/// series, in input order.
pub async fn fetch_all<S>(
    provider: &dyn TrendsProvider,
    series: &[SeriesDef],
    window: RollingWindow,
    policy: &RateLimitPolicy,
    sink: &S,
) -> FetchReport
where
    S: DataSink<Output = PathBuf> + Sync,
{
    let limiter = policy.limiter();
    let mut report = FetchReport::default();
    let mut requests_made = 0u32;

    for def in series {
        if requests_made >= policy.max_requests_per_run {
            warn!(
                symbol = %def.symbol,
                cap = policy.max_requests_per_run,
                "per-run request budget exhausted, skipping series"
            );
            report.push(&def.symbol, FetchOutcome::Failed(QuotaExceededSnafu.build().into()));
            continue;
        }

        if let Some(limiter) = &limiter {
            limiter.until_ready().await;
        }
        requests_made += 1;

        let params = InterestRequestParams::new(def.term.clone(), window);
        let outcome = fetch_one(provider, def, params, sink).await;
        match &outcome {
            FetchOutcome::Updated(path) => {
                info!(symbol = %def.symbol, path = %path.display(), "series updated");
            }
            FetchOutcome::Unchanged => {
                info!(symbol = %def.symbol, "series unchanged");
            }
            FetchOutcome::Failed(e) => {
                warn!(symbol = %def.symbol, error = %e, "series fetch failed");
            }
        }
        report.push(&def.symbol, outcome);
    }

    report
}

async fn fetch_one<S>(
    provider: &dyn TrendsProvider,
    def: &SeriesDef,
    params: InterestRequestParams,
    sink: &S,
) -> FetchOutcome
where
    S: DataSink<Output = PathBuf> + Sync,
{
    let observations = match provider.fetch_interest(params).await {
        Ok(observations) => observations,
        Err(e) => return FetchOutcome::Failed(e.into()),
    };
    if observations.is_empty() {
        return FetchOutcome::Failed(
            MalformedResponseSnafu {
                message: "upstream returned no data points".to_string(),
            }
            .build()
            .into(),
        );
    }

    // A corrupt existing file loses to the fresh fetch: the dataset on disk
    // already violates the contract, so it is replaced wholesale.
    let previous = match sink.load(&def.symbol).await {
        Ok(previous) => previous,
        Err(e) => {
            warn!(
                symbol = %def.symbol,
                error = %e,
                "existing output file unreadable, replacing with fresh data"
            );
            None
        }
    };

    let mut merged = previous.clone().unwrap_or_else(SeriesData::new);
    merged.merge(&observations);

    if previous.as_ref() == Some(&merged) {
        return FetchOutcome::Unchanged;
    }

    match sink.write(&def.symbol, &merged).await {
        Ok(path) => FetchOutcome::Updated(path),
        Err(e) => FetchOutcome::Failed(e.into()),
    }
}
