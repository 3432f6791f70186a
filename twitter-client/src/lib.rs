pub mod api;
pub mod auth;
pub mod rate_limiter;


use api::{TwitterApiClient, WORLDWIDE_WOEID};
use auth::AppCredentials;
use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};
use trends_core::{
    CoreError, ErrorRecovery, RawTextUnit, RecoveryResult, RecoveryStrategy, Snapshot, Trend,
    TrendGroup, TwitterConfig,
};

/// Attempts per request when waiting on rate limits is enabled.
const MAX_ATTEMPTS: usize = 3;

/// The data-collection side of the pipeline: trend names and their top posts.
pub trait TrendSource {
    /// Trends for a region, or worldwide trends when `woeid` is `None`.
    async fn list_trends(&self, woeid: Option<u64>) -> Result<Vec<Trend>, CoreError>;

    /// Text of up to `limit` top posts for a trend.
    async fn search_top_posts(
        &self,
        trend_name: &str,
        limit: u32,
    ) -> Result<Vec<RawTextUnit>, CoreError>;
}

/// Collects every current trend of a region together with its top posts.
///
/// Any collaborator error aborts the whole collection; no partial snapshot is returned.
pub async fn collect_snapshot<S: TrendSource>(
    source: &S,
    woeid: Option<u64>,
    limit: u32,
) -> Result<Snapshot, CoreError> {
    info!("Start reading trends for woeid {:?}", woeid);
    let trends = source.list_trends(woeid).await?;

    let mut seen = HashSet::new();
    let mut groups = Vec::with_capacity(trends.len());
    for trend in trends {
        if !seen.insert(trend.name.clone()) {
            debug!("Trend '{}' listed twice, keeping the first", trend.name);
            continue;
        }

        info!("Reading tweets for trend {}", trend.name);
        let posts = source.search_top_posts(&trend.name, limit).await?;
        groups.push((trend.name, TrendGroup::new(posts)));
    }

    let snapshot: Snapshot = groups.into_iter().collect();
    info!(
        "Finished reading {} trends for woeid {:?}",
        snapshot.len(),
        woeid
    );
    Ok(snapshot)
}

/// Twitter API v1.1 client with app-only authentication.
pub struct TwitterClient {
    api: TwitterApiClient,
    bearer_token: String,
    wait_on_rate_limit: bool,
}

impl TwitterClient {
    /// Resolves the bearer token up front so every later call is authorized.
    pub async fn connect(config: &TwitterConfig) -> Result<Self, CoreError> {
        let credentials = AppCredentials::from_config(config)?;
        let bearer_token = credentials.bearer_token().await?;
        let api =
            TwitterApiClient::new(&config.user_agent, Duration::from_secs(config.timeout_secs))?;

        Ok(Self::new(api, bearer_token).with_wait_on_rate_limit(config.wait_on_rate_limit))
    }

    pub fn new(api: TwitterApiClient, bearer_token: String) -> Self {
        Self {
            api,
            bearer_token,
            wait_on_rate_limit: true,
        }
    }

    /// When enabled (the default) a rate-limited request sleeps until the
    /// window resets and is sent again. Disabled, every failure is final.
    pub fn with_wait_on_rate_limit(mut self, wait: bool) -> Self {
        self.wait_on_rate_limit = wait;
        self
    }

    pub fn api(&self) -> &TwitterApiClient {
        &self.api
    }

    /// Rate-limited requests sleep until the window named by the reset
    /// header ends; transient failures back off briefly.
    fn recovery_strategy(&self) -> RecoveryStrategy {
        if self.wait_on_rate_limit {
            RecoveryStrategy::RetryWithBackoff {
                max_attempts: MAX_ATTEMPTS,
                initial_delay: Duration::from_secs(1),
                max_delay: rate_limiter::TWITTER_RATE_WINDOW,
            }
        } else {
            RecoveryStrategy::Fail
        }
    }

    async fn with_recovery<T, F, Fut>(&self, operation: F) -> Result<T, CoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        match ErrorRecovery::apply_strategy(self.recovery_strategy(), operation).await {
            RecoveryResult::Recovered(value) => Ok(value),
            RecoveryResult::Failed(error) => Err(error),
            RecoveryResult::Skipped => Err(CoreError::Internal {
                message: "Twitter request was skipped".to_string(),
            }),
        }
    }
}

impl TrendSource for TwitterClient {
    async fn list_trends(&self, woeid: Option<u64>) -> Result<Vec<Trend>, CoreError> {
        let woeid = woeid.unwrap_or(WORLDWIDE_WOEID);
        let trends = self
            .with_recovery(|| self.api.get_trends(&self.bearer_token, woeid))
            .await?;

        Ok(trends.into_iter().map(Trend::from).collect())
    }

    async fn search_top_posts(
        &self,
        trend_name: &str,
        limit: u32,
    ) -> Result<Vec<RawTextUnit>, CoreError> {
        let tweets = self
            .with_recovery(|| self.api.search_popular(&self.bearer_token, trend_name, limit))
            .await?;

        let total = tweets.len();
        let posts: Vec<RawTextUnit> = tweets
            .iter()
            .filter_map(|tweet| tweet.content().map(str::to_string))
            .take(limit as usize)
            .collect();

        if posts.len() < total.min(limit as usize) {
            warn!(
                "{} tweets for '{}' had no text",
                total.min(limit as usize) - posts.len(),
                trend_name
            );
        }
        Ok(posts)
    }
}
