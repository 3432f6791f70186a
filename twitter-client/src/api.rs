use crate::rate_limiter::{RateLimitConfig, RateLimiter};
use reqwest::header::HeaderMap;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, error, info, warn};
use trends_core::{CollectionError, CoreError, Trend};

pub const TWITTER_API_BASE: &str = "https://api.twitter.com/1.1";
/// Where On Earth id Twitter uses for worldwide trends.
pub const WORLDWIDE_WOEID: u64 = 1;

const DEFAULT_RETRY_AFTER_SECS: u64 = 15 * 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendsPlaceResponse {
    pub trends: Vec<TwitterTrend>,
    #[serde(default)]
    pub as_of: Option<String>,
    #[serde(default)]
    pub locations: Vec<TwitterLocation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwitterTrend {
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub tweet_volume: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwitterLocation {
    pub name: String,
    pub woeid: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub statuses: Vec<TweetData>,
}

/// The parts of a tweet the collector looks at; everything else is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TweetData {
    pub id_str: String,
    #[serde(default)]
    pub full_text: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

impl TweetData {
    /// Untruncated text when the API sent it.
    pub fn content(&self) -> Option<&str> {
        self.full_text.as_deref().or(self.text.as_deref())
    }
}

impl From<TwitterTrend> for Trend {
    fn from(trend: TwitterTrend) -> Self {
        Self {
            name: trend.name,
            query: trend.query,
            tweet_volume: trend.tweet_volume,
        }
    }
}

#[derive(Debug)]
pub struct TwitterApiClient {
    http_client: Client,
    trends_limiter: RateLimiter,
    search_limiter: RateLimiter,
    base_url: String,
}

impl TwitterApiClient {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, CoreError> {
        Self::with_base_url(TWITTER_API_BASE, user_agent, timeout)
    }

    pub fn with_base_url(
        base_url: &str,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, CoreError> {
        let http_client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http_client,
            trends_limiter: RateLimiter::new(RateLimitConfig::twitter_trends()),
            search_limiter: RateLimiter::new(RateLimitConfig::twitter_search()),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn make_request(
        &self,
        limiter: &RateLimiter,
        endpoint: &str,
        bearer_token: &str,
        query_params: &[(&str, &str)],
    ) -> Result<Response, CoreError> {
        let url = format!("{}{}", self.base_url, endpoint);

        let permit = limiter.acquire_permit().await;
        debug!(
            "Acquired rate limit permit for {} after {:?}",
            endpoint, permit.queue_wait_time
        );

        info!("Making Twitter API request: GET {}", endpoint);
        let response = self
            .http_client
            .get(&url)
            .bearer_auth(bearer_token)
            .query(query_params)
            .send()
            .await
            .map_err(|e| {
                error!("Network error for GET {}: {}", endpoint, e);
                if e.is_timeout() {
                    CollectionError::RequestTimeout
                } else {
                    CollectionError::Transport {
                        details: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if status.is_success() {
            debug!("Request successful: {} {}", status, endpoint);
            return Ok(response);
        }

        error!("Request failed with status: {} for {}", status, endpoint);
        if status == StatusCode::TOO_MANY_REQUESTS {
            limiter.record_rate_limited().await;
        }
        Err(status_error(status, response.headers(), endpoint).into())
    }

    /// Current trends for a location, most popular first.
    pub async fn get_trends(
        &self,
        bearer_token: &str,
        woeid: u64,
    ) -> Result<Vec<TwitterTrend>, CoreError> {
        let woeid_param = woeid.to_string();
        let response = self
            .make_request(
                &self.trends_limiter,
                "/trends/place.json",
                bearer_token,
                &[("id", woeid_param.as_str())],
            )
            .await
            .map_err(|e| match e {
                CoreError::Collection(CollectionError::ResourceNotFound { .. }) => {
                    CollectionError::LocationNotFound { woeid }.into()
                }
                other => other,
            })?;

        let places: Vec<TrendsPlaceResponse> = response.json().await.map_err(|e| {
            error!("Failed to parse trends: {}", e);
            CollectionError::InvalidResponse {
                details: format!("Failed to parse trends for woeid {}", woeid),
            }
        })?;

        let place = places
            .into_iter()
            .next()
            .ok_or(CollectionError::LocationNotFound { woeid })?;

        info!(
            "Retrieved {} trends for woeid {} (as of {})",
            place.trends.len(),
            woeid,
            place.as_of.as_deref().unwrap_or("unknown")
        );
        Ok(place.trends)
    }

    /// Most popular recent tweets matching `query`.
    pub async fn search_popular(
        &self,
        bearer_token: &str,
        query: &str,
        count: u32,
    ) -> Result<Vec<TweetData>, CoreError> {
        let count_param = count.to_string();
        let response = self
            .make_request(
                &self.search_limiter,
                "/search/tweets.json",
                bearer_token,
                &[
                    ("q", query),
                    ("result_type", "popular"),
                    ("count", count_param.as_str()),
                    ("tweet_mode", "extended"),
                ],
            )
            .await?;

        let search: SearchResponse = response.json().await.map_err(|e| {
            error!("Failed to parse search results: {}", e);
            CollectionError::InvalidResponse {
                details: format!("Failed to parse search results for '{}'", query),
            }
        })?;

        debug!("Retrieved {} tweets for '{}'", search.statuses.len(), query);
        Ok(search.statuses)
    }

    pub async fn get_rate_limit_status(
        &self,
    ) -> (
        crate::rate_limiter::RateLimitStatus,
        crate::rate_limiter::RateLimitStatus,
    ) {
        (
            self.trends_limiter.get_rate_limit_status().await,
            self.search_limiter.get_rate_limit_status().await,
        )
    }
}

/// Maps a non-success status of the Twitter API to a collection error.
pub fn status_error(status: StatusCode, headers: &HeaderMap, endpoint: &str) -> CollectionError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => {
            let retry_after = rate_limit_reset(headers).unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            warn!("Rate limited, retry after {} seconds", retry_after);
            CollectionError::RateLimitExceeded { retry_after }
        }
        StatusCode::UNAUTHORIZED => CollectionError::InvalidToken,
        StatusCode::FORBIDDEN => CollectionError::Forbidden {
            resource: endpoint.to_string(),
        },
        StatusCode::NOT_FOUND => CollectionError::ResourceNotFound {
            resource: endpoint.to_string(),
        },
        status if status.is_server_error() => CollectionError::ServerError {
            status_code: status.as_u16(),
        },
        status => CollectionError::InvalidResponse {
            details: format!("Unexpected status {}", status),
        },
    }
}

/// Seconds until the window in `x-rate-limit-reset` (a unix timestamp) ends.
fn rate_limit_reset(headers: &HeaderMap) -> Option<u64> {
    let reset_at = headers
        .get("x-rate-limit-reset")?
        .to_str()
        .ok()?
        .parse::<u64>()
        .ok()?;
    let now = SystemTime::now().duration_since(UNIX_EPOCH).ok()?.as_secs();
    Some(reset_at.saturating_sub(now).max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_parse_trends_place() {
        let body = r##"[{
            "trends": [
                {"name": "#Sanremo2020", "url": "http://twitter.com/search?q=%23Sanremo2020",
                 "promoted_content": null, "query": "%23Sanremo2020", "tweet_volume": 183204},
                {"name": "Amadeus", "url": "http://twitter.com/search?q=Amadeus",
                 "promoted_content": null, "query": "Amadeus", "tweet_volume": null}
            ],
            "as_of": "2020-02-05T20:46:31Z",
            "created_at": "2020-02-05T20:40:12Z",
            "locations": [{"name": "Rome", "woeid": 721943}]
        }]"##;

        let places: Vec<TrendsPlaceResponse> = serde_json::from_str(body).unwrap();
        assert_eq!(places[0].trends.len(), 2);
        assert_eq!(places[0].locations[0].woeid, 721943);

        let trend: Trend = places[0].trends[0].clone().into();
        assert_eq!(trend.name, "#Sanremo2020");
        assert_eq!(trend.tweet_volume, Some(183204));
        assert_eq!(places[0].trends[1].tweet_volume, None);
    }

    #[test]
    fn test_parse_search_prefers_full_text() {
        let body = r#"{
            "statuses": [
                {"id_str": "1", "full_text": "the whole tweet", "text": "the whole…",
                 "created_at": "Wed Feb 05 20:40:12 +0000 2020", "place": null},
                {"id_str": "2", "text": "short one"},
                {"id_str": "3"}
            ],
            "search_metadata": {"count": 15}
        }"#;

        let search: SearchResponse = serde_json::from_str(body).unwrap();
        let texts: Vec<Option<&str>> = search.statuses.iter().map(TweetData::content).collect();
        assert_eq!(
            texts,
            vec![Some("the whole tweet"), Some("short one"), None]
        );
    }

    #[test]
    fn test_status_error_mapping() {
        let headers = HeaderMap::new();
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, &headers, "/trends/place.json"),
            CollectionError::InvalidToken
        ));
        assert!(matches!(
            status_error(StatusCode::FORBIDDEN, &headers, "/search/tweets.json"),
            CollectionError::Forbidden { ref resource } if resource == "/search/tweets.json"
        ));
        assert!(matches!(
            status_error(StatusCode::BAD_GATEWAY, &headers, "/trends/place.json"),
            CollectionError::ServerError { status_code: 502 }
        ));
        assert!(matches!(
            status_error(StatusCode::TOO_MANY_REQUESTS, &headers, "/search/tweets.json"),
            CollectionError::RateLimitExceeded { retry_after: 900 }
        ));
        assert!(matches!(
            status_error(StatusCode::NOT_FOUND, &headers, "/trends/place.json"),
            CollectionError::ResourceNotFound { ref resource } if resource == "/trends/place.json"
        ));
        assert!(matches!(
            status_error(StatusCode::BAD_REQUEST, &headers, "/trends/place.json"),
            CollectionError::InvalidResponse { .. }
        ));
    }

    #[test]
    fn test_rate_limit_reset_header() {
        let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs();
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-rate-limit-reset",
            HeaderValue::from_str(&(now + 120).to_string()).unwrap(),
        );

        let wait = rate_limit_reset(&headers).unwrap();
        assert!((119..=120).contains(&wait));

        headers.insert("x-rate-limit-reset", HeaderValue::from_static("0"));
        assert_eq!(rate_limit_reset(&headers), Some(1));
    }

    #[tokio::test]
    async fn test_api_client_creation() {
        let client = TwitterApiClient::new("trendsai-test/1.0", Duration::from_secs(5)).unwrap();
        let (trends, search) = client.get_rate_limit_status().await;
        assert_eq!(trends.requests_per_window, 75);
        assert_eq!(search.requests_per_window, 450);
        assert_eq!(client.base_url, TWITTER_API_BASE);
    }
}
