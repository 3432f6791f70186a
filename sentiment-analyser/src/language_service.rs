use crate::SentimentScorer;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, warn};
use trends_core::{
    ConfigError, CoreError, EntityRecord, ScoringConfig, ScoringError, SentimentResult,
};

const DOCUMENT_TYPE: &str = "PLAIN_TEXT";
// Offsets are never used, so UTF-8 is always the right width.
const ENCODING_TYPE: &str = "UTF8";
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// How requests to the Natural Language API are authorized.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// API key sent as the `key` query parameter
    ApiKey(String),
    /// OAuth2 access token sent as a bearer header
    AccessToken(String),
}

impl Credentials {
    /// Prefers an access token over an API key when both are configured.
    pub fn from_config(config: &ScoringConfig) -> Result<Self, ConfigError> {
        match (&config.access_token, &config.api_key) {
            (Some(token), _) => Ok(Credentials::AccessToken(token.clone())),
            (None, Some(key)) => Ok(Credentials::ApiKey(key.clone())),
            (None, None) => Err(ConfigError::MissingField {
                field: "scoring.api_key".to_string(),
            }),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeRequest<'a> {
    document: Document<'a>,
    encoding_type: &'static str,
}

#[derive(Debug, Serialize)]
struct Document<'a> {
    #[serde(rename = "type")]
    document_type: &'static str,
    content: &'a str,
}

// Zero-valued fields are omitted by the API, hence the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiSentiment {
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub magnitude: f64,
}

impl From<ApiSentiment> for SentimentResult {
    fn from(sentiment: ApiSentiment) -> Self {
        SentimentResult::new(sentiment.score, sentiment.magnitude)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeSentimentResponse {
    #[serde(default)]
    pub document_sentiment: ApiSentiment,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiEntity {
    pub name: String,
    #[serde(rename = "type", default)]
    pub entity_type: Option<String>,
    #[serde(default)]
    pub salience: f64,
    #[serde(default)]
    pub sentiment: ApiSentiment,
}

impl From<ApiEntity> for EntityRecord {
    fn from(entity: ApiEntity) -> Self {
        Self {
            name: entity.name,
            entity_type: entity.entity_type,
            salience: entity.salience,
            sentiment: entity.sentiment.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeEntitySentimentResponse {
    #[serde(default)]
    pub entities: Vec<ApiEntity>,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
}

/// Client for the Cloud Natural Language REST API.
#[derive(Debug)]
pub struct LanguageServiceClient {
    http_client: Client,
    endpoint: String,
    credentials: Credentials,
    timeout: Duration,
}

impl LanguageServiceClient {
    pub fn new(
        endpoint: &str,
        credentials: Credentials,
        timeout: Duration,
    ) -> Result<Self, CoreError> {
        let http_client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            credentials,
            timeout,
        })
    }

    pub fn from_config(config: &ScoringConfig) -> Result<Self, CoreError> {
        let credentials = Credentials::from_config(config)?;
        Self::new(&config.endpoint, credentials, config.timeout())
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/v1/documents:{}", self.endpoint, method)
    }

    async fn call<R: DeserializeOwned>(&self, method: &str, text: &str) -> Result<R, ScoringError> {
        let request = AnalyzeRequest {
            document: Document {
                document_type: DOCUMENT_TYPE,
                content: text,
            },
            encoding_type: ENCODING_TYPE,
        };

        let mut request_builder = self.http_client.post(self.method_url(method)).json(&request);
        request_builder = match &self.credentials {
            Credentials::ApiKey(key) => request_builder.query(&[("key", key.as_str())]),
            Credentials::AccessToken(token) => request_builder.bearer_auth(token),
        };

        debug!("Calling {} with {} bytes of text", method, text.len());
        let response = request_builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ScoringError::RequestTimeout {
                    seconds: self.timeout.as_secs(),
                }
            } else {
                error!("Network error calling {}: {}", method, e);
                ScoringError::Transport {
                    details: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.parse::<u64>().ok());
            let body = response.text().await.unwrap_or_default();
            let error = status_error(status, &body, retry_after);
            warn!("{} failed with status {}: {}", method, status, error);
            return Err(error);
        }

        response.json::<R>().await.map_err(|e| {
            error!("Failed to parse {} response: {}", method, e);
            ScoringError::InvalidResponse {
                details: format!("Failed to parse {} response", method),
            }
        })
    }
}

/// Maps a non-success HTTP status of the API to a scoring error.
pub fn status_error(status: StatusCode, body: &str, retry_after: Option<u64>) -> ScoringError {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .map(|parsed| parsed.error.message)
        .unwrap_or_else(|_| body.trim().to_string());

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ScoringError::AuthenticationFailed { reason: message }
        }
        StatusCode::TOO_MANY_REQUESTS => ScoringError::QuotaExceeded {
            retry_after: retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS),
        },
        status if status.is_server_error() => ScoringError::ServiceUnavailable {
            status_code: status.as_u16(),
        },
        status => ScoringError::Rejected {
            status_code: status.as_u16(),
            message,
        },
    }
}

impl SentimentScorer for LanguageServiceClient {
    async fn analyze_sentiment(&self, text: &str) -> Result<SentimentResult, ScoringError> {
        let response: AnalyzeSentimentResponse = self.call("analyzeSentiment", text).await?;
        info!(
            "Document sentiment: score {} magnitude {} (language {})",
            response.document_sentiment.score,
            response.document_sentiment.magnitude,
            response.language.as_deref().unwrap_or("unknown")
        );
        Ok(response.document_sentiment.into())
    }

    async fn analyze_entity_sentiment(
        &self,
        text: &str,
    ) -> Result<Vec<EntityRecord>, ScoringError> {
        let response: AnalyzeEntitySentimentResponse =
            self.call("analyzeEntitySentiment", text).await?;
        info!("Detected {} entities", response.entities.len());
        Ok(response.entities.into_iter().map(EntityRecord::from).collect())
    }
}
