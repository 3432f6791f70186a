use oauth2::basic::BasicClient;
use oauth2::reqwest::async_http_client;
use oauth2::{AuthUrl, ClientId, ClientSecret, TokenResponse, TokenUrl};
use tracing::{error, info};
use trends_core::{CollectionError, ConfigError, CoreError, TwitterConfig};

const TWITTER_AUTHORIZE_URL: &str = "https://api.twitter.com/oauth/authorize";
const TWITTER_TOKEN_URL: &str = "https://api.twitter.com/oauth2/token";

/// App-only credentials for the Twitter API.
#[derive(Debug, Clone)]
pub enum AppCredentials {
    /// Token issued ahead of time, used as is
    BearerToken(String),
    /// Consumer key pair exchanged for a token with the client-credentials grant
    ConsumerKeys { api_key: String, api_secret_key: String },
}

impl AppCredentials {
    pub fn from_config(config: &TwitterConfig) -> Result<Self, ConfigError> {
        if let Some(token) = &config.bearer_token {
            return Ok(AppCredentials::BearerToken(token.clone()));
        }

        let api_key = config.api_key.clone().ok_or(ConfigError::MissingField {
            field: "twitter.api_key".to_string(),
        })?;
        let api_secret_key = config
            .api_secret_key
            .clone()
            .ok_or(ConfigError::MissingField {
                field: "twitter.api_secret_key".to_string(),
            })?;

        Ok(AppCredentials::ConsumerKeys {
            api_key,
            api_secret_key,
        })
    }

    /// Resolves the credentials to a bearer token, calling the token endpoint if needed.
    pub async fn bearer_token(&self) -> Result<String, CoreError> {
        match self {
            AppCredentials::BearerToken(token) => Ok(token.clone()),
            AppCredentials::ConsumerKeys {
                api_key,
                api_secret_key,
            } => exchange_client_credentials(api_key, api_secret_key).await,
        }
    }
}

fn oauth_client(api_key: &str, api_secret_key: &str) -> Result<BasicClient, CoreError> {
    let invalid_url = |e: oauth2::url::ParseError| ConfigError::InvalidValue {
        field: "twitter oauth url".to_string(),
        value: e.to_string(),
    };

    Ok(BasicClient::new(
        ClientId::new(api_key.to_string()),
        Some(ClientSecret::new(api_secret_key.to_string())),
        AuthUrl::new(TWITTER_AUTHORIZE_URL.to_string()).map_err(invalid_url)?,
        Some(TokenUrl::new(TWITTER_TOKEN_URL.to_string()).map_err(invalid_url)?),
    ))
}

async fn exchange_client_credentials(
    api_key: &str,
    api_secret_key: &str,
) -> Result<String, CoreError> {
    let client = oauth_client(api_key, api_secret_key)?;

    info!("Requesting app-only bearer token");
    let token = client
        .exchange_client_credentials()
        .request_async(async_http_client)
        .await
        .map_err(|e| {
            error!("Client credentials exchange failed: {}", e);
            CollectionError::AuthenticationFailed {
                reason: e.to_string(),
            }
        })?;

    Ok(token.access_token().secret().clone())
}
