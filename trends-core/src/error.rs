use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Collection error: {0}")]
    Collection(#[from] CollectionError),

    #[error("Scoring error: {0}")]
    Scoring(#[from] ScoringError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("No trend could be scored ({attempted} attempted)")]
    EmptyAggregate { attempted: usize },

    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Failures of the social-platform data-collection collaborator.
#[derive(Error, Debug, Clone)]
pub enum CollectionError {
    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("Rate limit exceeded. Retry after {retry_after} seconds")]
    RateLimitExceeded { retry_after: u64 },

    #[error("Forbidden access to resource: {resource}")]
    Forbidden { resource: String },

    #[error("No trends available for woeid {woeid}")]
    LocationNotFound { woeid: u64 },

    #[error("Resource not found: {resource}")]
    ResourceNotFound { resource: String },

    #[error("Invalid bearer token")]
    InvalidToken,

    #[error("Request timeout")]
    RequestTimeout,

    #[error("Invalid API response: {details}")]
    InvalidResponse { details: String },

    #[error("Server error: {status_code}")]
    ServerError { status_code: u16 },

    #[error("Transport failure: {details}")]
    Transport { details: String },
}

/// Failures of the sentiment scoring collaborator for one document.
#[derive(Error, Debug, Clone)]
pub enum ScoringError {
    #[error("Scoring service authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("Scoring quota exceeded. Retry after {retry_after} seconds")]
    QuotaExceeded { retry_after: u64 },

    #[error("Scoring service unavailable: {status_code}")]
    ServiceUnavailable { status_code: u16 },

    #[error("Scoring request timed out after {seconds} seconds")]
    RequestTimeout { seconds: u64 },

    #[error("Document rejected ({status_code}): {message}")]
    Rejected { status_code: u16, message: String },

    #[error("Document is empty")]
    EmptyDocument,

    #[error("Invalid response format: {details}")]
    InvalidResponse { details: String },

    #[error("Transport failure: {details}")]
    Transport { details: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("Configuration parsing error: {0}")]
    Parse(#[from] toml::de::Error),
}
