use crate::error::*;
use crate::error_recovery::{ErrorRecovery, RecoveryStrategy};
use std::time::Duration;
use tracing::{error, info, warn};

pub trait ErrorExt {
    fn log_error(&self) -> &Self;
    fn log_warn(&self) -> &Self;
    fn is_retryable(&self) -> bool;
    fn retry_after(&self) -> Option<Duration>;
    fn user_friendly_message(&self) -> String;
    fn error_code(&self) -> String;
}

impl ErrorExt for CoreError {
    fn log_error(&self) -> &Self {
        error!("CoreError: {}", self);
        match self {
            CoreError::Collection(e) => {
                error!("Collection error details: {:?}", e);
            }
            CoreError::Scoring(e) => {
                error!("Scoring error details: {:?}", e);
            }
            CoreError::Config(e) => {
                error!("Configuration error details: {:?}", e);
            }
            _ => {}
        }
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("CoreError (warning): {}", self);
        self
    }

    fn is_retryable(&self) -> bool {
        match self {
            CoreError::Collection(e) => e.is_retryable(),
            CoreError::Scoring(e) => e.is_retryable(),
            CoreError::Network(_) => true,
            _ => false,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            CoreError::Collection(e) => e.retry_after(),
            CoreError::Scoring(e) => e.retry_after(),
            _ if self.is_retryable() => Some(Duration::from_secs(5)), // Default retry delay
            _ => None,
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            CoreError::Collection(e) => e.user_friendly_message(),
            CoreError::Scoring(e) => e.user_friendly_message(),
            CoreError::Config(e) => e.user_friendly_message(),
            CoreError::Network(_) => {
                "Network connection error. Please check your internet connection.".to_string()
            }
            CoreError::EmptyAggregate { attempted } => format!(
                "None of the {} trends could be scored, no result was written.",
                attempted
            ),
            CoreError::NotFound { resource } => format!("Could not find: {}", resource),
            _ => "An unexpected error occurred. Please try again later.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            CoreError::Collection(_) => "COLLECTION".to_string(),
            CoreError::Scoring(_) => "SCORING".to_string(),
            CoreError::Config(_) => "CONFIG".to_string(),
            CoreError::Io(_) => "IO".to_string(),
            CoreError::Serialization(_) => "SERIALIZATION".to_string(),
            CoreError::Network(_) => "NETWORK".to_string(),
            CoreError::EmptyAggregate { .. } => "EMPTY_AGGREGATE".to_string(),
            CoreError::NotFound { .. } => "NOT_FOUND".to_string(),
            CoreError::Internal { .. } => "INTERNAL".to_string(),
        }
    }
}

impl ErrorExt for CollectionError {
    fn log_error(&self) -> &Self {
        error!("CollectionError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("CollectionError (warning): {}", self);
        self
    }

    fn is_retryable(&self) -> bool {
        match self {
            CollectionError::RateLimitExceeded { .. } => true,
            CollectionError::RequestTimeout => true,
            CollectionError::ServerError { status_code } => *status_code >= 500,
            CollectionError::Transport { .. } => true,
            _ => false,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            CollectionError::RateLimitExceeded { retry_after } => {
                Some(Duration::from_secs(*retry_after))
            }
            _ if self.is_retryable() => Some(Duration::from_secs(30)),
            _ => None,
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            CollectionError::AuthenticationFailed { .. } => {
                "Twitter authentication failed. Please check your API keys.".to_string()
            }
            CollectionError::RateLimitExceeded { retry_after } => format!(
                "Too many requests. Please wait {} seconds before trying again.",
                retry_after
            ),
            CollectionError::Forbidden { resource } => format!(
                "Access denied to {}. Your app may not have access to this endpoint.",
                resource
            ),
            CollectionError::LocationNotFound { woeid } => {
                format!("Twitter has no trends for location {}.", woeid)
            }
            CollectionError::InvalidToken => {
                "Twitter bearer token is invalid. Please regenerate it.".to_string()
            }
            CollectionError::RequestTimeout => {
                "Request to Twitter timed out. Please try again.".to_string()
            }
            _ => "Twitter API error occurred. Please try again later.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            CollectionError::AuthenticationFailed { .. } => "TWITTER_AUTH_FAILED".to_string(),
            CollectionError::RateLimitExceeded { .. } => "TWITTER_RATE_LIMIT".to_string(),
            CollectionError::Forbidden { .. } => "TWITTER_FORBIDDEN".to_string(),
            CollectionError::LocationNotFound { .. } => "TWITTER_LOCATION_NOT_FOUND".to_string(),
            CollectionError::ResourceNotFound { .. } => "TWITTER_NOT_FOUND".to_string(),
            CollectionError::InvalidToken => "TWITTER_INVALID_TOKEN".to_string(),
            CollectionError::RequestTimeout => "TWITTER_TIMEOUT".to_string(),
            CollectionError::InvalidResponse { .. } => "TWITTER_INVALID_RESPONSE".to_string(),
            CollectionError::ServerError { .. } => "TWITTER_SERVER_ERROR".to_string(),
            CollectionError::Transport { .. } => "TWITTER_TRANSPORT".to_string(),
        }
    }
}

impl ErrorExt for ScoringError {
    fn log_error(&self) -> &Self {
        error!("ScoringError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("ScoringError (warning): {}", self);
        self
    }

    fn is_retryable(&self) -> bool {
        matches!(
            self,
            ScoringError::QuotaExceeded { .. }
                | ScoringError::ServiceUnavailable { .. }
                | ScoringError::RequestTimeout { .. }
                | ScoringError::Transport { .. }
        )
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            ScoringError::QuotaExceeded { retry_after } => Some(Duration::from_secs(*retry_after)),
            _ if self.is_retryable() => Some(Duration::from_secs(2)),
            _ => None,
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            ScoringError::AuthenticationFailed { .. } => {
                "Natural Language API rejected the credentials. Please check the API key."
                    .to_string()
            }
            ScoringError::QuotaExceeded { .. } => {
                "Natural Language API quota exhausted. Please wait before trying again."
                    .to_string()
            }
            ScoringError::RequestTimeout { seconds } => {
                format!("Sentiment analysis did not answer within {} seconds.", seconds)
            }
            ScoringError::Rejected { message, .. } => {
                format!("The text could not be analysed: {}", message)
            }
            ScoringError::EmptyDocument => "There is no text left to analyse.".to_string(),
            _ => "Sentiment analysis service error. Please try again later.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            ScoringError::AuthenticationFailed { .. } => "SCORING_AUTH_FAILED".to_string(),
            ScoringError::QuotaExceeded { .. } => "SCORING_QUOTA_EXCEEDED".to_string(),
            ScoringError::ServiceUnavailable { .. } => "SCORING_UNAVAILABLE".to_string(),
            ScoringError::RequestTimeout { .. } => "SCORING_TIMEOUT".to_string(),
            ScoringError::Rejected { .. } => "SCORING_REJECTED".to_string(),
            ScoringError::EmptyDocument => "SCORING_EMPTY_DOCUMENT".to_string(),
            ScoringError::InvalidResponse { .. } => "SCORING_INVALID_RESPONSE".to_string(),
            ScoringError::Transport { .. } => "SCORING_TRANSPORT".to_string(),
        }
    }
}

impl ErrorExt for ConfigError {
    fn log_error(&self) -> &Self {
        error!("ConfigError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("ConfigError (warning): {}", self);
        self
    }

    fn is_retryable(&self) -> bool {
        false // Config errors are typically not retryable
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }

    fn user_friendly_message(&self) -> String {
        match self {
            ConfigError::FileNotFound { path } => {
                format!("Configuration file '{}' not found.", path)
            }
            ConfigError::MissingField { field } => {
                format!("Required configuration field '{}' is missing.", field)
            }
            ConfigError::InvalidValue { field, .. } => {
                format!("Invalid value for configuration field '{}'.", field)
            }
            ConfigError::Parse(_) => {
                "Configuration file format is invalid. Please check the settings.".to_string()
            }
        }
    }

    fn error_code(&self) -> String {
        match self {
            ConfigError::FileNotFound { .. } => "CONFIG_FILE_NOT_FOUND".to_string(),
            ConfigError::MissingField { .. } => "CONFIG_MISSING_FIELD".to_string(),
            ConfigError::InvalidValue { .. } => "CONFIG_INVALID_VALUE".to_string(),
            ConfigError::Parse(_) => "CONFIG_PARSE_ERROR".to_string(),
        }
    }
}

pub struct ErrorReporter {
    report_errors: bool,
    report_warnings: bool,
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self {
            report_errors: true,
            report_warnings: true,
        }
    }

    pub fn with_error_reporting(mut self, enabled: bool) -> Self {
        self.report_errors = enabled;
        self
    }

    pub fn with_warning_reporting(mut self, enabled: bool) -> Self {
        self.report_warnings = enabled;
        self
    }

    pub fn report_error(&self, error: &CoreError) {
        if self.report_errors {
            error.log_error();
            info!("Error code: {}", error.error_code());
            info!("User message: {}", error.user_friendly_message());

            match ErrorRecovery::determine_strategy(error) {
                RecoveryStrategy::RetryWithBackoff { initial_delay, .. } => {
                    info!("Running again may succeed after {:?}", initial_delay);
                }
                RecoveryStrategy::Skip => info!("The failed step can be skipped"),
                RecoveryStrategy::Fail => {}
            }
        }
    }

    pub fn report_warning(&self, error: &CoreError) {
        if self.report_warnings {
            error.log_warn();
        }
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new()
    }
}
