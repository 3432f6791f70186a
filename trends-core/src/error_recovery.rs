//! Error recovery strategies for collaborator calls.
//!
//! Collection waits out platform rate limits; scoring optionally retries a
//! document before the trend is given up on.

use crate::{CoreError, ErrorExt};
use std::future::Future;
use std::time::Duration;
use tracing::info;

/// Recovery strategy for handling errors
#[derive(Debug, Clone, PartialEq)]
pub enum RecoveryStrategy {
    /// Retry the operation with exponential backoff
    RetryWithBackoff {
        max_attempts: usize,
        initial_delay: Duration,
        max_delay: Duration,
    },
    /// Skip the operation and continue
    Skip,
    /// Run once and propagate any failure
    Fail,
}

impl RecoveryStrategy {
    /// Backoff retry, or a single attempt when `max_attempts` is 1 or less.
    pub fn attempts(max_attempts: usize, initial_delay: Duration, max_delay: Duration) -> Self {
        if max_attempts <= 1 {
            RecoveryStrategy::Fail
        } else {
            RecoveryStrategy::RetryWithBackoff {
                max_attempts,
                initial_delay,
                max_delay,
            }
        }
    }
}

/// Result of an error recovery attempt
#[derive(Debug)]
pub enum RecoveryResult<T, E = CoreError> {
    /// The operation succeeded, possibly after retries
    Recovered(T),
    /// The operation was not attempted
    Skipped,
    /// Recovery failed, error should be propagated
    Failed(E),
}

impl<T, E> RecoveryResult<T, E> {
    pub fn is_recovered(&self) -> bool {
        matches!(self, RecoveryResult::Recovered(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, RecoveryResult::Skipped)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, RecoveryResult::Failed(_))
    }

    /// Converts back into a plain result; a skipped operation yields `None`.
    pub fn into_result(self) -> Result<Option<T>, E> {
        match self {
            RecoveryResult::Recovered(value) => Ok(Some(value)),
            RecoveryResult::Skipped => Ok(None),
            RecoveryResult::Failed(error) => Err(error),
        }
    }
}

/// Error recovery handler that provides strategies for different error types
pub struct ErrorRecovery;

impl ErrorRecovery {
    /// Determine the appropriate recovery strategy for a given error
    pub fn determine_strategy(error: &CoreError) -> RecoveryStrategy {
        match error {
            // Platform rate limits reset on a fixed 15 minute window
            CoreError::Collection(crate::CollectionError::RateLimitExceeded { retry_after }) => {
                RecoveryStrategy::RetryWithBackoff {
                    max_attempts: 2,
                    initial_delay: Duration::from_secs(*retry_after),
                    max_delay: Duration::from_secs(900),
                }
            }

            CoreError::Network(_) | CoreError::Collection(_) | CoreError::Scoring(_) => {
                RecoveryStrategy::RetryWithBackoff {
                    max_attempts: 3,
                    initial_delay: Duration::from_secs(1),
                    max_delay: Duration::from_secs(30),
                }
            }

            // Nothing to average; rerunning the same snapshot will not help
            CoreError::EmptyAggregate { .. } => RecoveryStrategy::Fail,

            CoreError::Config(_) => RecoveryStrategy::Fail,

            CoreError::NotFound { .. } => RecoveryStrategy::Skip,

            CoreError::Io(_) | CoreError::Serialization(_) | CoreError::Internal { .. } => {
                RecoveryStrategy::Fail
            }
        }
    }

    /// Apply the recovery strategy to an operation
    pub async fn apply_strategy<F, T, E, Fut>(
        strategy: RecoveryStrategy,
        mut operation: F,
    ) -> RecoveryResult<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: ErrorExt,
    {
        match strategy {
            RecoveryStrategy::RetryWithBackoff {
                max_attempts,
                initial_delay,
                max_delay,
            } => Self::retry_with_backoff(operation, max_attempts, initial_delay, max_delay).await,
            RecoveryStrategy::Skip => RecoveryResult::Skipped,
            RecoveryStrategy::Fail => match operation().await {
                Ok(value) => RecoveryResult::Recovered(value),
                Err(error) => RecoveryResult::Failed(error),
            },
        }
    }

    /// Retry an operation with exponential backoff
    async fn retry_with_backoff<F, T, E, Fut>(
        mut operation: F,
        max_attempts: usize,
        initial_delay: Duration,
        max_delay: Duration,
    ) -> RecoveryResult<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: ErrorExt,
    {
        let mut attempt = 0;
        let mut delay = initial_delay;

        loop {
            match operation().await {
                Ok(result) => return RecoveryResult::Recovered(result),
                Err(error) => {
                    attempt += 1;

                    if attempt >= max_attempts || !error.is_retryable() {
                        return RecoveryResult::Failed(error);
                    }

                    // Use the error's suggested retry delay if available
                    if let Some(retry_delay) = error.retry_after() {
                        delay = retry_delay;
                    }

                    if delay > max_delay {
                        delay = max_delay;
                    }

                    info!(
                        "Recovery attempt {}/{} failed. Retrying after {:?}: {}",
                        attempt,
                        max_attempts,
                        delay,
                        error.user_friendly_message()
                    );

                    tokio::time::sleep(delay).await;

                    delay = std::cmp::min(delay * 2, max_delay);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CollectionError, ScoringError};
    use std::cell::Cell;

    #[tokio::test]
    async fn test_retry_with_backoff_failure() {
        let strategy = RecoveryStrategy::RetryWithBackoff {
            max_attempts: 2,
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(20),
        };

        let result: RecoveryResult<&str> = ErrorRecovery::apply_strategy(strategy, || async {
            Err(CoreError::Collection(CollectionError::RequestTimeout))
        })
        .await;

        assert!(result.is_failed());
    }

    #[tokio::test]
    async fn test_retry_recovers_after_transient_failure() {
        let calls = Cell::new(0);
        let strategy = RecoveryStrategy::RetryWithBackoff {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        };

        let result: RecoveryResult<u32, ScoringError> =
            ErrorRecovery::apply_strategy(strategy, || {
                calls.set(calls.get() + 1);
                let attempt = calls.get();
                async move {
                    if attempt < 2 {
                        Err(ScoringError::ServiceUnavailable { status_code: 503 })
                    } else {
                        Ok(attempt)
                    }
                }
            })
            .await;

        assert!(result.is_recovered());
        assert_eq!(calls.get(), 2);
    }

    #[tokio::test]
    async fn test_non_retryable_error_fails_immediately() {
        let calls = Cell::new(0);
        let strategy = RecoveryStrategy::RetryWithBackoff {
            max_attempts: 5,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        };

        let result: RecoveryResult<(), ScoringError> =
            ErrorRecovery::apply_strategy(strategy, || {
                calls.set(calls.get() + 1);
                async { Err(ScoringError::EmptyDocument) }
            })
            .await;

        assert!(result.is_failed());
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn test_skip_strategy() {
        let strategy = RecoveryStrategy::Skip;
        let result: RecoveryResult<&str> = ErrorRecovery::apply_strategy(strategy, || async {
            Err(CoreError::NotFound {
                resource: "Data/trends_data_1.json".to_string(),
            })
        })
        .await;

        assert!(result.is_skipped());
        assert!(matches!(result.into_result(), Ok(None)));
    }

    #[test]
    fn test_single_attempt_means_no_retry() {
        let strategy =
            RecoveryStrategy::attempts(1, Duration::from_secs(1), Duration::from_secs(10));
        assert_eq!(strategy, RecoveryStrategy::Fail);

        let strategy =
            RecoveryStrategy::attempts(3, Duration::from_secs(1), Duration::from_secs(10));
        assert!(matches!(
            strategy,
            RecoveryStrategy::RetryWithBackoff {
                max_attempts: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_determine_strategy() {
        let rate_limited = CoreError::Collection(CollectionError::RateLimitExceeded {
            retry_after: 120,
        });
        assert_eq!(
            ErrorRecovery::determine_strategy(&rate_limited),
            RecoveryStrategy::RetryWithBackoff {
                max_attempts: 2,
                initial_delay: Duration::from_secs(120),
                max_delay: Duration::from_secs(900),
            }
        );

        let config_error = CoreError::Config(crate::ConfigError::MissingField {
            field: "test".to_string(),
        });
        assert_eq!(
            ErrorRecovery::determine_strategy(&config_error),
            RecoveryStrategy::Fail
        );

        let empty = CoreError::EmptyAggregate { attempted: 3 };
        assert_eq!(
            ErrorRecovery::determine_strategy(&empty),
            RecoveryStrategy::Fail
        );

        let missing = CoreError::NotFound {
            resource: "Data/trends_data_default.json".to_string(),
        };
        assert_eq!(
            ErrorRecovery::determine_strategy(&missing),
            RecoveryStrategy::Skip
        );
    }
}
