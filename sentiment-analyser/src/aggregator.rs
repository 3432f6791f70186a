use crate::SentimentScorer;
use futures::stream::{self, StreamExt};
use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};
use trends_core::{
    AggregateResult, CleanedCorpus, CoreError, EntitySentiments, ErrorExt, ErrorRecovery,
    RecoveryResult, RecoveryStrategy, ScoringConfig, ScoringError, SentimentResult,
    TrendSentiment,
};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_MAX_CONCURRENCY: usize = 4;
const RETRY_INITIAL_DELAY: Duration = Duration::from_secs(1);
const RETRY_MAX_DELAY: Duration = Duration::from_secs(30);

/// Final state of one trend in [`SentimentAggregator::aggregate`].
///
/// Each trend goes `Pending -> Scoring -> Recorded | Skipped`; only recorded
/// trends take part in the totals.
#[derive(Debug, Clone)]
pub enum TrendOutcome {
    Recorded(TrendSentiment),
    Skipped { trend: String, error: ScoringError },
}

/// Drives a [`SentimentScorer`] over cleaned corpora and reduces the scores.
pub struct SentimentAggregator<S> {
    scorer: S,
    timeout: Duration,
    max_concurrency: usize,
    retry: RecoveryStrategy,
}

impl<S: SentimentScorer> SentimentAggregator<S> {
    /// Single attempt per document, 30 second timeout, 4 documents in flight.
    pub fn new(scorer: S) -> Self {
        Self {
            scorer,
            timeout: DEFAULT_TIMEOUT,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            retry: RecoveryStrategy::Fail,
        }
    }

    pub fn from_config(scorer: S, config: &ScoringConfig) -> Self {
        Self::new(scorer)
            .with_timeout(config.timeout())
            .with_max_concurrency(config.max_concurrency)
            .with_max_attempts(config.max_attempts)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.retry = RecoveryStrategy::attempts(max_attempts, RETRY_INITIAL_DELAY, RETRY_MAX_DELAY);
        self
    }

    /// Scores one corpus. Empty corpora are rejected without calling the service.
    pub async fn score_one(&self, corpus: &str) -> Result<SentimentResult, ScoringError> {
        if corpus.trim().is_empty() {
            return Err(ScoringError::EmptyDocument);
        }

        let result = self
            .call_scorer(|| self.scorer.analyze_sentiment(corpus))
            .await?;
        check_range(result)
    }

    /// Scores every trend and averages the successes.
    ///
    /// A trend whose scoring fails is skipped and does not stop the others.
    /// When no trend at all could be scored the result is
    /// [`CoreError::EmptyAggregate`].
    pub async fn aggregate(
        &self,
        corpora_by_trend: &BTreeMap<String, CleanedCorpus>,
    ) -> Result<AggregateResult, CoreError> {
        let attempted = corpora_by_trend.len();
        info!(
            "Scoring {} trends, at most {} at a time",
            attempted, self.max_concurrency
        );

        let outcomes: Vec<TrendOutcome> = stream::iter(corpora_by_trend)
            .map(|(trend, corpus)| self.score_trend(trend, corpus))
            .buffer_unordered(self.max_concurrency)
            .collect()
            .await;

        let mut trends = BTreeMap::new();
        let mut skipped = Vec::new();
        for outcome in outcomes {
            match outcome {
                TrendOutcome::Recorded(sentiment) => {
                    trends.insert(sentiment.trend.clone(), sentiment);
                }
                TrendOutcome::Skipped { trend, .. } => skipped.push(trend),
            }
        }
        skipped.sort();

        let totals = mean(trends.values()).ok_or(CoreError::EmptyAggregate { attempted })?;

        info!(
            "Scored {}/{} trends: overall score {:.3} magnitude {:.3}",
            trends.len(),
            attempted,
            totals.score,
            totals.magnitude
        );

        Ok(AggregateResult {
            trends,
            totals,
            skipped,
        })
    }

    /// Entity sentiment of one combined corpus, keyed by entity name.
    ///
    /// There is only one underlying call, so any failure fails the whole
    /// operation. When the service reports the same name more than once the
    /// first (most salient) entity is kept.
    pub async fn aggregate_all(&self, flat_corpus: &str) -> Result<EntitySentiments, CoreError> {
        if flat_corpus.trim().is_empty() {
            return Err(ScoringError::EmptyDocument.into());
        }

        info!("Scoring entity sentiment of {} bytes", flat_corpus.len());
        let entities = self
            .call_scorer(|| self.scorer.analyze_entity_sentiment(flat_corpus))
            .await?;

        let mut by_name = EntitySentiments::new();
        for entity in entities {
            by_name.entry(entity.name.clone()).or_insert(entity);
        }

        info!("Collected sentiment for {} entities", by_name.len());
        Ok(by_name)
    }

    async fn score_trend(&self, trend: &str, corpus: &str) -> TrendOutcome {
        debug!("Trend '{}': scoring", trend);

        match self.score_one(corpus).await {
            Ok(result) => {
                debug!(
                    "Trend '{}': recorded score {} magnitude {}",
                    trend, result.score, result.magnitude
                );
                TrendOutcome::Recorded(TrendSentiment::new(trend, result))
            }
            Err(error) => {
                warn!(
                    "Trend '{}': skipped, {} ({})",
                    trend,
                    error,
                    error.error_code()
                );
                TrendOutcome::Skipped {
                    trend: trend.to_string(),
                    error,
                }
            }
        }
    }

    /// Applies the timeout and retry policy to one collaborator call.
    async fn call_scorer<T, F, Fut>(&self, mut call: F) -> Result<T, ScoringError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ScoringError>>,
    {
        let timeout = self.timeout;
        let attempt = || {
            let pending = call();
            async move {
                tokio::time::timeout(timeout, pending)
                    .await
                    .unwrap_or(Err(ScoringError::RequestTimeout {
                        seconds: timeout.as_secs(),
                    }))
            }
        };

        match ErrorRecovery::apply_strategy(self.retry.clone(), attempt).await {
            RecoveryResult::Recovered(value) => Ok(value),
            RecoveryResult::Failed(error) => Err(error),
            RecoveryResult::Skipped => Err(ScoringError::InvalidResponse {
                details: "scoring call was skipped".to_string(),
            }),
        }
    }
}

fn check_range(result: SentimentResult) -> Result<SentimentResult, ScoringError> {
    let score_ok = (-1.0..=1.0).contains(&result.score);
    let magnitude_ok = result.magnitude.is_finite() && result.magnitude >= 0.0;

    if score_ok && magnitude_ok {
        Ok(result)
    } else {
        Err(ScoringError::InvalidResponse {
            details: format!(
                "score {} / magnitude {} out of range",
                result.score, result.magnitude
            ),
        })
    }
}

fn mean<'a, I>(sentiments: I) -> Option<SentimentResult>
where
    I: IntoIterator<Item = &'a TrendSentiment>,
{
    let (count, score, magnitude) = sentiments
        .into_iter()
        .fold((0usize, 0.0, 0.0), |(count, score, magnitude), s| {
            (count + 1, score + s.score, magnitude + s.magnitude)
        });

    if count == 0 {
        return None;
    }

    let count = count as f64;
    Some(SentimentResult::new(score / count, magnitude / count))
}
