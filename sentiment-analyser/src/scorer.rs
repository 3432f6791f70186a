use trends_core::{EntityRecord, ScoringError, SentimentResult};

/// A service that turns a document into sentiment scores.
///
/// Documents are plain UTF-8 text. Implementations report every failure of a
/// single call as a [`ScoringError`]; deciding whether that is fatal is left
/// to the caller.
pub trait SentimentScorer {
    async fn analyze_sentiment(&self, text: &str) -> Result<SentimentResult, ScoringError>;

    /// Entities detected in the document, most salient first.
    async fn analyze_entity_sentiment(&self, text: &str)
        -> Result<Vec<EntityRecord>, ScoringError>;
}

impl<S: SentimentScorer> SentimentScorer for &S {
    async fn analyze_sentiment(&self, text: &str) -> Result<SentimentResult, ScoringError> {
        (**self).analyze_sentiment(text).await
    }

    async fn analyze_entity_sentiment(
        &self,
        text: &str,
    ) -> Result<Vec<EntityRecord>, ScoringError> {
        (**self).analyze_entity_sentiment(text).await
    }
}
