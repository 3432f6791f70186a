pub mod aggregator;
pub mod language_service;
pub mod scorer;

pub use aggregator::{SentimentAggregator, TrendOutcome};
pub use language_service::{Credentials, LanguageServiceClient};
pub use scorer::SentimentScorer;
