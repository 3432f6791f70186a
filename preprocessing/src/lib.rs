//! Turns raw post text into the cleaned corpora sent for sentiment scoring.

pub mod cleaner;
pub mod corpus;

pub use cleaner::TextCleaner;
pub use corpus::CorpusBuilder;
