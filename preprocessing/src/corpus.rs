use crate::TextCleaner;
use std::collections::BTreeMap;
use tracing::{debug, info};
use trends_core::{CleanedCorpus, RawTextUnit, Snapshot};

/// Assembles cleaned posts into the documents sent for scoring.
#[derive(Debug, Clone, Default)]
pub struct CorpusBuilder {
    cleaner: TextCleaner,
}

impl CorpusBuilder {
    pub fn new(cleaner: TextCleaner) -> Self {
        Self { cleaner }
    }

    /// Cleans every unit and joins them with newlines.
    pub fn build_flat<'a, I>(&self, units: I) -> CleanedCorpus
    where
        I: IntoIterator<Item = &'a RawTextUnit>,
    {
        let cleaned: Vec<String> = units
            .into_iter()
            .map(|unit| self.cleaner.clean(unit))
            .collect();

        cleaned.join("\n").trim().to_string()
    }

    /// One corpus per trend. Every trend of the snapshot gets an entry,
    /// even when nothing is left of its posts after cleaning.
    pub fn build_by_group(&self, snapshot: &Snapshot) -> BTreeMap<String, CleanedCorpus> {
        info!("Cleaning {} trends", snapshot.len());

        snapshot
            .iter()
            .map(|(trend, group)| {
                let corpus = self.build_flat(group.units());
                debug!(
                    "Trend '{}': {} posts cleaned into {} bytes",
                    trend,
                    group.len(),
                    corpus.len()
                );
                (trend.to_string(), corpus)
            })
            .collect()
    }

    /// Every post of every trend as a single corpus.
    pub fn build_all_in_one(&self, snapshot: &Snapshot) -> CleanedCorpus {
        info!("Cleaning all posts of {} trends as one corpus", snapshot.len());
        self.build_flat(snapshot.units())
    }
}
