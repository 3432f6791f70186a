pub mod report;

mod tests;

use preprocessing::CorpusBuilder;
use result_store::ResultStore;
use sentiment_analyser::{SentimentAggregator, SentimentScorer};
use std::path::PathBuf;
use tracing::{error, info, warn};
use trends_core::{AggregateResult, AppConfig, CoreError, EntitySentiments, ErrorExt, Snapshot};
use twitter_client::{collect_snapshot, TrendSource};

/// One region's batch run: collect a snapshot, then score it by trend or as a whole.
///
/// Every stage reads its input from and writes its output to the [`ResultStore`],
/// so stages can run in separate processes.
pub struct TrendPipeline {
    store: ResultStore,
    corpus_builder: CorpusBuilder,
    woeid: Option<u64>,
    tweets_per_trend: u32,
}

impl TrendPipeline {
    pub fn new(store: ResultStore, woeid: Option<u64>, tweets_per_trend: u32) -> Self {
        Self {
            store,
            corpus_builder: CorpusBuilder::default(),
            woeid,
            tweets_per_trend,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            ResultStore::new(config.data_dir.clone()),
            config.woeid,
            config.tweets_per_trend,
        )
    }

    pub fn woeid(&self) -> Option<u64> {
        self.woeid
    }

    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    /// Collects the current trends of the region and saves them as its snapshot.
    pub async fn collect<S: TrendSource>(&self, source: &S) -> Result<PathBuf, CoreError> {
        let snapshot = collect_snapshot(source, self.woeid, self.tweets_per_trend)
            .await
            .map_err(|e| {
                error!("Collection aborted, no snapshot written");
                e.log_error();
                e
            })?;

        if snapshot.is_empty() {
            warn!("No trends returned for woeid {:?}", self.woeid);
        }
        self.store.save_snapshot(self.woeid, &snapshot).await
    }

    /// Scores every trend of the saved snapshot and saves the per-trend result.
    ///
    /// Trends that fail to score are left out; when none succeeds nothing is written.
    pub async fn analyse_by_trends<S: SentimentScorer>(
        &self,
        aggregator: &SentimentAggregator<S>,
    ) -> Result<AggregateResult, CoreError> {
        let snapshot = self.store.load_snapshot(self.woeid).await?;
        let corpora = self.corpus_builder.build_by_group(&snapshot);

        let result = aggregator.aggregate(&corpora).await.map_err(|e| {
            error!("Sentiment by trends failed, no result written");
            e.log_error();
            e
        })?;

        for trend in &result.skipped {
            warn!("Trend '{}' was skipped", trend);
        }
        self.store.save_by_trends(self.woeid, &result).await?;
        Ok(result)
    }

    /// Scores the entity sentiment of all posts of the saved snapshot as one document.
    pub async fn analyse_all<S: SentimentScorer>(
        &self,
        aggregator: &SentimentAggregator<S>,
    ) -> Result<EntitySentiments, CoreError> {
        let snapshot = self.store.load_snapshot(self.woeid).await?;
        let corpus = self.all_in_one(&snapshot);

        let entities = aggregator.aggregate_all(&corpus).await.map_err(|e| {
            error!("Entity sentiment failed, no result written");
            e.log_error();
            e
        })?;

        self.store.save_entities(self.woeid, &entities).await?;
        Ok(entities)
    }

    fn all_in_one(&self, snapshot: &Snapshot) -> String {
        let corpus = self.corpus_builder.build_all_in_one(snapshot);
        info!(
            "Built one document of {} posts ({} bytes)",
            snapshot.units().count(),
            corpus.len()
        );
        corpus
    }
}
