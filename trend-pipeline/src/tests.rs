#[cfg(test)]
mod tests {
    use crate::TrendPipeline;
    use result_store::ResultStore;
    use sentiment_analyser::{SentimentAggregator, SentimentScorer};
    use std::collections::HashMap;
    use std::env;
    use trends_core::{
        CollectionError, CoreError, EntityRecord, RawTextUnit, ScoringError, SentimentResult,
        Snapshot, Trend,
    };
    use twitter_client::TrendSource;

    struct StubSource {
        posts: Vec<(&'static str, Vec<&'static str>)>,
        fail: bool,
    }

    impl TrendSource for StubSource {
        async fn list_trends(&self, _woeid: Option<u64>) -> Result<Vec<Trend>, CoreError> {
            if self.fail {
                return Err(CollectionError::InvalidToken.into());
            }
            Ok(self
                .posts
                .iter()
                .map(|(name, _)| Trend {
                    name: name.to_string(),
                    query: None,
                    tweet_volume: None,
                })
                .collect())
        }

        async fn search_top_posts(
            &self,
            trend_name: &str,
            limit: u32,
        ) -> Result<Vec<RawTextUnit>, CoreError> {
            Ok(self
                .posts
                .iter()
                .find(|(name, _)| *name == trend_name)
                .map(|(_, posts)| {
                    posts
                        .iter()
                        .take(limit as usize)
                        .map(|p| p.to_string())
                        .collect()
                })
                .unwrap_or_default())
        }
    }

    /// Scores cleaned documents from a fixed table; anything else is unavailable.
    #[derive(Default)]
    struct StubScorer {
        scores: HashMap<&'static str, (f64, f64)>,
    }

    impl SentimentScorer for StubScorer {
        async fn analyze_sentiment(&self, text: &str) -> Result<SentimentResult, ScoringError> {
            self.scores
                .get(text)
                .map(|(score, magnitude)| SentimentResult::new(*score, *magnitude))
                .ok_or(ScoringError::ServiceUnavailable { status_code: 503 })
        }

        async fn analyze_entity_sentiment(
            &self,
            text: &str,
        ) -> Result<Vec<EntityRecord>, ScoringError> {
            Ok(text
                .split_whitespace()
                .map(|word| EntityRecord {
                    name: word.to_string(),
                    entity_type: None,
                    salience: 1.0 / word.len() as f64,
                    sentiment: SentimentResult::new(0.0, 0.1),
                })
                .collect())
        }
    }

    fn setup_test_pipeline(woeid: Option<u64>) -> TrendPipeline {
        let data_dir = env::temp_dir().join(format!("test_pipeline_{}", uuid::Uuid::new_v4()));
        TrendPipeline::new(ResultStore::new(data_dir), woeid, 15)
    }

    fn music_and_politics() -> StubSource {
        StubSource {
            posts: vec![
                ("#music", vec!["I love it! https://t.co/abc"]),
                ("politics", vec!["Terrible decision..."]),
            ],
            fail: false,
        }
    }

    fn music_and_politics_scorer() -> StubScorer {
        StubScorer {
            scores: [
                ("i love it", (0.8, 0.9)),
                ("terrible decision", (-0.6, 0.7)),
            ]
            .into_iter()
            .collect(),
        }
    }

    #[tokio::test]
    async fn test_collect_then_analyse_by_trends() {
        let pipeline = setup_test_pipeline(Some(721943));

        let path = pipeline.collect(&music_and_politics()).await.unwrap();
        assert!(path.ends_with("trends_data_721943.json"));

        let aggregator = SentimentAggregator::new(music_and_politics_scorer());
        let result = pipeline.analyse_by_trends(&aggregator).await.unwrap();

        assert_eq!(result.trends.len(), 2);
        assert_eq!(result.get("#music").unwrap().score, 0.8);
        assert!((result.score() - 0.1).abs() < 1e-9);
        assert!((result.magnitude() - 0.8).abs() < 1e-9);

        let stored = pipeline.store().load_by_trends(Some(721943)).await.unwrap();
        assert_eq!(stored, result);
    }

    #[tokio::test]
    async fn test_partial_failure_still_writes_result() {
        let pipeline = setup_test_pipeline(None);
        let source = StubSource {
            posts: vec![
                ("#music", vec!["I love it"]),
                ("sports", vec!["Goal!!"]),
            ],
            fail: false,
        };
        pipeline.collect(&source).await.unwrap();

        let aggregator = SentimentAggregator::new(music_and_politics_scorer());
        let result = pipeline.analyse_by_trends(&aggregator).await.unwrap();

        assert_eq!(result.skipped, vec!["sports".to_string()]);
        assert!(pipeline.store().by_trends_path(None).exists());
    }

    #[tokio::test]
    async fn test_total_failure_writes_nothing() {
        let pipeline = setup_test_pipeline(Some(1));
        pipeline.collect(&music_and_politics()).await.unwrap();

        let aggregator = SentimentAggregator::new(StubScorer::default());
        let result = pipeline.analyse_by_trends(&aggregator).await;

        assert!(matches!(
            result,
            Err(CoreError::EmptyAggregate { attempted: 2 })
        ));
        assert!(!pipeline.store().by_trends_path(Some(1)).exists());
    }

    #[tokio::test]
    async fn test_failed_collection_writes_no_snapshot() {
        let pipeline = setup_test_pipeline(Some(1));
        let source = StubSource {
            posts: vec![],
            fail: true,
        };

        let result = pipeline.collect(&source).await;
        assert!(matches!(
            result,
            Err(CoreError::Collection(CollectionError::InvalidToken))
        ));
        assert!(!pipeline.store().snapshot_path(Some(1)).exists());
    }

    #[tokio::test]
    async fn test_analyse_without_snapshot_is_not_found() {
        let pipeline = setup_test_pipeline(Some(99));
        let aggregator = SentimentAggregator::new(music_and_politics_scorer());

        let result = pipeline.analyse_by_trends(&aggregator).await;
        assert!(matches!(result, Err(CoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_analyse_all_scores_every_post_as_one_document() {
        let pipeline = setup_test_pipeline(None);
        let snapshot: Snapshot = vec![
            ("a", vec!["Rome #Sanremo".to_string()]),
            ("b", vec!["Rome again".to_string()]),
        ]
        .into_iter()
        .collect();
        pipeline.store().save_snapshot(None, &snapshot).await.unwrap();

        let aggregator = SentimentAggregator::new(StubScorer::default());
        let entities = pipeline.analyse_all(&aggregator).await.unwrap();

        let names: Vec<&str> = entities.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["again", "rome", "sanremo"]);
        assert!(pipeline.store().all_path(None).exists());
    }
}
