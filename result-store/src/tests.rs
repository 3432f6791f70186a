#[cfg(test)]
mod tests {
    use crate::ResultStore;
    use std::collections::BTreeMap;
    use std::env;
    use trends_core::{
        AggregateResult, CoreError, EntityRecord, EntitySentiments, SentimentResult, Snapshot,
        TrendSentiment,
    };

    fn setup_test_store() -> ResultStore {
        let data_dir = env::temp_dir().join(format!("test_trendsai_{}", uuid::Uuid::new_v4()));
        ResultStore::new(data_dir)
    }

    fn sample_result() -> AggregateResult {
        let trends: BTreeMap<String, TrendSentiment> = [
            ("music", SentimentResult::new(0.8, 0.9)),
            ("politics", SentimentResult::new(-0.6, 0.7)),
        ]
        .into_iter()
        .map(|(name, result)| (name.to_string(), TrendSentiment::new(name, result)))
        .collect();

        AggregateResult {
            trends,
            totals: SentimentResult::new(0.1, 0.8),
            skipped: vec!["sports".to_string()],
        }
    }

    #[test]
    fn test_file_names_follow_region() {
        let store = ResultStore::new("Data");
        assert!(store
            .snapshot_path(Some(721943))
            .ends_with("trends_data_721943.json"));
        assert!(store
            .by_trends_path(None)
            .ends_with("by_trends_result_default.json"));
        assert!(store.all_path(Some(1)).ends_with("all_result_1.json"));
    }

    #[tokio::test]
    async fn test_snapshot_roundtrip_keeps_post_order() {
        let store = setup_test_store();
        let snapshot: Snapshot = vec![
            ("#music", vec!["second".to_string(), "first".to_string()]),
            ("quiet", vec![]),
        ]
        .into_iter()
        .collect();

        let path = store.save_snapshot(Some(23424853), &snapshot).await.unwrap();
        assert!(path.exists());

        let loaded = store.load_snapshot(Some(23424853)).await.unwrap();
        assert_eq!(loaded, snapshot);
        assert_eq!(loaded.get("#music").unwrap().units()[0], "second");
    }

    #[tokio::test]
    async fn test_snapshot_file_is_plain_trend_mapping() {
        let store = setup_test_store();
        let snapshot: Snapshot = vec![("news", vec!["Breaking".to_string()])]
            .into_iter()
            .collect();
        store.save_snapshot(None, &snapshot).await.unwrap();

        let contents = std::fs::read_to_string(store.snapshot_path(None)).unwrap();
        let json: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(json, serde_json::json!({"news": ["Breaking"]}));
    }

    #[tokio::test]
    async fn test_missing_snapshot_is_not_found() {
        let store = setup_test_store();
        let result = store.load_snapshot(Some(42)).await;
        assert!(matches!(result, Err(CoreError::NotFound { ref resource })
            if resource.ends_with("trends_data_42.json")));
    }

    #[tokio::test]
    async fn test_by_trends_result_restores_trend_names() {
        let store = setup_test_store();
        let result = sample_result();

        store.save_by_trends(None, &result).await.unwrap();
        let loaded = store.load_by_trends(None).await.unwrap();

        assert_eq!(loaded, result);
        assert_eq!(loaded.get("politics").unwrap().trend, "politics");
    }

    #[tokio::test]
    async fn test_by_trends_file_keeps_totals_apart_from_trends() {
        let store = setup_test_store();
        store.save_by_trends(Some(1), &sample_result()).await.unwrap();

        let contents = std::fs::read_to_string(store.by_trends_path(Some(1))).unwrap();
        let json: serde_json::Value = serde_json::from_str(&contents).unwrap();

        assert_eq!(json["trends"]["music"]["score"], 0.8);
        assert_eq!(json["totals"]["magnitude"], 0.8);
        assert_eq!(json["skipped"], serde_json::json!(["sports"]));
        assert!(json["trends"]["music"].get("trend").is_none());
    }

    #[tokio::test]
    async fn test_save_entities_leaves_no_temp_files() {
        let store = setup_test_store();
        let mut entities = EntitySentiments::new();
        entities.insert(
            "Sanremo".to_string(),
            EntityRecord {
                name: "Sanremo".to_string(),
                entity_type: Some("EVENT".to_string()),
                salience: 0.42,
                sentiment: SentimentResult::new(0.3, 1.2),
            },
        );

        store.save_entities(Some(721943), &entities).await.unwrap();
        store.save_entities(Some(721943), &entities).await.unwrap();

        let files: Vec<String> = std::fs::read_dir(store.data_dir())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(files, vec!["all_result_721943.json".to_string()]);
    }
}
