use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Text content of one post. Author, timestamp and place are dropped at collection time.
pub type RawTextUnit = String;

/// Cleaned, newline-joined text of one or more posts.
pub type CleanedCorpus = String;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    pub name: String,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub tweet_volume: Option<u64>,
}

/// All posts collected for one trend, in collection order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrendGroup {
    units: Vec<RawTextUnit>,
}

impl TrendGroup {
    pub fn new(units: Vec<RawTextUnit>) -> Self {
        Self { units }
    }

    pub fn units(&self) -> &[RawTextUnit] {
        &self.units
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

impl From<Vec<RawTextUnit>> for TrendGroup {
    fn from(units: Vec<RawTextUnit>) -> Self {
        Self::new(units)
    }
}

/// Every trend collected for one region at one point in time.
///
/// A snapshot is built once (by collection or by loading from disk) and is
/// read-only afterwards; there is no API to add or remove trends.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    groups: BTreeMap<String, TrendGroup>,
}

impl Snapshot {
    pub fn get(&self, trend: &str) -> Option<&TrendGroup> {
        self.groups.get(trend)
    }

    pub fn trends(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TrendGroup)> {
        self.groups.iter().map(|(name, group)| (name.as_str(), group))
    }

    /// All posts of all trends, trend by trend.
    pub fn units(&self) -> impl Iterator<Item = &RawTextUnit> {
        self.groups.values().flat_map(|group| group.units().iter())
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl<K, G> FromIterator<(K, G)> for Snapshot
where
    K: Into<String>,
    G: Into<TrendGroup>,
{
    fn from_iter<I: IntoIterator<Item = (K, G)>>(iter: I) -> Self {
        Self {
            groups: iter
                .into_iter()
                .map(|(name, group)| (name.into(), group.into()))
                .collect(),
        }
    }
}

/// Document-level sentiment returned by the scoring service.
///
/// `score` lies in [-1.0, 1.0]; `magnitude` is non-negative and grows with
/// the amount of emotional text, it is not normalized to length.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    pub score: f64,
    pub magnitude: f64,
}

impl SentimentResult {
    pub fn new(score: f64, magnitude: f64) -> Self {
        Self { score, magnitude }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSentiment {
    #[serde(skip)]
    pub trend: String,
    pub score: f64,
    pub magnitude: f64,
}

impl TrendSentiment {
    pub fn new(trend: impl Into<String>, result: SentimentResult) -> Self {
        Self {
            trend: trend.into(),
            score: result.score,
            magnitude: result.magnitude,
        }
    }
}

/// Per-trend sentiment plus the mean over every trend that was scored.
///
/// `totals` is computed from the entries of `trends` only; trends whose
/// scoring failed are listed in `skipped` and never influence the means.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    pub trends: BTreeMap<String, TrendSentiment>,
    pub totals: SentimentResult,
    #[serde(default)]
    pub skipped: Vec<String>,
}

impl AggregateResult {
    pub fn get(&self, trend: &str) -> Option<&TrendSentiment> {
        self.trends.get(trend)
    }

    pub fn score(&self) -> f64 {
        self.totals.score
    }

    pub fn magnitude(&self) -> f64 {
        self.totals.magnitude
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    pub salience: f64,
    pub sentiment: SentimentResult,
}

/// Entity sentiment of a whole corpus, keyed by entity name.
pub type EntitySentiments = BTreeMap<String, EntityRecord>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_round_trips_as_plain_mapping() {
        let json = r#"{"music":["I love it","so good"],"politics":["terrible decision"]}"#;
        let snapshot: Snapshot = serde_json::from_str(json).unwrap();

        assert_eq!(snapshot.len(), 2);
        assert_eq!(
            snapshot.get("music").unwrap().units(),
            &["I love it".to_string(), "so good".to_string()]
        );
        assert_eq!(serde_json::to_string(&snapshot).unwrap(), json);
    }

    #[test]
    fn test_snapshot_units_flatten_all_groups() {
        let snapshot: Snapshot = vec![
            ("a", vec!["one".to_string(), "two".to_string()]),
            ("b", vec!["three".to_string()]),
        ]
        .into_iter()
        .collect();

        let units: Vec<&RawTextUnit> = snapshot.units().collect();
        assert_eq!(units, vec!["one", "two", "three"]);
    }

    #[test]
    fn test_aggregate_result_keeps_trend_named_score_apart_from_totals() {
        let mut trends = BTreeMap::new();
        trends.insert(
            "score".to_string(),
            TrendSentiment::new("score", SentimentResult::new(0.5, 1.0)),
        );
        let result = AggregateResult {
            trends,
            totals: SentimentResult::new(0.5, 1.0),
            skipped: vec!["magnitude".to_string()],
        };

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["trends"]["score"]["score"], 0.5);
        assert_eq!(value["totals"]["magnitude"], 1.0);
        assert_eq!(value["skipped"][0], "magnitude");
        assert!(value["trends"]["score"].get("trend").is_none());
    }
}
