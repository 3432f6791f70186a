use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};
use trends_core::{AggregateResult, CoreError, EntitySentiments, Snapshot};

mod tests;

/// JSON files under one data directory, named after the region they describe.
pub struct ResultStore {
    data_dir: PathBuf,
}

impl ResultStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn snapshot_path(&self, woeid: Option<u64>) -> PathBuf {
        self.file_path("trends_data", woeid)
    }

    pub fn by_trends_path(&self, woeid: Option<u64>) -> PathBuf {
        self.file_path("by_trends_result", woeid)
    }

    pub fn all_path(&self, woeid: Option<u64>) -> PathBuf {
        self.file_path("all_result", woeid)
    }

    fn file_path(&self, prefix: &str, woeid: Option<u64>) -> PathBuf {
        let suffix = woeid.map_or_else(|| "default".to_string(), |id| id.to_string());
        self.data_dir.join(format!("{}_{}.json", prefix, suffix))
    }

    pub async fn save_snapshot(
        &self,
        woeid: Option<u64>,
        snapshot: &Snapshot,
    ) -> Result<PathBuf, CoreError> {
        let path = self.snapshot_path(woeid);
        write_json(&path, snapshot).await?;
        info!("Saved {} trends to {}", snapshot.len(), path.display());
        Ok(path)
    }

    pub async fn load_snapshot(&self, woeid: Option<u64>) -> Result<Snapshot, CoreError> {
        let path = self.snapshot_path(woeid);
        let snapshot: Snapshot = read_json(&path).await?;
        info!("Loaded {} trends from {}", snapshot.len(), path.display());
        Ok(snapshot)
    }

    pub async fn save_by_trends(
        &self,
        woeid: Option<u64>,
        result: &AggregateResult,
    ) -> Result<PathBuf, CoreError> {
        let path = self.by_trends_path(woeid);
        write_json(&path, result).await?;
        info!(
            "Saved sentiment of {} trends to {}",
            result.trends.len(),
            path.display()
        );
        Ok(path)
    }

    pub async fn load_by_trends(&self, woeid: Option<u64>) -> Result<AggregateResult, CoreError> {
        let mut result: AggregateResult = read_json(&self.by_trends_path(woeid)).await?;

        // Trend names are only stored as keys
        for (name, sentiment) in result.trends.iter_mut() {
            sentiment.trend = name.clone();
        }
        Ok(result)
    }

    pub async fn save_entities(
        &self,
        woeid: Option<u64>,
        entities: &EntitySentiments,
    ) -> Result<PathBuf, CoreError> {
        let path = self.all_path(woeid);
        write_json(&path, entities).await?;
        info!("Saved {} entities to {}", entities.len(), path.display());
        Ok(path)
    }
}

/// Serializes to a sibling temp file and renames it over `path`, so readers
/// never see a half-written document.
async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), CoreError> {
    let contents = serde_json::to_vec_pretty(value)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let tmp_path = path.with_extension(format!("json.{}.tmp", uuid::Uuid::new_v4()));
    debug!("Writing {} bytes to {}", contents.len(), tmp_path.display());

    if let Err(e) = fs::write(&tmp_path, &contents).await {
        let _ = fs::remove_file(&tmp_path).await;
        return Err(e.into());
    }
    if let Err(e) = fs::rename(&tmp_path, path).await {
        let _ = fs::remove_file(&tmp_path).await;
        return Err(e.into());
    }
    Ok(())
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CoreError> {
    let contents = fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => CoreError::NotFound {
            resource: path.display().to_string(),
        },
        _ => CoreError::Io(e),
    })?;

    Ok(serde_json::from_slice(&contents)?)
}
