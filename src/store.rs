//! Persistence of the last-synced dataset between runs.
//!
//! The store holds a single JSON document mirroring the dataset shape and is replaced
//! whole on every save; there are no partial updates. The trait exists so the server and
//! the test suite can run against an in-memory store without touching the filesystem.

use crate::model::Dataset;
use crate::{utils, Result};
use anyhow::Context;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::sync::Mutex;

/// Whole-document persistence of the dataset.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// The stored dataset, or `None` when nothing has been saved yet. A present but
    /// unparsable file is an error, not an empty dataset.
    async fn load(&self) -> Result<Option<Dataset>>;

    /// Replaces the stored dataset.
    async fn save(&self, dataset: &Dataset) -> Result<()>;
}

/// The production store: one JSON file at the configured data path.
#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl DataStore for JsonStore {
    async fn load(&self) -> Result<Option<Dataset>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Unable to read the data file at {}", self.path.display())
                })
            }
        };
        let dataset = serde_json::from_str(&content)
            .with_context(|| format!("Unable to parse the data file at {}", self.path.display()))?;
        Ok(Some(dataset))
    }

    async fn save(&self, dataset: &Dataset) -> Result<()> {
        let json = serde_json::to_string_pretty(dataset)
            .context("Unable to serialize the dataset as JSON")?;
        utils::write(&self.path, json).await
    }
}

/// An implementation of the `DataStore` trait that holds the dataset in memory.
///
/// Note: this is compiled even in the "production" version of this app so that we can run
/// the whole app, top-to-bottom, without a data file on disk.
#[derive(Debug, Default)]
pub struct MemoryStore {
    dataset: Mutex<Option<Dataset>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds `dataset`.
    pub fn seeded(dataset: Dataset) -> Self {
        Self {
            dataset: Mutex::new(Some(dataset)),
        }
    }
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn load(&self) -> Result<Option<Dataset>> {
        Ok(self.dataset.lock().await.clone())
    }

    async fn save(&self, dataset: &Dataset) -> Result<()> {
        *self.dataset.lock().await = Some(dataset.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, Record, Value};
    use tempfile::TempDir;

    fn sample() -> Dataset {
        let mut dataset = Dataset::new();
        let record: Record = [
            ("date", Value::text("2025-03-01")),
            ("amount", Value::Number(250.0)),
        ]
        .into_iter()
        .collect();
        dataset.push(Category::Expense, record);
        dataset
    }

    #[tokio::test]
    async fn test_json_store_round_trip() {
        let temp = TempDir::new().unwrap();
        let store = JsonStore::new(temp.path().join("finance-data.json"));
        store.save(&sample()).await.unwrap();
        let loaded = store.load().await.unwrap();
        assert_eq!(loaded, Some(sample()));
    }

    #[tokio::test]
    async fn test_json_store_missing_file_reads_none() {
        let temp = TempDir::new().unwrap();
        let store = JsonStore::new(temp.path().join("nothing-here.json"));
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_json_store_malformed_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("finance-data.json");
        tokio::fs::write(&path, "not json at all").await.unwrap();
        let store = JsonStore::new(path);
        assert!(store.load().await.is_err());
    }

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        assert_eq!(store.load().await.unwrap(), None);
        store.save(&sample()).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(sample()));
    }
}
