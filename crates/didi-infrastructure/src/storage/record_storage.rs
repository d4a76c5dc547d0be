//! File-backed wallet record storage.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use didi_core::error::{DidiError, Result};
use didi_core::storage::{RecordLookup, RecordStorage, StorageRecord};
use serde::{Deserialize, Serialize};

use super::atomic_toml::AtomicTomlFile;

/// On-disk layout of a wallet file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WalletFile {
    #[serde(default)]
    pub records: BTreeMap<String, StorageRecord>,
}

/// [`RecordStorage`] keeping every record of one wallet in a single TOML file.
///
/// File I/O runs on the blocking pool.
#[derive(Clone)]
pub struct FileRecordStorage {
    file: Arc<AtomicTomlFile<WalletFile>>,
}

impl FileRecordStorage {
    pub fn new(path: PathBuf) -> Self {
        Self {
            file: Arc::new(AtomicTomlFile::new(path)),
        }
    }

    async fn blocking<R, F>(&self, f: F) -> Result<R>
    where
        R: Send + 'static,
        F: FnOnce(&AtomicTomlFile<WalletFile>) -> Result<R> + Send + 'static,
    {
        let file = self.file.clone();
        tokio::task::spawn_blocking(move || f(&file))
            .await
            .map_err(|e| DidiError::internal(format!("Failed to join storage task: {}", e)))?
    }
}

#[async_trait]
impl RecordStorage for FileRecordStorage {
    async fn save(&self, mut record: StorageRecord) -> Result<()> {
        self.blocking(move |file| {
            file.update(|wallet| {
                if let Some(existing) = wallet.records.get(&record.id) {
                    record.created_at = existing.created_at;
                    record.updated_at = Utc::now();
                }
                wallet.records.insert(record.id.clone(), record);
                Ok(())
            })
        })
        .await
    }

    async fn get_by_id(&self, id: &str) -> RecordLookup {
        let id = id.to_string();
        let result = self
            .blocking(move |file| Ok(file.load()?.records.remove(&id)))
            .await;

        match result {
            Ok(Some(record)) => RecordLookup::Found(record),
            Ok(None) => RecordLookup::NotFound,
            Err(e) => RecordLookup::StorageError(e.to_string()),
        }
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let id = id.to_string();
        self.blocking(move |file| file.update(|wallet| Ok(wallet.records.remove(&id).is_some())))
            .await
    }

    async fn find_by_category(&self, category: &str) -> Result<Vec<StorageRecord>> {
        let category = category.to_string();
        self.blocking(move |file| {
            let mut records: Vec<StorageRecord> = file
                .load()?
                .records
                .into_values()
                .filter(|r| r.category == category)
                .collect();
            records.sort_by_key(|r| r.created_at);
            Ok(records)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn record(id: &str, category: &str) -> StorageRecord {
        let mut attributes = BTreeMap::new();
        attributes.insert("name".to_string(), id.to_string());
        StorageRecord::new(id, category, attributes)
    }

    #[tokio::test]
    async fn test_save_and_get() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileRecordStorage::new(temp_dir.path().join("alice.toml"));

        storage.save(record("did:indy:bcovrin:test:abc", "did")).await.unwrap();

        match storage.get_by_id("did:indy:bcovrin:test:abc").await {
            RecordLookup::Found(found) => {
                assert_eq!(found.category, "did");
                assert_eq!(found.attribute("name"), Some("did:indy:bcovrin:test:abc"));
            }
            other => panic!("Expected Found, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileRecordStorage::new(temp_dir.path().join("alice.toml"));

        for id in ["key", "", "does-not-exist", "ünïcode"] {
            assert_eq!(storage.get_by_id(id).await, RecordLookup::NotFound);
        }
    }

    #[tokio::test]
    async fn test_corrupted_file_is_storage_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("alice.toml");
        fs::write(&path, "records = [[[").unwrap();
        let storage = FileRecordStorage::new(path);

        assert!(matches!(storage.get_by_id("key").await, RecordLookup::StorageError(_)));
    }

    #[tokio::test]
    async fn test_save_overwrites_and_keeps_created_at() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileRecordStorage::new(temp_dir.path().join("alice.toml"));

        let first = record("key", "identity");
        let created_at = first.created_at;
        storage.save(first).await.unwrap();

        let mut second = record("key", "identity");
        second.attributes.insert("name".to_string(), "replaced".to_string());
        storage.save(second).await.unwrap();

        let found = storage.get_by_id("key").await.into_option().unwrap();
        assert_eq!(found.attribute("name"), Some("replaced"));
        assert_eq!(found.created_at, created_at);
    }

    #[tokio::test]
    async fn test_delete() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileRecordStorage::new(temp_dir.path().join("alice.toml"));
        storage.save(record("key", "identity")).await.unwrap();

        assert!(storage.delete("key").await.unwrap());
        assert!(!storage.delete("key").await.unwrap());
        assert_eq!(storage.get_by_id("key").await, RecordLookup::NotFound);
    }

    #[tokio::test]
    async fn test_find_by_category_filters() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileRecordStorage::new(temp_dir.path().join("alice.toml"));
        storage.save(record("did-1", "did")).await.unwrap();
        storage.save(record("key", "identity")).await.unwrap();
        storage.save(record("did-2", "did")).await.unwrap();

        let dids = storage.find_by_category("did").await.unwrap();
        let ids: Vec<&str> = dids.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["did-1", "did-2"]);
    }
}
