//! Key/identity store over wallet records.

use std::collections::BTreeMap;
use std::sync::Arc;

use didi_core::error::{DidiError, Result};
use didi_core::identity::{IDENTITY_CATEGORY, IDENTITY_RECORD_ID, IdentityRecord};
use didi_core::storage::{RecordLookup, RecordStorage, StorageRecord};

/// Stores the local signing keypair (and other flat records) in the wallet.
#[derive(Clone)]
pub struct KeyStore {
    storage: Arc<dyn RecordStorage>,
}

impl KeyStore {
    pub fn new(storage: Arc<dyn RecordStorage>) -> Self {
        Self { storage }
    }

    /// Persists `attributes` under `key`, overwriting any existing record.
    pub async fn put(&self, key: &str, attributes: BTreeMap<String, String>) -> Result<()> {
        self.storage
            .save(StorageRecord::new(key, IDENTITY_CATEGORY, attributes))
            .await
    }

    /// Looks a record up. Storage failures are logged and reported, never raised.
    pub async fn get(&self, key: &str) -> RecordLookup {
        let lookup = self.storage.get_by_id(key).await;
        if let RecordLookup::StorageError(reason) = &lookup {
            tracing::error!("[KeyStore] Failed to read record '{}': {}", key, reason);
        }
        lookup
    }

    pub async fn delete(&self, key: &str) -> Result<bool> {
        self.storage.delete(key).await
    }

    pub async fn put_identity(&self, identity: &IdentityRecord) -> Result<()> {
        self.put(IDENTITY_RECORD_ID, identity.to_attributes()).await
    }

    /// Loads the identity keypair stored under the fixed `"key"` id.
    pub async fn load_identity(&self) -> Result<IdentityRecord> {
        match self.get(IDENTITY_RECORD_ID).await {
            RecordLookup::Found(record) => IdentityRecord::try_from(&record),
            RecordLookup::NotFound => Err(DidiError::not_found("identity record", IDENTITY_RECORD_ID)),
            RecordLookup::StorageError(reason) => Err(DidiError::storage(reason)),
        }
    }
}
