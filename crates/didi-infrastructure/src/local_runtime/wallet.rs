//! Wallet key verification.

use std::collections::BTreeMap;

use didi_core::error::{DidiError, Result};
use didi_core::storage::{RecordLookup, RecordStorage, StorageRecord};
use rand::RngCore;
use sha2::{Digest, Sha256};

const WALLET_META_ID: &str = "__wallet";
const WALLET_CATEGORY: &str = "wallet";

fn verifier(salt: &[u8], key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Checks `key` against the wallet's stored verifier, creating the verifier
/// on first open.
pub async fn unlock(storage: &dyn RecordStorage, key: &str) -> Result<()> {
    match storage.get_by_id(WALLET_META_ID).await {
        RecordLookup::Found(meta) => {
            let salt = meta
                .attribute("salt")
                .and_then(|s| hex::decode(s).ok())
                .ok_or_else(|| DidiError::storage("wallet metadata has no salt"))?;
            let expected = meta
                .attribute("verifier")
                .ok_or_else(|| DidiError::storage("wallet metadata has no verifier"))?;

            if verifier(&salt, key) != expected {
                return Err(DidiError::Security("invalid wallet key".to_string()));
            }
            Ok(())
        }
        RecordLookup::NotFound => {
            let mut salt = [0u8; 16];
            rand::thread_rng().fill_bytes(&mut salt);

            let mut attributes = BTreeMap::new();
            attributes.insert("salt".to_string(), hex::encode(salt));
            attributes.insert("verifier".to_string(), verifier(&salt, key));
            storage
                .save(StorageRecord::new(WALLET_META_ID, WALLET_CATEGORY, attributes))
                .await?;
            tracing::info!("[Wallet] Created new wallet");
            Ok(())
        }
        RecordLookup::StorageError(reason) => Err(DidiError::storage(reason)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FileRecordStorage;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_unlock_creates_then_verifies() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileRecordStorage::new(temp_dir.path().join("alice.toml"));

        unlock(&storage, "secret").await.unwrap();
        unlock(&storage, "secret").await.unwrap();

        let err = unlock(&storage, "wrong").await.unwrap_err();
        assert!(matches!(err, DidiError::Security(_)));
    }
}
