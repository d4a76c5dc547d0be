//! Record storage trait.

use async_trait::async_trait;

use crate::error::Result;
use crate::storage::record::{RecordLookup, StorageRecord};

/// Persistence for wallet records.
///
/// Implementations assume a single writer (this process).
#[async_trait]
pub trait RecordStorage: Send + Sync {
    /// Saves a record, replacing any record with the same id.
    async fn save(&self, record: StorageRecord) -> Result<()>;

    /// Looks a record up by id. Never fails; failures are reported in the lookup.
    async fn get_by_id(&self, id: &str) -> RecordLookup;

    /// Deletes a record by id. Returns `true` if a record was removed.
    async fn delete(&self, id: &str) -> Result<bool>;

    /// Returns all records of a category, oldest first.
    async fn find_by_category(&self, category: &str) -> Result<Vec<StorageRecord>>;
}
