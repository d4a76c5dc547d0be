//! Persisted record model.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A flat key-value record persisted in the agent wallet.
///
/// Records are addressed by `id`, which is unique within a wallet. The
/// `category` groups records of the same kind so they can be queried
/// together (e.g. all created DIDs).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageRecord {
    pub id: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl StorageRecord {
    pub fn new(
        id: impl Into<String>,
        category: impl Into<String>,
        attributes: BTreeMap<String, String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            category: category.into(),
            created_at: now,
            updated_at: now,
            attributes,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// Outcome of looking a record up by id.
///
/// "Not found" is the normal empty case and is kept apart from real
/// storage failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordLookup {
    Found(StorageRecord),
    NotFound,
    StorageError(String),
}

impl RecordLookup {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    /// Collapses the lookup into an `Option`, logging storage failures.
    pub fn into_option(self) -> Option<StorageRecord> {
        match self {
            Self::Found(record) => Some(record),
            Self::NotFound => None,
            Self::StorageError(reason) => {
                tracing::error!("[Storage] Record lookup failed: {}", reason);
                None
            }
        }
    }
}
