//! Identity keypair record.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{DidiError, Result};
use crate::storage::StorageRecord;

/// Fixed record id under which the signing keypair is stored.
pub const IDENTITY_RECORD_ID: &str = "key";

/// Storage category of identity records.
pub const IDENTITY_CATEGORY: &str = "identity";

const PUBLIC_KEY_ATTR: &str = "publicKey";
const PRIVATE_KEY_ATTR: &str = "privateKey";

/// The local signing keypair, both halves in base64 text encoding.
///
/// Created once during first-run DID creation and read on every signing
/// operation. At most one exists per wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityRecord {
    pub public_key: String,
    pub private_key: String,
}

impl IdentityRecord {
    /// Flattens the keypair into record attributes.
    pub fn to_attributes(&self) -> BTreeMap<String, String> {
        let mut attributes = BTreeMap::new();
        attributes.insert(PUBLIC_KEY_ATTR.to_string(), self.public_key.clone());
        attributes.insert(PRIVATE_KEY_ATTR.to_string(), self.private_key.clone());
        attributes
    }
}

impl TryFrom<&StorageRecord> for IdentityRecord {
    type Error = DidiError;

    fn try_from(record: &StorageRecord) -> Result<Self> {
        let field = |name: &str| {
            record
                .attribute(name)
                .map(str::to_string)
                .ok_or_else(|| DidiError::invalid_key(format!("record '{}' has no {}", record.id, name)))
        };

        Ok(Self {
            public_key: field(PUBLIC_KEY_ATTR)?,
            private_key: field(PRIVATE_KEY_ATTR)?,
        })
    }
}
