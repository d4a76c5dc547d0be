pub mod record;
pub mod repository;

pub use record::{RecordLookup, StorageRecord};
pub use repository::RecordStorage;
