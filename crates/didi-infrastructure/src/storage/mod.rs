pub mod atomic_toml;
pub mod record_storage;

pub use record_storage::FileRecordStorage;
