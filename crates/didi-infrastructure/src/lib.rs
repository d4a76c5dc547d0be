pub mod config_service;
pub mod local_runtime;
pub mod paths;
pub mod storage;

pub use crate::config_service::ConfigService;
pub use crate::local_runtime::{LocalAgentRuntime, LocalRuntimeFactory};
pub use crate::paths::DidiPaths;
pub use crate::storage::FileRecordStorage;
