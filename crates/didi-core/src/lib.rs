pub mod config;
pub mod error;
pub mod identity;
pub mod message;
pub mod prompt;
pub mod runtime;
pub mod session;
pub mod storage;

// Re-export common error type
pub use error::DidiError;
