pub mod key_store;
pub mod signing;

pub use key_store::KeyStore;
pub use signing::{SigningKeyPair, verify_base64};
