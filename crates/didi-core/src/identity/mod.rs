pub mod model;

pub use model::{IDENTITY_CATEGORY, IDENTITY_RECORD_ID, IdentityRecord};
