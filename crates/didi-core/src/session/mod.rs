pub mod state;

pub use state::{MenuState, SessionState, SubflowKind};
