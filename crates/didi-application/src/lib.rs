pub mod alice;
pub mod identity;
pub mod listener;
pub mod session;
pub mod text;

pub use alice::Alice;
pub use identity::{KeyStore, SigningKeyPair};
pub use listener::{DispatchOutcome, Dispatcher, DispatcherCapabilities, Listener, ListeningGate};
pub use session::{SessionController, SessionOutcome, run_didi, run_session};
