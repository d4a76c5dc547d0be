pub mod bootstrap;
pub mod controller;
pub mod inquirer;
pub mod menu;

pub use bootstrap::{run_didi, run_session};
pub use controller::{SessionController, SessionOutcome};
pub use inquirer::Inquirer;
pub use menu::{PromptOption, options_for};
