//! Main menu options.

use didi_core::session::MenuState;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// An entry of the main menu, rendered with its display text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
pub enum PromptOption {
    #[strum(serialize = "Receive connection invitation")]
    ReceiveConnectionUrl,
    #[strum(serialize = "Send message")]
    SendMessage,
    #[strum(serialize = "Show credentials")]
    ShowCredentials,
    #[strum(serialize = "Show proofs")]
    ShowProofs,
    #[strum(serialize = "Exit")]
    Exit,
    #[strum(serialize = "Restart")]
    Restart,
}

impl PromptOption {
    /// Whether the option needs an established connection.
    pub fn requires_connection(&self) -> bool {
        matches!(self, Self::SendMessage)
    }
}

/// Options offered in `state`, in menu order.
pub fn options_for(state: MenuState) -> Vec<PromptOption> {
    PromptOption::iter()
        .filter(|option| state == MenuState::Connected || !option.requires_connection())
        .collect()
}
