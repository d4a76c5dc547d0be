//! Session state types for terminal ownership.

use serde::{Deserialize, Serialize};
use strum::Display;

/// The kind of guided sub-flow that currently owns the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SubflowKind {
    CredentialOffer,
    ProofRequest,
    Ballot,
}

/// Represents who owns the operator's terminal.
///
/// While a sub-flow is active the main menu must not prompt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum SessionState {
    /// The main menu owns the terminal.
    #[default]
    Idle,
    /// A guided sub-flow owns the terminal.
    AwaitingSubflow(SubflowKind),
}

impl SessionState {
    pub fn is_listening(&self) -> bool {
        matches!(self, Self::AwaitingSubflow(_))
    }
}

/// Which menu the session controller offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum MenuState {
    NoConnection,
    Connected,
}
