//! Records exposed by the agent runtime.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;

/// Wallet credentials entered by the operator at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletConfig {
    pub id: String,
    pub key: String,
}

impl WalletConfig {
    pub fn new(id: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            key: key.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ConnectionState {
    InvitationReceived,
    RequestSent,
    ResponseReceived,
    Completed,
    Abandoned,
}

/// An established (or establishing) peer connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionRecord {
    pub id: String,
    pub their_label: Option<String>,
    pub state: ConnectionState,
    pub created_at: DateTime<Utc>,
}

impl ConnectionRecord {
    pub fn is_ready(&self) -> bool {
        self.state == ConnectionState::Completed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum CredentialState {
    OfferReceived,
    RequestSent,
    CredentialReceived,
    Done,
    Declined,
    Abandoned,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialAttribute {
    pub name: String,
    pub value: String,
}

impl CredentialAttribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialExchangeRecord {
    pub id: String,
    pub connection_id: String,
    pub state: CredentialState,
    #[serde(default)]
    pub attributes: Vec<CredentialAttribute>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ProofState {
    RequestReceived,
    PresentationSent,
    Done,
    Declined,
    Abandoned,
}

/// One attribute a verifier asks to be disclosed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestedAttribute {
    pub referent: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofExchangeRecord {
    pub id: String,
    pub connection_id: String,
    pub state: ProofState,
    #[serde(default)]
    pub requested_attributes: Vec<RequestedAttribute>,
    pub created_at: DateTime<Utc>,
}

/// A held credential attribute chosen to answer a requested attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedAttribute {
    pub referent: String,
    pub name: String,
    pub credential_id: String,
    pub value: String,
}

/// Result of matching a proof request against locally held credentials.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedCredentials {
    pub attributes: Vec<SelectedAttribute>,
    /// Names of requested attributes no held credential can satisfy.
    pub unsatisfied: Vec<String>,
}

impl SelectedCredentials {
    pub fn is_satisfied(&self) -> bool {
        self.unsatisfied.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BasicMessageRole {
    /// Sent by this agent.
    Sender,
    /// Addressed to this agent.
    Receiver,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicMessageRecord {
    pub id: String,
    pub connection_id: String,
    pub role: BasicMessageRole,
    pub content: String,
    pub sent_time: DateTime<Utc>,
}

/// A DID created by (and controlled from) this wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DidRecord {
    pub did: String,
    pub method: String,
    pub created_at: DateTime<Utc>,
}

/// Parameters for registering a new DID through an endorser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DidCreateOptions {
    pub method: String,
    pub namespace: String,
    pub endorser_did: String,
    /// Base64 encoded public verification key of the new DID.
    pub verkey: String,
}
