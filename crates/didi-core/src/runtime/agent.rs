//! Narrow interface to the identity-protocol agent runtime.
//!
//! The runtime owns the protocol stack (connection handshake, credential and
//! proof exchange, wallet cryptography, secure storage). Everything in this
//! workspace reaches it only through these traits.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::Result;
use crate::runtime::event::AgentEvent;
use crate::runtime::model::{
    ConnectionRecord, CredentialExchangeRecord, DidCreateOptions, DidRecord, ProofExchangeRecord,
    SelectedCredentials, WalletConfig,
};
use crate::storage::RecordStorage;

#[async_trait]
pub trait AgentRuntime: Send + Sync {
    /// Subscribes to the runtime event bus.
    fn subscribe(&self) -> broadcast::Receiver<AgentEvent>;

    /// Record storage of the opened wallet.
    fn storage(&self) -> Arc<dyn RecordStorage>;

    // ===== Connections =====

    /// Accepts an out-of-band invitation URL. `None` when the invitation
    /// carries no handshake and therefore creates no connection.
    async fn receive_invitation_from_url(&self, url: &str) -> Result<Option<ConnectionRecord>>;

    /// Resolves once the connection reaches the completed state.
    async fn return_when_connected(&self, connection_id: &str) -> Result<ConnectionRecord>;

    async fn get_connection(&self, connection_id: &str) -> Result<ConnectionRecord>;

    // ===== Credentials =====

    async fn accept_credential_offer(&self, credential_record_id: &str) -> Result<()>;

    async fn decline_credential_offer(&self, credential_record_id: &str) -> Result<()>;

    async fn list_credentials(&self) -> Result<Vec<CredentialExchangeRecord>>;

    // ===== Proofs =====

    /// Picks held credentials that satisfy a received proof request.
    async fn select_credentials_for_proof_request(&self, proof_record_id: &str) -> Result<SelectedCredentials>;

    async fn accept_proof_request(&self, proof_record_id: &str, selected: &SelectedCredentials) -> Result<()>;

    async fn decline_proof_request(&self, proof_record_id: &str) -> Result<()>;

    async fn list_proofs(&self) -> Result<Vec<ProofExchangeRecord>>;

    // ===== Basic messages =====

    async fn send_basic_message(&self, connection_id: &str, content: &str) -> Result<()>;

    // ===== DIDs =====

    /// DIDs created by this wallet for the given method, oldest first.
    async fn created_dids(&self, method: &str) -> Result<Vec<DidRecord>>;

    /// Imports an existing DID (used for the endorser) from its seed.
    async fn import_did(&self, did: &str, seed: &str) -> Result<()>;

    /// Registers a new DID and returns its identifier.
    async fn create_did(&self, options: DidCreateOptions) -> Result<String>;

    // ===== Lifecycle =====

    async fn shutdown(&self) -> Result<()>;
}

/// Opens agent runtimes. Called again on every restart.
#[async_trait]
pub trait RuntimeFactory: Send + Sync {
    async fn open(&self, label: &str, wallet: &WalletConfig) -> Result<Arc<dyn AgentRuntime>>;
}
