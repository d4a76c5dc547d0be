//! The agent facade.
//!
//! `Alice` is the control surface the listener, dispatcher and session
//! controller act through. Protocol work is delegated to the
//! [`AgentRuntime`]; this type only caches the session's DID and the
//! id of the established connection.

use std::sync::Arc;

use didi_core::config::DidiConfig;
use didi_core::error::{DidiError, Result};
use didi_core::runtime::{
    AgentRuntime, ConnectionRecord, CredentialExchangeRecord, DidCreateOptions, ProofExchangeRecord,
    RuntimeFactory, SelectedCredentials, WalletConfig,
};
use tokio::sync::RwLock;

use crate::identity::{KeyStore, SigningKeyPair};

pub struct Alice {
    name: String,
    runtime: Arc<dyn AgentRuntime>,
    key_store: KeyStore,
    /// Cached for the lifetime of this instance; never re-validated.
    did: String,
    connection_id: RwLock<Option<String>>,
}

impl Alice {
    /// Opens the wallet through `factory` and derives the session DID.
    ///
    /// # Arguments
    ///
    /// * `factory` - Opens the agent runtime for the wallet
    /// * `wallet` - Wallet name and key entered by the operator
    /// * `config` - Agent label, DID method and endorser identity
    pub async fn build(factory: &dyn RuntimeFactory, wallet: &WalletConfig, config: &DidiConfig) -> Result<Self> {
        let runtime = factory.open(&config.agent.label, wallet).await?;
        Self::with_runtime(config.agent.label.clone(), runtime, config).await
    }

    /// Builds the facade over an already opened runtime.
    pub async fn with_runtime(name: String, runtime: Arc<dyn AgentRuntime>, config: &DidiConfig) -> Result<Self> {
        let key_store = KeyStore::new(runtime.storage());
        let did = ensure_did(runtime.as_ref(), &key_store, config).await?;
        tracing::info!("[Alice] Agent '{}' ready with DID {}", name, did);

        Ok(Self {
            name,
            runtime,
            key_store,
            did,
            connection_id: RwLock::new(None),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn did(&self) -> &str {
        &self.did
    }

    pub fn runtime(&self) -> &Arc<dyn AgentRuntime> {
        &self.runtime
    }

    pub fn key_store(&self) -> &KeyStore {
        &self.key_store
    }

    pub async fn connection_id(&self) -> Option<String> {
        self.connection_id.read().await.clone()
    }

    pub async fn is_connected(&self) -> bool {
        self.connection_id.read().await.is_some()
    }

    /// Returns the established connection, or `MissingConnection`.
    pub async fn connection_record(&self) -> Result<ConnectionRecord> {
        let id = self.connection_id().await.ok_or(DidiError::MissingConnection)?;
        self.runtime.get_connection(&id).await
    }

    /// Accepts an out-of-band invitation and waits for the handshake to complete.
    pub async fn accept_connection(&self, invitation_url: &str) -> Result<ConnectionRecord> {
        let record = self
            .runtime
            .receive_invitation_from_url(invitation_url)
            .await?
            .ok_or(DidiError::NoConnectionFromInvitation)?;

        let connected = self.runtime.return_when_connected(&record.id).await?;
        *self.connection_id.write().await = Some(connected.id.clone());
        tracing::info!("[Alice] Connected on {}", connected.id);
        Ok(connected)
    }

    pub async fn accept_credential_offer(&self, record: &CredentialExchangeRecord) -> Result<()> {
        self.runtime.accept_credential_offer(&record.id).await
    }

    pub async fn decline_credential_offer(&self, record: &CredentialExchangeRecord) -> Result<()> {
        self.runtime.decline_credential_offer(&record.id).await
    }

    pub async fn select_credentials(&self, record: &ProofExchangeRecord) -> Result<SelectedCredentials> {
        self.runtime.select_credentials_for_proof_request(&record.id).await
    }

    pub async fn accept_proof_request(&self, record: &ProofExchangeRecord, selected: &SelectedCredentials) -> Result<()> {
        self.runtime.accept_proof_request(&record.id, selected).await
    }

    pub async fn decline_proof_request(&self, record: &ProofExchangeRecord) -> Result<()> {
        self.runtime.decline_proof_request(&record.id).await
    }

    /// Sends a basic message on the established connection.
    ///
    /// Fails with `MissingConnection` (and sends nothing) before a connection exists.
    pub async fn send_message(&self, content: &str) -> Result<()> {
        let connection = self.connection_record().await?;
        self.runtime.send_basic_message(&connection.id, content).await
    }

    pub async fn credentials(&self) -> Result<Vec<CredentialExchangeRecord>> {
        self.runtime.list_credentials().await
    }

    pub async fn proofs(&self) -> Result<Vec<ProofExchangeRecord>> {
        self.runtime.list_proofs().await
    }

    pub async fn exit(&self) -> Result<()> {
        self.runtime.shutdown().await
    }

    /// Shuts the runtime down and forgets the connection.
    pub async fn restart(&self) -> Result<()> {
        self.connection_id.write().await.take();
        self.runtime.shutdown().await
    }
}

/// Adopts the first DID of the configured method, or creates one.
///
/// Creation imports the endorser identity, generates the signing keypair and
/// persists it under the identity record once the DID exists.
async fn ensure_did(runtime: &dyn AgentRuntime, key_store: &KeyStore, config: &DidiConfig) -> Result<String> {
    let method = &config.agent.did_method;
    if let Some(existing) = runtime.created_dids(method).await?.into_iter().next() {
        tracing::info!("[Alice] Using existing DID {}", existing.did);
        return Ok(existing.did);
    }

    let (endorser_did, endorser_seed) = config.endorser.require()?;
    runtime.import_did(endorser_did, endorser_seed).await?;

    let keypair = SigningKeyPair::generate();
    let did = runtime
        .create_did(DidCreateOptions {
            method: method.clone(),
            namespace: config.agent.did_namespace.clone(),
            endorser_did: endorser_did.to_string(),
            verkey: keypair.public_key_text(),
        })
        .await?;
    key_store.put_identity(&keypair.to_identity_record()).await?;

    tracing::info!("[Alice] Created DID {}", did);
    Ok(did)
}
