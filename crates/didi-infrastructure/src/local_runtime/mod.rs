//! In-process agent runtime.
//!
//! `LocalAgentRuntime` implements [`AgentRuntime`] on top of a file-backed
//! wallet. Handshakes complete locally, outbound basic messages are kept in an
//! outbox, and the `deliver_message` / `offer_credential` / `request_proof`
//! hooks raise the same events a remote peer would cause.

mod invitation;
mod wallet;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::Utc;
use didi_core::error::{DidiError, Result};
use didi_core::runtime::{
    AgentEvent, AgentRuntime, BasicMessageRecord, BasicMessageRole, ConnectionRecord, ConnectionState,
    CredentialAttribute, CredentialExchangeRecord, CredentialState, DidCreateOptions, DidRecord,
    ProofExchangeRecord, ProofState, RequestedAttribute, RuntimeFactory, SelectedAttribute,
    SelectedCredentials, WalletConfig,
};
use didi_core::storage::{RecordLookup, RecordStorage, StorageRecord};
use ed25519_dalek::{SigningKey, VerifyingKey};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::{Mutex, broadcast};
use uuid::Uuid;

use crate::paths::DidiPaths;
use crate::storage::FileRecordStorage;

pub use invitation::{Invitation, parse_invitation_url};

const CONNECTION_CATEGORY: &str = "connection";
const CREDENTIAL_CATEGORY: &str = "credential_exchange";
const PROOF_CATEGORY: &str = "proof_exchange";
const DID_CATEGORY: &str = "did";
const IMPORTED_DID_CATEGORY: &str = "imported_did";
const RECORD_ATTR: &str = "record";

const EVENT_CAPACITY: usize = 64;

pub struct LocalAgentRuntime {
    label: String,
    storage: Arc<FileRecordStorage>,
    events: broadcast::Sender<AgentEvent>,
    outbox: Mutex<Vec<BasicMessageRecord>>,
    closed: AtomicBool,
}

impl LocalAgentRuntime {
    /// Unlocks the wallet behind `storage` with `wallet_key` and starts the runtime.
    pub async fn open(label: impl Into<String>, storage: FileRecordStorage, wallet_key: &str) -> Result<Self> {
        wallet::unlock(&storage, wallet_key).await?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let label = label.into();

        tracing::info!("[Runtime] Agent '{}' initialized", label);
        Ok(Self {
            label,
            storage: Arc::new(storage),
            events,
            outbox: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Basic messages this agent has sent, oldest first.
    pub async fn sent_messages(&self) -> Vec<BasicMessageRecord> {
        self.outbox.lock().await.clone()
    }

    // ===== Peer simulation =====

    /// Delivers an inbound basic message from the peer on `connection_id`.
    pub async fn deliver_message(&self, connection_id: &str, content: &str) -> Result<BasicMessageRecord> {
        self.ensure_open()?;
        self.completed_connection(connection_id).await?;

        let message = BasicMessageRecord {
            id: Uuid::new_v4().to_string(),
            connection_id: connection_id.to_string(),
            role: BasicMessageRole::Receiver,
            content: content.to_string(),
            sent_time: Utc::now(),
        };
        self.emit(AgentEvent::BasicMessageStateChanged {
            message: message.clone(),
        });
        Ok(message)
    }

    /// Receives a credential offer from the peer on `connection_id`.
    pub async fn offer_credential(
        &self,
        connection_id: &str,
        attributes: Vec<CredentialAttribute>,
    ) -> Result<CredentialExchangeRecord> {
        self.ensure_open()?;
        self.completed_connection(connection_id).await?;

        let record = CredentialExchangeRecord {
            id: Uuid::new_v4().to_string(),
            connection_id: connection_id.to_string(),
            state: CredentialState::OfferReceived,
            attributes,
            created_at: Utc::now(),
        };
        self.save_json(CREDENTIAL_CATEGORY, &record.id, &record).await?;
        self.emit(AgentEvent::CredentialStateChanged { record: record.clone() });
        Ok(record)
    }

    /// Receives a proof request for the named attributes from the peer.
    pub async fn request_proof(&self, connection_id: &str, attribute_names: &[&str]) -> Result<ProofExchangeRecord> {
        self.ensure_open()?;
        self.completed_connection(connection_id).await?;

        let record = ProofExchangeRecord {
            id: Uuid::new_v4().to_string(),
            connection_id: connection_id.to_string(),
            state: ProofState::RequestReceived,
            requested_attributes: attribute_names
                .iter()
                .enumerate()
                .map(|(i, name)| RequestedAttribute {
                    referent: format!("attr{}_referent", i + 1),
                    name: name.to_string(),
                })
                .collect(),
            created_at: Utc::now(),
        };
        self.save_json(PROOF_CATEGORY, &record.id, &record).await?;
        self.emit(AgentEvent::ProofStateChanged { record: record.clone() });
        Ok(record)
    }

    // ===== Helpers =====

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(DidiError::runtime("agent has been shut down"));
        }
        Ok(())
    }

    fn emit(&self, event: AgentEvent) {
        tracing::debug!("[Runtime] Emitting {} event", event.kind());
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    async fn save_json<T: Serialize>(&self, category: &str, id: &str, value: &T) -> Result<()> {
        let mut attributes = BTreeMap::new();
        attributes.insert(RECORD_ATTR.to_string(), serde_json::to_string(value)?);
        self.storage.save(StorageRecord::new(id, category, attributes)).await
    }

    async fn load_json<T: DeserializeOwned>(&self, entity_type: &'static str, id: &str) -> Result<T> {
        match self.storage.get_by_id(id).await {
            RecordLookup::Found(record) => decode_record(&record),
            RecordLookup::NotFound => Err(DidiError::not_found(entity_type, id)),
            RecordLookup::StorageError(reason) => Err(DidiError::storage(reason)),
        }
    }

    async fn load_all_json<T: DeserializeOwned>(&self, category: &str) -> Result<Vec<T>> {
        self.storage
            .find_by_category(category)
            .await?
            .iter()
            .map(decode_record)
            .collect()
    }

    async fn completed_connection(&self, connection_id: &str) -> Result<ConnectionRecord> {
        let connection: ConnectionRecord = self.load_json("connection", connection_id).await?;
        if !connection.is_ready() {
            return Err(DidiError::runtime(format!(
                "connection {} is not completed (state: {})",
                connection_id, connection.state
            )));
        }
        Ok(connection)
    }

    async fn credential(&self, id: &str, expected: CredentialState) -> Result<CredentialExchangeRecord> {
        let record: CredentialExchangeRecord = self.load_json("credential exchange", id).await?;
        if record.state != expected {
            return Err(DidiError::runtime(format!(
                "credential exchange {} is in state {}, expected {}",
                id, record.state, expected
            )));
        }
        Ok(record)
    }

    async fn proof(&self, id: &str, expected: ProofState) -> Result<ProofExchangeRecord> {
        let record: ProofExchangeRecord = self.load_json("proof exchange", id).await?;
        if record.state != expected {
            return Err(DidiError::runtime(format!(
                "proof exchange {} is in state {}, expected {}",
                id, record.state, expected
            )));
        }
        Ok(record)
    }

    async fn update_credential_state(&self, mut record: CredentialExchangeRecord, state: CredentialState) -> Result<()> {
        record.state = state;
        self.save_json(CREDENTIAL_CATEGORY, &record.id, &record).await?;
        self.emit(AgentEvent::CredentialStateChanged { record });
        Ok(())
    }

    async fn update_proof_state(&self, mut record: ProofExchangeRecord, state: ProofState) -> Result<()> {
        record.state = state;
        self.save_json(PROOF_CATEGORY, &record.id, &record).await?;
        self.emit(AgentEvent::ProofStateChanged { record });
        Ok(())
    }
}

fn decode_record<T: DeserializeOwned>(record: &StorageRecord) -> Result<T> {
    let json = record
        .attribute(RECORD_ATTR)
        .ok_or_else(|| DidiError::storage(format!("record '{}' has no payload", record.id)))?;
    Ok(serde_json::from_str(json)?)
}

/// Builds `did:<method>:<namespace>:<id>` from a 32-byte verification key.
fn did_from_verkey(method: &str, namespace: &str, verkey: &[u8; 32]) -> String {
    let id = hex::encode(&verkey[..16]);
    if namespace.is_empty() {
        format!("did:{method}:{id}")
    } else {
        format!("did:{method}:{namespace}:{id}")
    }
}

#[async_trait]
impl AgentRuntime for LocalAgentRuntime {
    fn subscribe(&self) -> broadcast::Receiver<AgentEvent> {
        self.events.subscribe()
    }

    fn storage(&self) -> Arc<dyn RecordStorage> {
        self.storage.clone()
    }

    async fn receive_invitation_from_url(&self, url: &str) -> Result<Option<ConnectionRecord>> {
        self.ensure_open()?;
        let invitation = parse_invitation_url(url)?;
        if !invitation.handshake {
            tracing::info!("[Runtime] Invitation without handshake, no connection created");
            return Ok(None);
        }

        let record = ConnectionRecord {
            id: Uuid::new_v4().to_string(),
            their_label: invitation.label,
            state: ConnectionState::RequestSent,
            created_at: Utc::now(),
        };
        self.save_json(CONNECTION_CATEGORY, &record.id, &record).await?;
        self.emit(AgentEvent::ConnectionStateChanged { record: record.clone() });
        Ok(Some(record))
    }

    async fn return_when_connected(&self, connection_id: &str) -> Result<ConnectionRecord> {
        self.ensure_open()?;
        let mut record: ConnectionRecord = self.load_json("connection", connection_id).await?;
        if record.state == ConnectionState::Abandoned {
            return Err(DidiError::runtime(format!("connection {} was abandoned", connection_id)));
        }

        if !record.is_ready() {
            record.state = ConnectionState::Completed;
            self.save_json(CONNECTION_CATEGORY, &record.id, &record).await?;
            self.emit(AgentEvent::ConnectionStateChanged { record: record.clone() });
        }
        Ok(record)
    }

    async fn get_connection(&self, connection_id: &str) -> Result<ConnectionRecord> {
        self.ensure_open()?;
        self.load_json("connection", connection_id).await
    }

    async fn accept_credential_offer(&self, credential_record_id: &str) -> Result<()> {
        self.ensure_open()?;
        let record = self
            .credential(credential_record_id, CredentialState::OfferReceived)
            .await?;
        // The local issuer answers the request immediately.
        self.update_credential_state(record, CredentialState::Done).await
    }

    async fn decline_credential_offer(&self, credential_record_id: &str) -> Result<()> {
        self.ensure_open()?;
        let record = self
            .credential(credential_record_id, CredentialState::OfferReceived)
            .await?;
        self.update_credential_state(record, CredentialState::Declined).await
    }

    async fn list_credentials(&self) -> Result<Vec<CredentialExchangeRecord>> {
        self.ensure_open()?;
        self.load_all_json(CREDENTIAL_CATEGORY).await
    }

    async fn select_credentials_for_proof_request(&self, proof_record_id: &str) -> Result<SelectedCredentials> {
        self.ensure_open()?;
        let proof = self.proof(proof_record_id, ProofState::RequestReceived).await?;
        let held: Vec<CredentialExchangeRecord> = self
            .load_all_json::<CredentialExchangeRecord>(CREDENTIAL_CATEGORY)
            .await?
            .into_iter()
            .filter(|c| c.state == CredentialState::Done)
            .collect();

        let mut selected = SelectedCredentials::default();
        for requested in &proof.requested_attributes {
            let found = held.iter().find_map(|credential| {
                credential
                    .attributes
                    .iter()
                    .find(|a| a.name == requested.name)
                    .map(|a| (credential, a))
            });
            match found {
                Some((credential, attribute)) => selected.attributes.push(SelectedAttribute {
                    referent: requested.referent.clone(),
                    name: requested.name.clone(),
                    credential_id: credential.id.clone(),
                    value: attribute.value.clone(),
                }),
                None => selected.unsatisfied.push(requested.name.clone()),
            }
        }
        Ok(selected)
    }

    async fn accept_proof_request(&self, proof_record_id: &str, selected: &SelectedCredentials) -> Result<()> {
        self.ensure_open()?;
        let record = self.proof(proof_record_id, ProofState::RequestReceived).await?;
        if !selected.is_satisfied() {
            return Err(DidiError::runtime(format!(
                "proof request cannot be satisfied, missing: {}",
                selected.unsatisfied.join(", ")
            )));
        }
        self.update_proof_state(record, ProofState::PresentationSent).await
    }

    async fn decline_proof_request(&self, proof_record_id: &str) -> Result<()> {
        self.ensure_open()?;
        let record = self.proof(proof_record_id, ProofState::RequestReceived).await?;
        self.update_proof_state(record, ProofState::Declined).await
    }

    async fn list_proofs(&self) -> Result<Vec<ProofExchangeRecord>> {
        self.ensure_open()?;
        self.load_all_json(PROOF_CATEGORY).await
    }

    async fn send_basic_message(&self, connection_id: &str, content: &str) -> Result<()> {
        self.ensure_open()?;
        self.completed_connection(connection_id).await?;

        let message = BasicMessageRecord {
            id: Uuid::new_v4().to_string(),
            connection_id: connection_id.to_string(),
            role: BasicMessageRole::Sender,
            content: content.to_string(),
            sent_time: Utc::now(),
        };
        self.outbox.lock().await.push(message.clone());
        tracing::info!("[Runtime] Sent basic message on connection {}", connection_id);
        self.emit(AgentEvent::BasicMessageStateChanged { message });
        Ok(())
    }

    async fn created_dids(&self, method: &str) -> Result<Vec<DidRecord>> {
        self.ensure_open()?;
        let dids: Vec<DidRecord> = self.load_all_json(DID_CATEGORY).await?;
        Ok(dids.into_iter().filter(|d| d.method == method).collect())
    }

    async fn import_did(&self, did: &str, seed: &str) -> Result<()> {
        self.ensure_open()?;
        let seed: [u8; 32] = seed
            .as_bytes()
            .try_into()
            .map_err(|_| DidiError::invalid_key(format!("seed must be 32 bytes, got {}", seed.len())))?;
        let verkey = SigningKey::from_bytes(&seed).verifying_key();

        let mut attributes = BTreeMap::new();
        attributes.insert("verkey".to_string(), STANDARD.encode(verkey.to_bytes()));
        self.storage
            .save(StorageRecord::new(did, IMPORTED_DID_CATEGORY, attributes))
            .await?;
        tracing::info!("[Runtime] Imported DID {}", did);
        Ok(())
    }

    async fn create_did(&self, options: DidCreateOptions) -> Result<String> {
        self.ensure_open()?;
        match self.storage.get_by_id(&options.endorser_did).await {
            RecordLookup::Found(record) if record.category == IMPORTED_DID_CATEGORY => {}
            RecordLookup::StorageError(reason) => return Err(DidiError::storage(reason)),
            _ => {
                return Err(DidiError::runtime(format!(
                    "endorser DID {} has not been imported",
                    options.endorser_did
                )));
            }
        }

        let bytes: [u8; 32] = STANDARD
            .decode(&options.verkey)?
            .try_into()
            .map_err(|_| DidiError::invalid_key("verkey must be 32 bytes"))?;
        VerifyingKey::from_bytes(&bytes).map_err(|e| DidiError::invalid_key(e.to_string()))?;

        let did = did_from_verkey(&options.method, &options.namespace, &bytes);
        let record = DidRecord {
            did: did.clone(),
            method: options.method,
            created_at: Utc::now(),
        };
        self.save_json(DID_CATEGORY, &did, &record).await?;
        tracing::info!("[Runtime] Created DID {} (endorser {})", did, options.endorser_did);
        Ok(did)
    }

    async fn shutdown(&self) -> Result<()> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            tracing::info!("[Runtime] Agent '{}' shut down", self.label);
        }
        Ok(())
    }
}

/// Opens [`LocalAgentRuntime`]s with one wallet file per wallet name.
#[derive(Debug, Clone)]
pub struct LocalRuntimeFactory {
    paths: DidiPaths,
}

impl LocalRuntimeFactory {
    pub fn new(paths: DidiPaths) -> Self {
        Self { paths }
    }
}

#[async_trait]
impl RuntimeFactory for LocalRuntimeFactory {
    async fn open(&self, label: &str, wallet: &WalletConfig) -> Result<Arc<dyn AgentRuntime>> {
        let storage = FileRecordStorage::new(self.paths.wallet_file(&wallet.id)?);
        let runtime = LocalAgentRuntime::open(label, storage, &wallet.key).await?;
        Ok(Arc::new(runtime))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use tempfile::TempDir;

    const ENDORSER_DID: &str = "did:indy:bcovrin:test:endorser";
    const ENDORSER_SEED: &str = "000000000000000000000000Steward1";

    async fn runtime(temp_dir: &TempDir) -> LocalAgentRuntime {
        let storage = FileRecordStorage::new(temp_dir.path().join("alice.toml"));
        LocalAgentRuntime::open("alice", storage, "pw").await.unwrap()
    }

    fn invitation_url() -> String {
        let json = r#"{"label":"Faber","handshake_protocols":["https://didcomm.org/didexchange/1.0"]}"#;
        format!("http://faber.example?oob={}", URL_SAFE_NO_PAD.encode(json))
    }

    async fn connect(runtime: &LocalAgentRuntime) -> String {
        let record = runtime
            .receive_invitation_from_url(&invitation_url())
            .await
            .unwrap()
            .unwrap();
        runtime.return_when_connected(&record.id).await.unwrap().id
    }

    fn verkey() -> String {
        STANDARD.encode(SigningKey::from_bytes(&[7u8; 32]).verifying_key().to_bytes())
    }

    #[tokio::test]
    async fn test_connection_handshake_completes() {
        let temp_dir = TempDir::new().unwrap();
        let runtime = runtime(&temp_dir).await;
        let mut events = runtime.subscribe();

        let record = runtime
            .receive_invitation_from_url(&invitation_url())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.state, ConnectionState::RequestSent);
        assert_eq!(record.their_label.as_deref(), Some("Faber"));

        let connected = runtime.return_when_connected(&record.id).await.unwrap();
        assert!(connected.is_ready());
        assert!(runtime.get_connection(&record.id).await.unwrap().is_ready());

        assert!(matches!(events.recv().await.unwrap(), AgentEvent::ConnectionStateChanged { .. }));
        match events.recv().await.unwrap() {
            AgentEvent::ConnectionStateChanged { record } => assert!(record.is_ready()),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_send_requires_known_connection() {
        let temp_dir = TempDir::new().unwrap();
        let runtime = runtime(&temp_dir).await;

        let err = runtime.send_basic_message("nope", "hi").await.unwrap_err();
        assert!(err.is_not_found());
        assert!(runtime.sent_messages().await.is_empty());
    }

    #[tokio::test]
    async fn test_send_records_outbox() {
        let temp_dir = TempDir::new().unwrap();
        let runtime = runtime(&temp_dir).await;
        let connection_id = connect(&runtime).await;

        runtime.send_basic_message(&connection_id, "hello").await.unwrap();

        let sent = runtime.sent_messages().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].content, "hello");
        assert_eq!(sent[0].role, BasicMessageRole::Sender);
    }

    #[tokio::test]
    async fn test_create_did_requires_imported_endorser() {
        let temp_dir = TempDir::new().unwrap();
        let runtime = runtime(&temp_dir).await;
        let options = DidCreateOptions {
            method: "indy".to_string(),
            namespace: "bcovrin:test".to_string(),
            endorser_did: ENDORSER_DID.to_string(),
            verkey: verkey(),
        };

        assert!(runtime.create_did(options.clone()).await.is_err());

        runtime.import_did(ENDORSER_DID, ENDORSER_SEED).await.unwrap();
        let did = runtime.create_did(options).await.unwrap();
        assert!(did.starts_with("did:indy:bcovrin:test:"));

        let dids = runtime.created_dids("indy").await.unwrap();
        assert_eq!(dids.len(), 1);
        assert_eq!(dids[0].did, did);
        assert!(runtime.created_dids("cheqd").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_import_did_rejects_short_seed() {
        let temp_dir = TempDir::new().unwrap();
        let runtime = runtime(&temp_dir).await;

        let err = runtime.import_did(ENDORSER_DID, "short").await.unwrap_err();
        assert!(err.is_invalid_key());
    }

    #[tokio::test]
    async fn test_credential_then_proof_selection() {
        let temp_dir = TempDir::new().unwrap();
        let runtime = runtime(&temp_dir).await;
        let connection_id = connect(&runtime).await;

        let offer = runtime
            .offer_credential(
                &connection_id,
                vec![
                    CredentialAttribute::new("name", "Alice Smith"),
                    CredentialAttribute::new("degree", "Computer Science"),
                ],
            )
            .await
            .unwrap();
        runtime.accept_credential_offer(&offer.id).await.unwrap();

        let proof = runtime
            .request_proof(&connection_id, &["name", "age"])
            .await
            .unwrap();
        let selected = runtime.select_credentials_for_proof_request(&proof.id).await.unwrap();
        assert_eq!(selected.attributes.len(), 1);
        assert_eq!(selected.attributes[0].value, "Alice Smith");
        assert_eq!(selected.unsatisfied, vec!["age".to_string()]);

        assert!(runtime.accept_proof_request(&proof.id, &selected).await.is_err());
        runtime.decline_proof_request(&proof.id).await.unwrap();

        let proofs = runtime.list_proofs().await.unwrap();
        assert_eq!(proofs[0].state, ProofState::Declined);
        let credentials = runtime.list_credentials().await.unwrap();
        assert_eq!(credentials[0].state, CredentialState::Done);
    }

    #[tokio::test]
    async fn test_declined_offer_cannot_be_accepted() {
        let temp_dir = TempDir::new().unwrap();
        let runtime = runtime(&temp_dir).await;
        let connection_id = connect(&runtime).await;
        let offer = runtime
            .offer_credential(&connection_id, vec![CredentialAttribute::new("name", "Alice")])
            .await
            .unwrap();

        runtime.decline_credential_offer(&offer.id).await.unwrap();
        assert!(runtime.accept_credential_offer(&offer.id).await.is_err());
    }

    #[tokio::test]
    async fn test_shutdown_rejects_operations() {
        let temp_dir = TempDir::new().unwrap();
        let runtime = runtime(&temp_dir).await;

        runtime.shutdown().await.unwrap();
        runtime.shutdown().await.unwrap();
        assert!(runtime.created_dids("indy").await.is_err());
    }

    #[tokio::test]
    async fn test_factory_reopens_wallet() {
        let temp_dir = TempDir::new().unwrap();
        let factory = LocalRuntimeFactory::new(DidiPaths::new(Some(temp_dir.path())));
        let wallet = WalletConfig::new("alice", "pw");

        let first = factory.open("alice", &wallet).await.unwrap();
        first.import_did(ENDORSER_DID, ENDORSER_SEED).await.unwrap();
        first.shutdown().await.unwrap();

        let second = factory.open("alice", &wallet).await.unwrap();
        assert!(second.storage().get_by_id(ENDORSER_DID).await.is_found());

        let wrong = factory.open("alice", &WalletConfig::new("alice", "other")).await;
        assert!(wrong.is_err());
    }
}
