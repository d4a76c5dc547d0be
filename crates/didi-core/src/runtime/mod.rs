pub mod agent;
pub mod event;
pub mod model;

pub use agent::{AgentRuntime, RuntimeFactory};
pub use event::AgentEvent;
pub use model::{
    BasicMessageRecord, BasicMessageRole, ConnectionRecord, ConnectionState, CredentialAttribute,
    CredentialExchangeRecord, CredentialState, DidCreateOptions, DidRecord, ProofExchangeRecord,
    ProofState, RequestedAttribute, SelectedAttribute, SelectedCredentials, WalletConfig,
};
