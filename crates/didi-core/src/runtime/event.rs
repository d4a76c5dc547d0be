use serde::{Deserialize, Serialize};

use super::model::{BasicMessageRecord, CredentialExchangeRecord, ConnectionRecord, ProofExchangeRecord};

/// Events published on the agent runtime's event bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    ConnectionStateChanged {
        record: ConnectionRecord,
    },
    CredentialStateChanged {
        record: CredentialExchangeRecord,
    },
    ProofStateChanged {
        record: ProofExchangeRecord,
    },
    BasicMessageStateChanged {
        message: BasicMessageRecord,
    },
}

impl AgentEvent {
    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConnectionStateChanged { .. } => "connection",
            Self::CredentialStateChanged { .. } => "credential",
            Self::ProofStateChanged { .. } => "proof",
            Self::BasicMessageStateChanged { .. } => "basic_message",
        }
    }
}
