//! Application messages carried inside basic messages.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ballot::Ballot;

const DID_CHALLENGE_KEY: &str = "DIDMessage";
const VOTE_KEY: &str = "voteMessage";

/// An inbound basic-message body, classified by payload shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    /// `{"DIDMessage": [..bytes..]}`: prove control of the DID by signing.
    DidChallenge(Vec<u8>),
    /// `{"voteMessage": {..}}`: present a ballot to the operator.
    VoteBallot(Ballot),
    /// Plain text, other JSON, or a recognized key with a bad payload.
    Unrecognized,
}

impl InboundMessage {
    /// Decodes a message body once, classified by its marker key.
    ///
    /// A challenge must carry byte values (0-255). A ballot is accepted as
    /// soon as its payload is an object; candidate fields are read leniently.
    pub fn decode(content: &str) -> Self {
        let value: Value = match serde_json::from_str(content) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!("[Dispatch] Message is not JSON: {}", e);
                return Self::Unrecognized;
            }
        };

        if let Some(payload) = value.get(DID_CHALLENGE_KEY) {
            return match Vec::<u8>::deserialize(payload) {
                Ok(challenge) => Self::DidChallenge(challenge),
                Err(e) => {
                    tracing::warn!("[Dispatch] Malformed DID challenge: {}", e);
                    Self::Unrecognized
                }
            };
        }
        if let Some(payload) = value.get(VOTE_KEY) {
            if !payload.is_object() {
                tracing::warn!("[Dispatch] Vote payload is not an object");
                return Self::Unrecognized;
            }
            return match Ballot::deserialize(payload) {
                Ok(ballot) => Self::VoteBallot(ballot),
                Err(e) => {
                    tracing::warn!("[Dispatch] Malformed vote payload: {}", e);
                    Self::Unrecognized
                }
            };
        }

        tracing::debug!("[Dispatch] Unrecognized message shape");
        Self::Unrecognized
    }

    /// Whether answering this message takes the operator's terminal.
    pub fn needs_operator(&self) -> bool {
        matches!(self, Self::VoteBallot(_))
    }
}

/// Reply to a DID-ownership challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DidChallengeResponse {
    pub did: String,
    /// Base64 encoded Ed25519 signature over the challenge bytes.
    pub signature: String,
}
