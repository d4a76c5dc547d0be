//! Application sub-protocols carried over basic messages.

use std::sync::Arc;

use didi_core::error::Result;
use didi_core::message::{Ballot, DidChallengeResponse, InboundMessage};
use didi_core::session::SubflowKind;

use crate::alice::Alice;
use crate::identity::SigningKeyPair;
use crate::listener::gate::ListeningGate;
use crate::session::inquirer::Inquirer;

/// Which sub-protocols the dispatcher answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatcherCapabilities {
    pub did_auth: bool,
    pub voting: bool,
}

impl Default for DispatcherCapabilities {
    fn default() -> Self {
        Self {
            did_auth: true,
            voting: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    ChallengeAnswered,
    BallotAnswered,
    /// Not an application message, or its sub-protocol is disabled.
    Ignored,
    /// The message was recognized but could not be answered; nothing was sent.
    Failed(String),
}

#[derive(Clone)]
pub struct Dispatcher {
    alice: Arc<Alice>,
    inquirer: Inquirer,
    gate: ListeningGate,
    capabilities: DispatcherCapabilities,
}

impl Dispatcher {
    pub fn new(
        alice: Arc<Alice>,
        inquirer: Inquirer,
        gate: ListeningGate,
        capabilities: DispatcherCapabilities,
    ) -> Self {
        Self {
            alice,
            inquirer,
            gate,
            capabilities,
        }
    }

    /// Classifies a message body and answers it. Never fails: errors are
    /// logged and reported as [`DispatchOutcome::Failed`].
    pub async fn dispatch(&self, content: &str) -> DispatchOutcome {
        self.dispatch_message(InboundMessage::decode(content)).await
    }

    /// Answers an already decoded message.
    pub async fn dispatch_message(&self, message: InboundMessage) -> DispatchOutcome {
        let result = match message {
            InboundMessage::DidChallenge(challenge) if self.capabilities.did_auth => self
                .answer_challenge(&challenge)
                .await
                .map(|_| DispatchOutcome::ChallengeAnswered),
            InboundMessage::VoteBallot(ballot) if self.capabilities.voting => self
                .present_ballot(&ballot)
                .await
                .map(|_| DispatchOutcome::BallotAnswered),
            InboundMessage::DidChallenge(_) | InboundMessage::VoteBallot(_) => {
                tracing::debug!("[Dispatch] Sub-protocol disabled, message ignored");
                return DispatchOutcome::Ignored;
            }
            InboundMessage::Unrecognized => return DispatchOutcome::Ignored,
        };

        result.unwrap_or_else(|e| {
            tracing::error!("[Dispatch] Failed to answer message: {}", e);
            DispatchOutcome::Failed(e.to_string())
        })
    }

    /// Signs the challenge with the stored identity key and replies `{did, signature}`.
    async fn answer_challenge(&self, challenge: &[u8]) -> Result<()> {
        let identity = self.alice.key_store().load_identity().await?;
        let keypair = SigningKeyPair::from_private_key_text(&identity.private_key)?;

        let response = DidChallengeResponse {
            did: self.alice.did().to_string(),
            signature: keypair.sign_base64(challenge),
        };
        self.alice.send_message(&serde_json::to_string(&response)?).await?;
        tracing::info!("[Dispatch] Answered DID challenge ({} bytes)", challenge.len());
        Ok(())
    }

    /// Shows the ballot and forwards the operator's answer unvalidated.
    async fn present_ballot(&self, ballot: &Ballot) -> Result<()> {
        self.inquirer.show_ballot(ballot);

        let _guard = self.gate.enter(SubflowKind::Ballot);
        let answer = self.inquirer.ask_vote().await?;
        self.alice
            .send_message(answer.trim_end_matches(['\r', '\n']))
            .await?;
        tracing::info!("[Dispatch] Vote sent for {}", ballot.header());
        Ok(())
    }
}
