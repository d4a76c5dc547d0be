//! Event listener.
//!
//! Events that need the operator (credential offers, proof requests and
//! ballots) run one at a time on an operator lane, in arrival order. Messages
//! that can be answered without the terminal, such as DID challenges, are
//! answered right away on background tasks, even while a prompt is open.

pub mod dispatcher;
pub mod gate;

use std::collections::HashSet;
use std::sync::Arc;

use didi_core::runtime::{
    AgentEvent, BasicMessageRecord, BasicMessageRole, CredentialExchangeRecord, CredentialState, ProofExchangeRecord,
    ProofState,
};
use didi_core::message::InboundMessage;
use didi_core::session::SubflowKind;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{RwLock, mpsc};
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;

pub use dispatcher::{DispatchOutcome, Dispatcher, DispatcherCapabilities};
pub use gate::{ListeningGate, SubflowGuard};

use crate::alice::Alice;
use crate::session::inquirer::Inquirer;

/// Work queued for the operator lane.
enum OperatorWork {
    Event(AgentEvent),
    Message { id: String, message: InboundMessage },
}

#[derive(Clone)]
pub struct Listener {
    alice: Arc<Alice>,
    inquirer: Inquirer,
    gate: ListeningGate,
    dispatcher: Dispatcher,
    /// Connections whose credential offers and proof requests are handled.
    watched: Arc<RwLock<HashSet<String>>>,
}

impl Listener {
    pub fn new(alice: Arc<Alice>, inquirer: Inquirer, gate: ListeningGate, capabilities: DispatcherCapabilities) -> Self {
        let dispatcher = Dispatcher::new(alice.clone(), inquirer.clone(), gate.clone(), capabilities);
        Self {
            alice,
            inquirer,
            gate,
            dispatcher,
            watched: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    pub fn gate(&self) -> &ListeningGate {
        &self.gate
    }

    /// Starts handling credential offers and proof requests on `connection_id`.
    pub async fn watch_connection(&self, connection_id: &str) {
        if self.watched.write().await.insert(connection_id.to_string()) {
            tracing::debug!("[Listener] Watching connection {}", connection_id);
        }
    }

    async fn is_watched(&self, connection_id: &str) -> bool {
        self.watched.read().await.contains(connection_id)
    }

    pub async fn handle_event(&self, event: AgentEvent) {
        tracing::trace!("[Listener] {} event", event.kind());
        match event {
            AgentEvent::CredentialStateChanged { record } if record.state == CredentialState::OfferReceived => {
                if self.is_watched(&record.connection_id).await {
                    self.on_credential_offered(&record).await;
                }
            }
            AgentEvent::ProofStateChanged { record } if record.state == ProofState::RequestReceived => {
                if self.is_watched(&record.connection_id).await {
                    self.on_proof_requested(&record).await;
                }
            }
            AgentEvent::BasicMessageStateChanged { message } if message.role == BasicMessageRole::Receiver => {
                self.on_message_received(&message).await;
            }
            _ => {}
        }
    }

    async fn on_credential_offered(&self, record: &CredentialExchangeRecord) {
        self.inquirer.print_credential_attributes(&record.attributes);

        let _guard = self.gate.enter(SubflowKind::CredentialOffer);
        if let Err(e) = self.inquirer.accept_credential_offer(record).await {
            tracing::error!("[Listener] Credential offer {} failed: {}", record.id, e);
            self.inquirer.error(&e.to_string());
        }
    }

    async fn on_proof_requested(&self, record: &ProofExchangeRecord) {
        let _guard = self.gate.enter(SubflowKind::ProofRequest);
        if let Err(e) = self.inquirer.accept_proof_request(record).await {
            tracing::error!("[Listener] Proof request {} failed: {}", record.id, e);
            self.inquirer.error(&e.to_string());
        }
    }

    async fn on_message_received(&self, message: &BasicMessageRecord) {
        self.echo(message);
        let outcome = self.dispatcher.dispatch(&message.content).await;
        tracing::debug!("[Listener] Message {} dispatched: {:?}", message.id, outcome);
    }

    fn echo(&self, message: &BasicMessageRecord) {
        self.inquirer.highlight(&format!(
            "{} received a message: {}",
            self.alice.name(),
            message.content
        ));
    }

    /// Sends operator work to the lane and answers everything else in `background`.
    fn route(&self, event: AgentEvent, lane: &mpsc::UnboundedSender<OperatorWork>, background: &mut JoinSet<()>) {
        let work = match event {
            AgentEvent::BasicMessageStateChanged { message } if message.role == BasicMessageRole::Receiver => {
                self.echo(&message);
                let inbound = InboundMessage::decode(&message.content);
                if !inbound.needs_operator() {
                    let dispatcher = self.dispatcher.clone();
                    background.spawn(async move {
                        let outcome = dispatcher.dispatch_message(inbound).await;
                        tracing::debug!("[Listener] Message {} dispatched: {:?}", message.id, outcome);
                    });
                    return;
                }
                OperatorWork::Message {
                    id: message.id,
                    message: inbound,
                }
            }
            event @ (AgentEvent::CredentialStateChanged { .. } | AgentEvent::ProofStateChanged { .. }) => {
                OperatorWork::Event(event)
            }
            _ => return,
        };
        if lane.send(work).is_err() {
            tracing::warn!("[Listener] Operator lane closed, event dropped");
        }
    }

    async fn run_operator_work(&self, work: OperatorWork) {
        match work {
            OperatorWork::Event(event) => self.handle_event(event).await,
            OperatorWork::Message { id, message } => {
                let outcome = self.dispatcher.dispatch_message(message).await;
                tracing::debug!("[Listener] Message {} dispatched: {:?}", id, outcome);
            }
        }
    }

    async fn run_operator_lane(self, mut work: mpsc::UnboundedReceiver<OperatorWork>, cancel: CancellationToken) {
        loop {
            let next = tokio::select! {
                _ = cancel.cancelled() => break,
                next = work.recv() => next,
            };
            let Some(next) = next else { break };
            // Dropping an open sub-flow releases the gate through its guard.
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = self.run_operator_work(next) => {}
            }
        }
    }

    /// Subscribes to the runtime and handles events until `cancel` fires or
    /// the event bus closes.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        let mut events = self.alice.runtime().subscribe();
        tokio::spawn(async move {
            let (lane, work) = mpsc::unbounded_channel();
            let operator = tokio::spawn(self.clone().run_operator_lane(work, cancel.clone()));
            let mut background = JoinSet::new();

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    Some(joined) = background.join_next(), if !background.is_empty() => {
                        if let Err(e) = joined {
                            tracing::warn!("[Listener] Message task failed: {}", e);
                        }
                    }
                    received = events.recv() => match received {
                        Ok(event) => self.route(event, &lane, &mut background),
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!("[Listener] Skipped {} events", skipped);
                        }
                        Err(RecvError::Closed) => break,
                    },
                }
            }

            // Let queued work finish unless cancelled; the set aborts the rest on drop.
            drop(lane);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    joined = background.join_next() => {
                        if joined.is_none() {
                            break;
                        }
                    }
                }
            }
            if let Err(e) = operator.await {
                tracing::warn!("[Listener] Operator lane failed: {}", e);
            }
            tracing::debug!("[Listener] Stopped");
        })
    }
}
