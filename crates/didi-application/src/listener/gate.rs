//! Terminal ownership gate between the menu loop and sub-flows.

use std::sync::Arc;

use didi_core::session::{SessionState, SubflowKind};
use tokio::sync::watch;

/// Tracks whether a sub-flow currently owns the terminal.
///
/// The menu loop only prompts while the gate is `Idle`. Sub-flows take the
/// terminal with [`ListeningGate::enter`]; the returned guard hands it back
/// when dropped, on success, decline and error alike.
#[derive(Debug, Clone)]
pub struct ListeningGate {
    state: Arc<watch::Sender<SessionState>>,
}

impl Default for ListeningGate {
    fn default() -> Self {
        Self::new()
    }
}

impl ListeningGate {
    pub fn new() -> Self {
        let (state, _) = watch::channel(SessionState::Idle);
        Self { state: Arc::new(state) }
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    pub fn is_listening(&self) -> bool {
        self.state().is_listening()
    }

    /// Hands the terminal to a `kind` sub-flow until the guard is dropped.
    pub fn enter(&self, kind: SubflowKind) -> SubflowGuard {
        let previous = self.state.send_replace(SessionState::AwaitingSubflow(kind));
        tracing::debug!("[Gate] {} sub-flow started", kind);
        SubflowGuard {
            gate: self.clone(),
            kind,
            previous,
        }
    }

    /// Resolves once no sub-flow owns the terminal.
    pub async fn wait_idle(&self) {
        let mut receiver = self.state.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = receiver.wait_for(|state| !state.is_listening()).await;
    }

    /// Resolves once a sub-flow takes the terminal.
    pub async fn wait_listening(&self) {
        let mut receiver = self.state.subscribe();
        let _ = receiver.wait_for(SessionState::is_listening).await;
    }
}

/// Restores the gate's previous state when dropped.
#[must_use = "the sub-flow ends as soon as the guard is dropped"]
pub struct SubflowGuard {
    gate: ListeningGate,
    kind: SubflowKind,
    previous: SessionState,
}

impl Drop for SubflowGuard {
    fn drop(&mut self) {
        self.gate.state.send_replace(self.previous);
        tracing::debug!("[Gate] {} sub-flow finished", self.kind);
    }
}
