//! Session bootstrap and restart loop.

use std::sync::Arc;

use didi_core::config::DidiConfig;
use didi_core::error::Result;
use didi_core::prompt::{Prompter, Tone};
use didi_core::runtime::{RuntimeFactory, WalletConfig};
use tokio_util::sync::CancellationToken;

use crate::alice::Alice;
use crate::listener::DispatcherCapabilities;
use crate::session::controller::{SessionController, SessionOutcome};
use crate::text;

/// Runs sessions until the operator exits.
///
/// Each pass asks for the wallet, builds a fresh [`Alice`] and runs the menu.
/// A restart discards everything held in memory and starts over.
pub async fn run_didi(
    factory: &dyn RuntimeFactory,
    prompter: Arc<dyn Prompter>,
    config: &DidiConfig,
    capabilities: DispatcherCapabilities,
) -> Result<()> {
    loop {
        prompter.display(Tone::Highlight, text::BANNER);
        let wallet_name = prompter.input(text::WALLET_NAME_TITLE).await?;
        let wallet_key = prompter.input(text::WALLET_PASSWORD_TITLE).await?;
        prompter.display(Tone::Success, text::CREATING_AGENT);

        let wallet = WalletConfig::new(wallet_name.trim(), wallet_key);
        let alice = Arc::new(Alice::build(factory, &wallet, config).await?);

        match run_session(alice, prompter.clone(), capabilities).await? {
            SessionOutcome::Exited => {
                tracing::info!("[Bootstrap] Session exited");
                return Ok(());
            }
            SessionOutcome::Restarted => tracing::info!("[Bootstrap] Restarting session"),
        }
    }
}

/// Runs one session: the listener task alongside the menu loop.
pub async fn run_session(
    alice: Arc<Alice>,
    prompter: Arc<dyn Prompter>,
    capabilities: DispatcherCapabilities,
) -> Result<SessionOutcome> {
    let controller = SessionController::new(alice.clone(), prompter, capabilities);
    let cancel = CancellationToken::new();
    let listener = controller.listener().spawn(cancel.clone());

    let outcome = controller.run().await;

    cancel.cancel();
    if let Err(e) = listener.await {
        tracing::warn!("[Bootstrap] Listener task ended abnormally: {}", e);
    }
    if outcome.is_err() {
        if let Err(e) = alice.exit().await {
            tracing::warn!("[Bootstrap] Runtime shutdown failed: {}", e);
        }
    }
    outcome
}
