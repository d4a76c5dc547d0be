//! The main menu loop.

use std::sync::Arc;

use didi_core::error::Result;
use didi_core::prompt::Prompter;
use didi_core::session::MenuState;

use crate::alice::Alice;
use crate::listener::{DispatcherCapabilities, Listener, ListeningGate};
use crate::session::inquirer::Inquirer;
use crate::session::menu::{self, PromptOption};
use crate::text;

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The operator confirmed exit; the runtime is shut down.
    Exited,
    /// The operator confirmed restart; the runtime is shut down and must be rebuilt.
    Restarted,
}

/// Presents the context-sensitive menu and runs the chosen actions.
///
/// The controller yields the terminal whenever the [`ListeningGate`] is
/// raised: a pending menu prompt is abandoned and the menu is offered
/// again once the sub-flow has finished.
pub struct SessionController {
    alice: Arc<Alice>,
    inquirer: Inquirer,
    listener: Listener,
    gate: ListeningGate,
}

impl SessionController {
    pub fn new(alice: Arc<Alice>, prompter: Arc<dyn Prompter>, capabilities: DispatcherCapabilities) -> Self {
        let gate = ListeningGate::new();
        let inquirer = Inquirer::new(prompter, alice.clone());
        let listener = Listener::new(alice.clone(), inquirer.clone(), gate.clone(), capabilities);
        Self {
            alice,
            inquirer,
            listener,
            gate,
        }
    }

    /// A handle to this session's listener, sharing its gate.
    pub fn listener(&self) -> Listener {
        self.listener.clone()
    }

    pub fn gate(&self) -> &ListeningGate {
        &self.gate
    }

    pub async fn menu_state(&self) -> MenuState {
        if self.alice.is_connected().await {
            MenuState::Connected
        } else {
            MenuState::NoConnection
        }
    }

    /// Runs the menu until the operator exits or restarts.
    ///
    /// Action failures are shown to the operator and the menu is offered
    /// again. Only a failure to read operator input ends the loop with an error.
    pub async fn run(&self) -> Result<SessionOutcome> {
        loop {
            self.gate.wait_idle().await;
            let options = menu::options_for(self.menu_state().await);

            let choice = tokio::select! {
                biased;
                _ = self.gate.wait_listening() => continue,
                choice = self.inquirer.choose(&options) => choice?,
            };
            // A sub-flow took the terminal while the answer was read.
            if self.gate.is_listening() {
                continue;
            }

            match self.process_answer(choice).await {
                Ok(Some(outcome)) => return Ok(outcome),
                Ok(None) => {}
                Err(e) => {
                    tracing::error!("[Session] '{}' failed: {}", choice, e);
                    self.inquirer.error(&e.to_string());
                }
            }
        }
    }

    /// Runs one menu action. Returns the outcome when the action ends the session.
    pub async fn process_answer(&self, choice: PromptOption) -> Result<Option<SessionOutcome>> {
        match choice {
            PromptOption::ReceiveConnectionUrl => self.connection().await?,
            PromptOption::SendMessage => self.message().await?,
            PromptOption::ShowCredentials => self.inquirer.show_credentials(&self.alice.credentials().await?),
            PromptOption::ShowProofs => self.inquirer.show_proofs(&self.alice.proofs().await?),
            PromptOption::Exit => {
                if self.inquirer.confirm(text::CONFIRM_TITLE).await? {
                    self.inquirer.info(text::EXIT);
                    self.alice.exit().await?;
                    return Ok(Some(SessionOutcome::Exited));
                }
            }
            PromptOption::Restart => {
                if self.inquirer.confirm(text::CONFIRM_TITLE).await? {
                    self.inquirer.info(text::RESTART);
                    self.alice.restart().await?;
                    return Ok(Some(SessionOutcome::Restarted));
                }
            }
        }
        Ok(None)
    }

    async fn connection(&self) -> Result<()> {
        let url = self.inquirer.ask_invitation_url().await?;
        let record = self.alice.accept_connection(&url).await?;
        self.inquirer.success(text::CONNECTION_ESTABLISHED);
        self.listener.watch_connection(&record.id).await;
        Ok(())
    }

    async fn message(&self) -> Result<()> {
        if let Some(message) = self.inquirer.ask_message().await? {
            self.alice.send_message(&message).await?;
        }
        Ok(())
    }
}
