//! Guided operator dialogs.

use std::str::FromStr;
use std::sync::Arc;

use didi_core::error::{DidiError, Result};
use didi_core::message::Ballot;
use didi_core::prompt::{Prompter, Tone};
use didi_core::runtime::{CredentialAttribute, CredentialExchangeRecord, ProofExchangeRecord};

use crate::alice::Alice;
use crate::session::menu::PromptOption;
use crate::text;

/// Runs the operator-facing side of menus and sub-flows.
#[derive(Clone)]
pub struct Inquirer {
    prompter: Arc<dyn Prompter>,
    alice: Arc<Alice>,
}

impl Inquirer {
    pub fn new(prompter: Arc<dyn Prompter>, alice: Arc<Alice>) -> Self {
        Self { prompter, alice }
    }

    pub async fn choose(&self, options: &[PromptOption]) -> Result<PromptOption> {
        let labels: Vec<String> = options.iter().map(ToString::to_string).collect();
        let answer = self.prompter.select(text::MENU_TITLE, &labels).await?;
        PromptOption::from_str(&answer).map_err(|_| DidiError::prompt(format!("unknown menu option '{}'", answer)))
    }

    /// Asks whether to accept a credential offer and relays the answer.
    pub async fn accept_credential_offer(&self, record: &CredentialExchangeRecord) -> Result<()> {
        if self.confirm(text::CREDENTIAL_OFFER_TITLE).await? {
            self.alice.accept_credential_offer(record).await?;
            self.success(text::CREDENTIAL_ACCEPTED);
        } else {
            self.alice.decline_credential_offer(record).await?;
            self.info(text::CREDENTIAL_DECLINED);
        }
        Ok(())
    }

    /// Shows what a proof request would disclose, then asks whether to present it.
    pub async fn accept_proof_request(&self, record: &ProofExchangeRecord) -> Result<()> {
        let selected = self.alice.select_credentials(record).await?;

        self.info(text::PROOF_DISCLOSURE);
        for attribute in &selected.attributes {
            self.prompter
                .display(Tone::Highlight, &format!("{} {}", attribute.name, attribute.value));
        }
        if !selected.is_satisfied() {
            self.error(&format!("No credential holds: {}", selected.unsatisfied.join(", ")));
        }

        if self.confirm(text::PROOF_REQUEST_TITLE).await? {
            self.alice.accept_proof_request(record, &selected).await?;
            self.success(text::PROOF_ACCEPTED);
        } else {
            self.alice.decline_proof_request(record).await?;
            self.info(text::PROOF_DECLINED);
        }
        Ok(())
    }

    pub fn print_credential_attributes(&self, attributes: &[CredentialAttribute]) {
        if attributes.is_empty() {
            return;
        }
        self.info(text::CREDENTIAL_PREVIEW);
        for attribute in attributes {
            self.prompter
                .display(Tone::Highlight, &format!("{} {}", attribute.name, attribute.value));
        }
    }

    pub fn show_ballot(&self, ballot: &Ballot) {
        self.prompter.display(Tone::Highlight, &ballot.header());
        for line in ballot.candidate_lines() {
            self.info(&line);
        }
    }

    /// Returns the operator's answer exactly as typed.
    pub async fn ask_vote(&self) -> Result<String> {
        self.prompter.input(text::VOTE_TITLE).await
    }

    pub async fn ask_invitation_url(&self) -> Result<String> {
        Ok(self.prompter.input(text::INVITATION_TITLE).await?.trim().to_string())
    }

    /// Returns `None` when the operator enters nothing.
    pub async fn ask_message(&self) -> Result<Option<String>> {
        let message = self.prompter.input(text::MESSAGE_TITLE).await?;
        let message = message.trim();
        Ok((!message.is_empty()).then(|| message.to_string()))
    }

    pub async fn confirm(&self, title: &str) -> Result<bool> {
        self.prompter.confirm(title).await
    }

    pub fn show_credentials(&self, records: &[CredentialExchangeRecord]) {
        if records.is_empty() {
            self.info(text::NO_CREDENTIALS);
            return;
        }
        for record in records {
            self.prompter
                .display(Tone::Highlight, &format!("{} [{}]", record.id, record.state));
            for attribute in &record.attributes {
                self.info(&format!("  {} {}", attribute.name, attribute.value));
            }
        }
    }

    pub fn show_proofs(&self, records: &[ProofExchangeRecord]) {
        if records.is_empty() {
            self.info(text::NO_PROOFS);
            return;
        }
        for record in records {
            let names: Vec<&str> = record.requested_attributes.iter().map(|a| a.name.as_str()).collect();
            self.prompter
                .display(Tone::Highlight, &format!("{} [{}]", record.id, record.state));
            self.info(&format!("  requested: {}", names.join(", ")));
        }
    }

    pub fn success(&self, message: &str) {
        self.prompter.display(Tone::Success, message);
    }

    pub fn error(&self, message: &str) {
        self.prompter.display(Tone::Error, message);
    }

    pub fn info(&self, message: &str) {
        self.prompter.display(Tone::Plain, message);
    }

    pub fn highlight(&self, message: &str) {
        self.prompter.display(Tone::Highlight, message);
    }
}
