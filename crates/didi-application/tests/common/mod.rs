#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use didi_application::{Alice, ListeningGate};
use didi_core::config::DidiConfig;
use didi_core::error::{DidiError, Result};
use didi_core::prompt::{Prompter, Tone};
use didi_core::runtime::AgentRuntime;
use didi_core::session::SessionState;
use didi_infrastructure::{FileRecordStorage, LocalAgentRuntime};
use tempfile::TempDir;
use tokio::sync::Notify;

pub const ENDORSER_DID: &str = "did:indy:bcovrin:test:endorser";
pub const ENDORSER_SEED: &str = "000000000000000000000000Steward1";

/// One scripted operator answer.
#[derive(Debug, Clone)]
pub enum Answer {
    Select(&'static str),
    Input(&'static str),
    Confirm(bool),
}

/// Prompter that replays a fixed script and records everything displayed.
///
/// A prompt that does not match the next scripted answer, or arrives after
/// the script is exhausted, fails with a prompt error.
#[derive(Default)]
pub struct ScriptedPrompter {
    answers: Mutex<VecDeque<Answer>>,
    displayed: Mutex<Vec<(Tone, String)>>,
}

impl ScriptedPrompter {
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Arc<Self> {
        Arc::new(Self {
            answers: Mutex::new(answers.into_iter().collect()),
            displayed: Mutex::new(Vec::new()),
        })
    }

    pub fn displayed(&self) -> Vec<(Tone, String)> {
        self.displayed.lock().unwrap().clone()
    }

    pub fn lines(&self) -> Vec<String> {
        self.displayed().into_iter().map(|(_, line)| line).collect()
    }

    pub fn remaining(&self) -> usize {
        self.answers.lock().unwrap().len()
    }

    fn next(&self, title: &str) -> Result<Answer> {
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| DidiError::prompt(format!("script exhausted at '{}'", title)))
    }
}

#[async_trait]
impl Prompter for ScriptedPrompter {
    async fn select(&self, title: &str, options: &[String]) -> Result<String> {
        match self.next(title)? {
            Answer::Select(choice) if options.iter().any(|o| o == choice) => Ok(choice.to_string()),
            other => Err(DidiError::prompt(format!(
                "'{}' offered {:?}, script had {:?}",
                title, options, other
            ))),
        }
    }

    async fn input(&self, title: &str) -> Result<String> {
        match self.next(title)? {
            Answer::Input(text) => Ok(text.to_string()),
            other => Err(DidiError::prompt(format!("'{}' expected input, script had {:?}", title, other))),
        }
    }

    async fn confirm(&self, title: &str) -> Result<bool> {
        match self.next(title)? {
            Answer::Confirm(yes) => Ok(yes),
            other => Err(DidiError::prompt(format!("'{}' expected confirm, script had {:?}", title, other))),
        }
    }

    fn display(&self, tone: Tone, text: &str) {
        self.displayed.lock().unwrap().push((tone, text.to_string()));
    }
}

pub fn config() -> DidiConfig {
    let mut config = DidiConfig::default();
    config.endorser.did = Some(ENDORSER_DID.to_string());
    config.endorser.seed = Some(ENDORSER_SEED.to_string());
    config
}

pub async fn open_runtime(temp_dir: &TempDir) -> Arc<LocalAgentRuntime> {
    let storage = FileRecordStorage::new(temp_dir.path().join("alice.toml"));
    Arc::new(LocalAgentRuntime::open("alice", storage, "secret").await.unwrap())
}

pub async fn build_alice(runtime: &Arc<LocalAgentRuntime>) -> Arc<Alice> {
    let runtime: Arc<dyn AgentRuntime> = runtime.clone();
    Arc::new(Alice::with_runtime("alice".to_string(), runtime, &config()).await.unwrap())
}

pub fn invitation_url() -> &'static str {
    static URL: OnceLock<String> = OnceLock::new();
    URL.get_or_init(|| {
        let json = r#"{"label":"Faber","handshake_protocols":["https://didcomm.org/didexchange/1.0"]}"#;
        format!("http://faber.example:9001?oob={}", URL_SAFE_NO_PAD.encode(json))
    })
}

/// Connects `alice` to the simulated peer and returns the connection id.
pub async fn connect(alice: &Alice) -> String {
    alice.accept_connection(invitation_url()).await.unwrap().id
}

pub fn sent_contents(messages: &[didi_core::runtime::BasicMessageRecord]) -> Vec<String> {
    messages.iter().map(|m| m.content.clone()).collect()
}

/// Scripted prompter for interleaving sub-flows with an open menu prompt.
///
/// The first menu prompt can be held open until the session abandons it, or
/// can run a hook before answering from the script. Confirmations can be held
/// open forever. Everything else is answered by the inner script.
pub struct HeldPrompter {
    script: Arc<ScriptedPrompter>,
    hold_first_menu: bool,
    hold_confirms: bool,
    first_menu_hook: Mutex<Option<Box<dyn FnOnce() + Send>>>,
    gate: OnceLock<ListeningGate>,
    menus_offered: AtomicUsize,
    menus_abandoned: Arc<AtomicUsize>,
    gate_at_menu: Mutex<Vec<SessionState>>,
    menu_opened: Notify,
}

/// Counts a held prompt as abandoned when its future is dropped.
struct AbandonedOnDrop(Arc<AtomicUsize>);

impl Drop for AbandonedOnDrop {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

impl HeldPrompter {
    fn with(answers: impl IntoIterator<Item = Answer>, hold_first_menu: bool, hold_confirms: bool) -> Arc<Self> {
        Arc::new(Self {
            script: ScriptedPrompter::new(answers),
            hold_first_menu,
            hold_confirms,
            first_menu_hook: Mutex::new(None),
            gate: OnceLock::new(),
            menus_offered: AtomicUsize::new(0),
            menus_abandoned: Arc::new(AtomicUsize::new(0)),
            gate_at_menu: Mutex::new(Vec::new()),
            menu_opened: Notify::new(),
        })
    }

    pub fn holding_first_menu(answers: impl IntoIterator<Item = Answer>) -> Arc<Self> {
        Self::with(answers, true, false)
    }

    pub fn scripted(answers: impl IntoIterator<Item = Answer>) -> Arc<Self> {
        Self::with(answers, false, false)
    }

    pub fn holding_confirms() -> Arc<Self> {
        Self::with([], false, true)
    }

    /// Records the gate state each time a menu is offered.
    pub fn watch_gate(&self, gate: ListeningGate) {
        let _ = self.gate.set(gate);
    }

    /// Runs `hook` inside the first menu prompt, before it is answered.
    pub fn on_first_menu(&self, hook: impl FnOnce() + Send + 'static) {
        *self.first_menu_hook.lock().unwrap() = Some(Box::new(hook));
    }

    /// Resolves once the first menu prompt is open.
    pub async fn menu_opened(&self) {
        self.menu_opened.notified().await;
    }

    pub fn menus_offered(&self) -> usize {
        self.menus_offered.load(Ordering::SeqCst)
    }

    pub fn menus_abandoned(&self) -> usize {
        self.menus_abandoned.load(Ordering::SeqCst)
    }

    pub fn gate_at_menu(&self) -> Vec<SessionState> {
        self.gate_at_menu.lock().unwrap().clone()
    }

    pub fn script(&self) -> &ScriptedPrompter {
        &self.script
    }
}

#[async_trait]
impl Prompter for HeldPrompter {
    async fn select(&self, title: &str, options: &[String]) -> Result<String> {
        if let Some(gate) = self.gate.get() {
            self.gate_at_menu.lock().unwrap().push(gate.state());
        }
        let first = self.menus_offered.fetch_add(1, Ordering::SeqCst) == 0;
        if first {
            self.menu_opened.notify_one();
            if self.hold_first_menu {
                let _abandoned = AbandonedOnDrop(self.menus_abandoned.clone());
                std::future::pending::<()>().await;
            }
            let hook = self.first_menu_hook.lock().unwrap().take();
            if let Some(hook) = hook {
                hook();
            }
        }
        self.script.select(title, options).await
    }

    async fn input(&self, title: &str) -> Result<String> {
        self.script.input(title).await
    }

    async fn confirm(&self, title: &str) -> Result<bool> {
        if self.hold_confirms {
            std::future::pending::<()>().await;
        }
        self.script.confirm(title).await
    }

    fn display(&self, tone: Tone, text: &str) {
        self.script.display(tone, text);
    }
}
