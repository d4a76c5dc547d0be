//! Operator terminal interface.

use async_trait::async_trait;

use crate::error::Result;

/// How a line of output should be styled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Plain,
    Success,
    Error,
    Highlight,
}

/// Prompts the operator and prints notices.
///
/// Prompt futures must be cancel-safe: a pending prompt may be dropped when a
/// sub-flow takes over the terminal, and the next prompt receives the next
/// line of input.
#[async_trait]
pub trait Prompter: Send + Sync {
    /// Asks the operator to pick one of `options` and returns the chosen option.
    async fn select(&self, title: &str, options: &[String]) -> Result<String>;

    /// Asks for free-text input.
    async fn input(&self, title: &str) -> Result<String>;

    /// Asks a yes/no question.
    async fn confirm(&self, title: &str) -> Result<bool>;

    fn display(&self, tone: Tone, text: &str);
}
