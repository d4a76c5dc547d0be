//! rustyline-backed terminal prompter.

use std::sync::mpsc as std_mpsc;
use std::thread;

use async_trait::async_trait;
use colored::Colorize;
use didi_core::error::{DidiError, Result};
use didi_core::prompt::{Prompter, Tone};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::{Mutex, mpsc};

const INPUT_PROMPT: &str = "> ";

/// Reads operator input on a dedicated thread.
///
/// rustyline blocks, so the editor lives on its own thread and serves one
/// read request at a time. A prompt that is dropped while its read is still
/// outstanding leaves the request in flight; the next prompt receives that
/// line instead of issuing a new read.
pub struct TerminalPrompter {
    reader: Mutex<LineReader>,
}

struct LineReader {
    requests: std_mpsc::Sender<String>,
    lines: mpsc::UnboundedReceiver<std::result::Result<String, String>>,
    pending: bool,
}

impl LineReader {
    async fn read_line(&mut self) -> Result<String> {
        if !self.pending {
            self.requests
                .send(INPUT_PROMPT.to_string())
                .map_err(|_| DidiError::prompt("terminal reader stopped"))?;
            self.pending = true;
        }
        let line = self
            .lines
            .recv()
            .await
            .ok_or_else(|| DidiError::prompt("terminal reader stopped"))?;
        self.pending = false;
        line.map_err(DidiError::prompt)
    }
}

impl TerminalPrompter {
    pub fn new() -> Self {
        let (requests, request_rx) = std_mpsc::channel::<String>();
        let (line_tx, lines) = mpsc::unbounded_channel();

        thread::spawn(move || {
            let mut editor = match DefaultEditor::new() {
                Ok(editor) => editor,
                Err(e) => {
                    let _ = line_tx.send(Err(format!("cannot open terminal: {}", e)));
                    return;
                }
            };

            while let Ok(prompt) = request_rx.recv() {
                let line = match editor.readline(&prompt) {
                    Ok(line) => {
                        if !line.trim().is_empty() {
                            let _ = editor.add_history_entry(line.as_str());
                        }
                        Ok(line)
                    }
                    Err(ReadlineError::Interrupted) => Err("interrupted".to_string()),
                    Err(ReadlineError::Eof) => Err("end of input".to_string()),
                    Err(e) => Err(e.to_string()),
                };
                if line_tx.send(line).is_err() {
                    break;
                }
            }
        });

        Self {
            reader: Mutex::new(LineReader {
                requests,
                lines,
                pending: false,
            }),
        }
    }
}

impl Default for TerminalPrompter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Prompter for TerminalPrompter {
    async fn select(&self, title: &str, options: &[String]) -> Result<String> {
        let mut reader = self.reader.lock().await;
        println!("{}", title.bold());
        for (index, option) in options.iter().enumerate() {
            println!("  {}. {}", index + 1, option);
        }

        loop {
            let line = reader.read_line().await?;
            match parse_choice(&line, options) {
                Some(choice) => return Ok(choice.to_string()),
                None => println!("{}", format!("Choose 1-{} or type an option", options.len()).red()),
            }
        }
    }

    async fn input(&self, title: &str) -> Result<String> {
        let mut reader = self.reader.lock().await;
        println!("{}", title.bold());
        reader.read_line().await
    }

    async fn confirm(&self, title: &str) -> Result<bool> {
        let mut reader = self.reader.lock().await;
        println!("{} {}", title.bold(), "(y/n)".bright_black());

        loop {
            let line = reader.read_line().await?;
            match parse_confirmation(&line) {
                Some(answer) => return Ok(answer),
                None => println!("{}", "Please answer yes or no".red()),
            }
        }
    }

    fn display(&self, tone: Tone, text: &str) {
        match tone {
            Tone::Plain => println!("{}", text),
            Tone::Success => println!("{}", text.green()),
            Tone::Error => println!("{}", text.red()),
            Tone::Highlight => println!("{}", text.bright_magenta()),
        }
    }
}

/// Accepts a 1-based option number or the option text (case-insensitive).
fn parse_choice<'a>(line: &str, options: &'a [String]) -> Option<&'a str> {
    let answer = line.trim();
    if let Ok(number) = answer.parse::<usize>() {
        return number.checked_sub(1).and_then(|i| options.get(i)).map(String::as_str);
    }
    options
        .iter()
        .find(|option| option.eq_ignore_ascii_case(answer))
        .map(String::as_str)
}

fn parse_confirmation(line: &str) -> Option<bool> {
    match line.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}
