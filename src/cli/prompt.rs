//! Interactive prompting.
//!
//! Kept separate from clap parsing:
//! - clap handles the flags
//! - the prompter fills in whatever the flags left out, re-asking until the answer parses
//!
//! Secrets typed at a terminal are read in raw mode so they are never echoed.

use std::io::{self, BufRead, IsTerminal, Write};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;

use crate::error::AppError;

pub trait Prompt {
    /// Ask for `label` until `parse` accepts the answer. An empty answer takes `default`.
    fn ask<T>(
        &mut self,
        label: &str,
        default: Option<&str>,
        parse: impl Fn(&str) -> Result<T, String>,
    ) -> Result<T, AppError>;

    /// Ask for a non-empty secret without echoing it.
    fn ask_secret(&mut self, label: &str) -> Result<String, AppError>;
}

/// Line-based prompter over any reader/writer pair.
pub struct LinePrompt<R, W> {
    input: R,
    output: W,
    /// Read secrets from the terminal in raw mode instead of from `input`.
    hide_secrets: bool,
}

impl LinePrompt<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        let hide_secrets = io::stdin().is_terminal();
        Self {
            hide_secrets,
            ..Self::new(io::stdin().lock(), io::stdout())
        }
    }
}

impl<R: BufRead, W: Write> LinePrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            hide_secrets: false,
        }
    }

    fn show(&mut self, text: &str) -> Result<(), AppError> {
        write!(self.output, "{text}")
            .and_then(|()| self.output.flush())
            .map_err(|e| AppError::input(format!("Failed to write prompt: {e}")))
    }

    /// One line of input without its line ending. End of input is an error.
    fn read_answer(&mut self, label: &str) -> Result<String, AppError> {
        let mut line = String::new();
        let bytes = self
            .input
            .read_line(&mut line)
            .map_err(|e| AppError::input(format!("Failed to read input: {e}")))?;

        if bytes == 0 {
            return Err(AppError::input(format!("No input received for {label}.")));
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

impl<R: BufRead, W: Write> Prompt for LinePrompt<R, W> {
    fn ask<T>(
        &mut self,
        label: &str,
        default: Option<&str>,
        parse: impl Fn(&str) -> Result<T, String>,
    ) -> Result<T, AppError> {
        loop {
            match default {
                Some(d) => self.show(&format!("{label} [{d}]: "))?,
                None => self.show(&format!("{label}: "))?,
            }

            let line = self.read_answer(label)?;
            let answer = match (line.trim(), default) {
                ("", Some(d)) => d,
                (answer, _) => answer,
            };

            match parse(answer) {
                Ok(value) => return Ok(value),
                Err(msg) => self.show(&format!("{msg}\n"))?,
            }
        }
    }

    fn ask_secret(&mut self, label: &str) -> Result<String, AppError> {
        loop {
            self.show(&format!("{label}: "))?;

            let secret = if self.hide_secrets {
                let secret = read_hidden()?;
                self.show("\n")?;
                secret
            } else {
                self.read_answer(label)?
            };

            if !secret.is_empty() {
                return Ok(secret);
            }
            self.show("A value is required.\n")?;
        }
    }
}

/// Raw mode for the lifetime of the guard.
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> Result<Self, AppError> {
        terminal::enable_raw_mode().map_err(|e| AppError::input(format!("Failed to enable raw mode: {e}")))?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

fn read_hidden() -> Result<String, AppError> {
    let _raw = RawModeGuard::enable()?;
    let mut secret = String::new();

    loop {
        let ev = event::read().map_err(|e| AppError::input(format!("Failed to read input: {e}")))?;
        let Event::Key(key) = ev else { continue };

        match edit_secret(&mut secret, key) {
            SecretEdit::Pending => {}
            SecretEdit::Done => return Ok(secret),
            SecretEdit::Cancelled => return Err(AppError::input("Password entry cancelled.")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SecretEdit {
    Pending,
    Done,
    Cancelled,
}

fn edit_secret(secret: &mut String, key: KeyEvent) -> SecretEdit {
    // Some platforms report releases too.
    if key.kind != KeyEventKind::Press {
        return SecretEdit::Pending;
    }

    match key.code {
        KeyCode::Enter => SecretEdit::Done,
        KeyCode::Esc => SecretEdit::Cancelled,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => SecretEdit::Cancelled,
        KeyCode::Backspace => {
            secret.pop();
            SecretEdit::Pending
        }
        KeyCode::Char(c) => {
            secret.push(c);
            SecretEdit::Pending
        }
        _ => SecretEdit::Pending,
    }
}
