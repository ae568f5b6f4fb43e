//! Operator confirmation for destructive statements.
//!
//! Before a statement mentioning `DELETE` runs, the operator must type
//! back a random numeric code. The engine only sees the
//! [`ConfirmationProvider`] trait, so tests script the replies.

use std::collections::VecDeque;
use std::io::{self, BufRead, BufReader, Stdin, Stdout, Write};

use crate::error::{MigrateError, Result};

/// A code the operator must type back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    /// Migration file holding the statement.
    pub file: String,
    /// Expected reply.
    pub code: String,
}

impl Challenge {
    /// Creates a challenge for a file.
    pub fn new(file: impl Into<String>, code: u16) -> Self {
        Self {
            file: file.into(),
            code: code.to_string(),
        }
    }

    /// Returns whether a reply matches, ignoring surrounding whitespace.
    #[must_use]
    pub fn accepts(&self, reply: &str) -> bool {
        reply.trim() == self.code
    }
}

/// Asks the operator to confirm a destructive statement.
pub trait ConfirmationProvider {
    /// Presents the challenge and returns the operator's reply.
    fn ask(&mut self, challenge: &Challenge) -> Result<String>;

    /// Called when a reply did not match.
    fn rejected(&mut self, _challenge: &Challenge) {}
}

/// Line-based confirmation over a reader and a writer.
#[derive(Debug)]
pub struct ConsoleConfirmation<R, W> {
    input: R,
    output: W,
}

impl ConsoleConfirmation<BufReader<Stdin>, Stdout> {
    /// Prompts on stdout and reads the reply from stdin.
    pub fn stdio() -> Self {
        Self::new(BufReader::new(io::stdin()), io::stdout())
    }
}

impl<R: BufRead, W: Write> ConsoleConfirmation<R, W> {
    /// Creates a console over explicit streams.
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Returns the output stream.
    pub fn into_output(self) -> W {
        self.output
    }
}

impl<R: BufRead, W: Write> ConfirmationProvider for ConsoleConfirmation<R, W> {
    fn ask(&mut self, challenge: &Challenge) -> Result<String> {
        let console = |e: io::Error| MigrateError::Confirmation(e.to_string());

        writeln!(
            self.output,
            "Restricted keyword DELETE found in file: {}",
            challenge.file
        )
        .map_err(console)?;
        writeln!(
            self.output,
            "Are you sure you want to continue ?? ( Type: {} )",
            challenge.code
        )
        .map_err(console)?;
        self.output.flush().map_err(console)?;

        let mut reply = String::new();
        self.input.read_line(&mut reply).map_err(console)?;
        Ok(reply)
    }

    fn rejected(&mut self, challenge: &Challenge) {
        // Output failures here only lose a notice
        let _ = writeln!(self.output, "Incorrect entry. Ignoring file {}", challenge.file);
    }
}

/// A scripted reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Type back the expected code.
    Confirm,
    /// Type the given text.
    Type(String),
}

/// Replies from a fixed script, for tests and unattended runs.
///
/// Once the script is exhausted every challenge is answered with an empty
/// line, which never matches.
#[derive(Debug, Clone, Default)]
pub struct ScriptedConfirmation {
    replies: VecDeque<Reply>,
    asked: Vec<Challenge>,
}

impl ScriptedConfirmation {
    /// Creates a responder replaying `replies` in order.
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: replies.into_iter().collect(),
            asked: Vec::new(),
        }
    }

    /// Returns the challenges presented so far.
    #[must_use]
    pub fn asked(&self) -> &[Challenge] {
        &self.asked
    }
}

impl ConfirmationProvider for ScriptedConfirmation {
    fn ask(&mut self, challenge: &Challenge) -> Result<String> {
        self.asked.push(challenge.clone());
        Ok(match self.replies.pop_front() {
            Some(Reply::Confirm) => challenge.code.clone(),
            Some(Reply::Type(text)) => text,
            None => String::new(),
        })
    }
}
