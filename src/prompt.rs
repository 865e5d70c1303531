//! Interactive confirmation.
//!
//! The walker asks before it deletes a directory that stands where a working
//! copy should be cloned. The question goes through [`Prompter`] so tests and
//! non-interactive runs can answer it without a terminal.

use console::Term;
use dialoguer::Confirm;
use log::warn;

/// Answers yes/no questions.
pub trait Prompter {
    fn confirm(&self, question: &str) -> bool;
}

/// Always gives the same answer.
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

impl Prompter for FixedAnswer {
    fn confirm(&self, _question: &str) -> bool {
        self.0
    }
}

/// Asks on the terminal; answers no when stdin/stdout is not interactive.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn confirm(&self, question: &str) -> bool {
        if !Term::stdout().is_term() {
            warn!("{} (no terminal, answering no)", question);
            return false;
        }
        Confirm::new()
            .with_prompt(question)
            .default(false)
            .interact()
            .unwrap_or(false)
    }
}
