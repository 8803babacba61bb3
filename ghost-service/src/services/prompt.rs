//! Prompt template and cleanup of echoed prompts.

use once_cell::sync::Lazy;
use regex::Regex;

/// A restated `User: … Ghost:` turn at the very start of the output.
static LEADING_TURN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)^\s*user:.*?\bghost:").expect("leading turn pattern is valid")
});

/// A new `User: … Ghost:` turn the model opened after its answer.
static TRAILING_TURN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)\s*\buser:.*?\bghost:\s*$").expect("trailing turn pattern is valid")
});

/// Instruction plus the visitor's question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub question: String,
}

impl Prompt {
    pub fn new(system: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            question: question.into(),
        }
    }

    /// Single-string form for completion-style models.
    pub fn render(&self) -> String {
        let system = self.system.trim();
        if system.is_empty() {
            format!("User: {}\nGhost:", self.question)
        } else {
            format!("{}\n\nUser: {}\nGhost:", system, self.question)
        }
    }
}

/// Remove a verbatim restatement of `prompt` and any leftover `User: … Ghost:`
/// turn from model output.
///
/// Only a turn that opens the output or one that closes it is removed, so an
/// answer merely mentioning `user:` and `ghost:` survives intact.
pub fn strip_echo(output: &str, prompt: &str) -> String {
    let rest = output.strip_prefix(prompt).unwrap_or(output);
    let rest = match LEADING_TURN.find(rest) {
        Some(m) => &rest[m.end()..],
        None => rest,
    };
    let rest = match TRAILING_TURN.find(rest) {
        Some(m) => &rest[..m.start()],
        None => rest,
    };
    rest.trim().to_string()
}
