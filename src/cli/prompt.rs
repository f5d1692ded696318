//! Terminal implementation of the prompter

use anstream::{eprint, eprintln};
use dialoguer::{Confirm, Password};
use forge_auth::error::{Error, Result};
use forge_auth::interact::{Prompter, is_yes};
use std::io::{BufRead, IsTerminal, Write};

/// Prompts on stderr, reads from stdin
///
/// Uses masked `dialoguer` prompts when attached to a terminal and plain line
/// reads otherwise, so tokens can be piped in.
pub struct TerminalPrompter {
    interactive: bool,
}

impl TerminalPrompter {
    /// Prompter for the current process; interactive only when stdin and stderr are terminals
    pub fn new() -> Self {
        Self {
            interactive: std::io::stdin().is_terminal() && std::io::stderr().is_terminal(),
        }
    }

    fn read_stdin_line(prompt: &str) -> Result<String> {
        eprint!("{prompt}");
        std::io::stderr().flush()?;

        let mut line = String::new();
        if std::io::stdin().lock().read_line(&mut line)? == 0 {
            return Err(Error::Prompt("unexpected end of input".to_string()));
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

impl Default for TerminalPrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompter for TerminalPrompter {
    fn say(&self, message: &str) {
        eprintln!("{message}");
    }

    fn read_line(&self, prompt: &str) -> Result<String> {
        Self::read_stdin_line(prompt)
    }

    fn read_secret(&self, prompt: &str) -> Result<String> {
        if !self.interactive {
            return Self::read_stdin_line(prompt);
        }
        Password::new()
            .with_prompt(prompt.trim_end().trim_end_matches(':'))
            .allow_empty_password(true)
            .interact()
            .map_err(|e| Error::Prompt(e.to_string()))
    }

    fn read_yes_no(&self, prompt: &str) -> Result<bool> {
        if !self.interactive {
            return Self::read_stdin_line(prompt).map(|answer| is_yes(&answer));
        }
        Confirm::new()
            .with_prompt(prompt.trim_end().trim_end_matches("[y/N]").trim_end())
            .default(false)
            .interact()
            .map_err(|e| Error::Prompt(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_new() {
        assert_eq!(TerminalPrompter::default().interactive, TerminalPrompter::new().interactive);
    }
}
