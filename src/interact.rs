//! Interactive collaborators
//!
//! Authentication flows talk to the user only through these traits, so the
//! same flow can drive a terminal, a scripted test double, or a headless run.

use crate::error::{Error, Result};
use tracing::info;

/// User-facing input and output
pub trait Prompter: Send + Sync {
    /// Show an informational line
    fn say(&self, message: &str);

    /// Read one line of plain input
    fn read_line(&self, prompt: &str) -> Result<String>;

    /// Read a secret, masked when attached to a terminal
    fn read_secret(&self, prompt: &str) -> Result<String>;

    /// Ask a yes/no question; anything but an explicit yes is `false`
    fn read_yes_no(&self, prompt: &str) -> Result<bool>;
}

/// Launches URLs in the user's browser
pub trait Browser: Send + Sync {
    /// Open `url`; failures are reported but never fatal to a flow
    fn open_url(&self, url: &str) -> Result<()>;
}

/// Browser backed by the platform's default handler
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBrowser;

impl Browser for SystemBrowser {
    fn open_url(&self, url: &str) -> Result<()> {
        webbrowser::open(url)?;
        Ok(())
    }
}

/// Prompter for runs without a user: output goes to the log, input fails
#[derive(Debug, Default, Clone, Copy)]
pub struct NonInteractive;

impl Prompter for NonInteractive {
    fn say(&self, message: &str) {
        info!("{message}");
    }

    fn read_line(&self, _prompt: &str) -> Result<String> {
        Err(Error::Prompt("no interactive input available".to_string()))
    }

    fn read_secret(&self, _prompt: &str) -> Result<String> {
        Err(Error::Prompt("no interactive input available".to_string()))
    }

    fn read_yes_no(&self, _prompt: &str) -> Result<bool> {
        Err(Error::Prompt("no interactive input available".to_string()))
    }
}

/// Show `url`, try to open it, and explain what to do if that fails
pub fn open_in_browser(prompter: &dyn Prompter, browser: &dyn Browser, url: &str) {
    prompter.say(&format!("Opening {url} in your browser..."));
    if let Err(e) = browser.open_url(url) {
        tracing::debug!(error = %e, "browser launch failed");
        prompter.say("Could not open browser automatically.");
        prompter.say(&format!("Please manually visit: {url}"));
    }
}

/// Parse a yes/no answer
pub fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
