//! Terminal styling shared by the commands
//!
//! Output goes through `anstream`, which strips the escape codes when stderr
//! is not a terminal.

use indicatif::ProgressStyle;
use owo_colors::OwoColorize;
use std::fmt::Display;

/// Semantic colors for CLI output
pub trait Stylize {
    /// Values the user cares about: hosts, names, usernames
    fn accent(&self) -> String;
    /// Labels and secondary detail
    fn muted(&self) -> String;
    /// Headings
    fn emphasis(&self) -> String;
    /// Positive outcome
    fn success(&self) -> String;
    /// Negative outcome
    fn failure(&self) -> String;
}

impl<T: Display + ?Sized> Stylize for T {
    fn accent(&self) -> String {
        self.to_string().cyan().to_string()
    }

    fn muted(&self) -> String {
        self.to_string().dimmed().to_string()
    }

    fn emphasis(&self) -> String {
        self.to_string().bold().to_string()
    }

    fn success(&self) -> String {
        self.to_string().green().to_string()
    }

    fn failure(&self) -> String {
        self.to_string().red().to_string()
    }
}

/// Green check mark
pub fn check() -> String {
    "✓".success()
}

/// Red cross
pub fn cross() -> String {
    "✗".failure()
}

/// Spinner used while detecting hosts
pub fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
}
