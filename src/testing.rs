//! Scripted collaborators for unit tests

use crate::context::Context;
use crate::error::{Error, Result};
use crate::interact::{Browser, Prompter, is_yes};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Answers prompts from a fixed script and records everything shown
pub struct ScriptedPrompter {
    answers: Mutex<VecDeque<String>>,
    transcript: Mutex<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new<S: Into<String>>(answers: impl IntoIterator<Item = S>) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().map(Into::into).collect()),
            transcript: Mutex::new(Vec::new()),
        }
    }

    pub fn said(&self, needle: &str) -> bool {
        self.transcript
            .lock()
            .unwrap()
            .iter()
            .any(|line| line.contains(needle))
    }

    pub fn remaining_answers(&self) -> usize {
        self.answers.lock().unwrap().len()
    }

    fn next(&self, prompt: &str) -> Result<String> {
        self.transcript.lock().unwrap().push(prompt.to_string());
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Error::Prompt("unexpected end of input".to_string()))
    }
}

impl Prompter for ScriptedPrompter {
    fn say(&self, message: &str) {
        self.transcript.lock().unwrap().push(message.to_string());
    }

    fn read_line(&self, prompt: &str) -> Result<String> {
        self.next(prompt).map(|s| s.trim().to_string())
    }

    fn read_secret(&self, prompt: &str) -> Result<String> {
        self.next(prompt).map(|s| s.trim().to_string())
    }

    fn read_yes_no(&self, prompt: &str) -> Result<bool> {
        self.next(prompt).map(|s| is_yes(&s))
    }
}

/// Records opened URLs instead of launching anything
#[derive(Default)]
pub struct RecordingBrowser {
    opened: Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingBrowser {
    pub fn failing() -> Self {
        Self {
            opened: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

impl Browser for RecordingBrowser {
    fn open_url(&self, url: &str) -> Result<()> {
        self.opened.lock().unwrap().push(url.to_string());
        if self.fail {
            return Err(Error::Io(std::io::Error::other("no browser")));
        }
        Ok(())
    }
}

/// Context wired to a scripted prompter and a recording browser
pub fn scripted_context<S: Into<String>>(
    answers: impl IntoIterator<Item = S>,
) -> (Context, Arc<ScriptedPrompter>, Arc<RecordingBrowser>) {
    let prompter = Arc::new(ScriptedPrompter::new(answers));
    let browser = Arc::new(RecordingBrowser::default());
    let ctx = Context::new(prompter.clone(), browser.clone());
    (ctx, prompter, browser)
}
