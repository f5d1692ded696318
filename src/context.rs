//! Per-invocation context: cancellation, deadline and interaction handles

use crate::error::{Error, Result};
use crate::interact::{Browser, NonInteractive, Prompter, SystemBrowser};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Carried through every network operation
///
/// Cancelling the token or passing the deadline makes [`Context::run`] and
/// [`Context::sleep`] return promptly with `Cancelled` / `DeadlineExceeded`.
#[derive(Clone)]
pub struct Context {
    cancel: CancellationToken,
    deadline: Option<Instant>,
    timeout: Option<Duration>,
    prompter: Arc<dyn Prompter>,
    browser: Arc<dyn Browser>,
}

impl Context {
    /// Context with the given collaborators and no deadline
    pub fn new(prompter: Arc<dyn Prompter>, browser: Arc<dyn Browser>) -> Self {
        Self {
            cancel: CancellationToken::new(),
            deadline: None,
            timeout: None,
            prompter,
            browser,
        }
    }

    /// Context with no user attached
    pub fn background() -> Self {
        Self::new(Arc::new(NonInteractive), Arc::new(SystemBrowser))
    }

    /// Bound all work done through this context to `timeout` from now
    ///
    /// A timeout too large to represent as an instant means no deadline.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Instant::now().checked_add(timeout);
        self.timeout = Some(timeout);
        self
    }

    /// Same context with the deadline restarted from now
    ///
    /// Used for network work that follows a wait on the user, which is not
    /// bounded by the deadline. Cancellation stays shared.
    #[must_use]
    pub fn restarted(&self) -> Self {
        let mut ctx = self.clone();
        if let Some(timeout) = self.timeout {
            ctx.deadline = Instant::now().checked_add(timeout);
        }
        ctx
    }

    /// Use an externally owned cancellation token
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Cancel everything running under this context
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Handle that cancels this context when triggered
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Time left before the deadline, if one is set
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Interactive I/O for this invocation
    pub fn prompter(&self) -> &dyn Prompter {
        self.prompter.as_ref()
    }

    /// Browser launcher for this invocation
    pub fn browser(&self) -> &dyn Browser {
        self.browser.as_ref()
    }

    /// Fail fast if the context is already done
    pub fn check(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Err(Error::DeadlineExceeded);
        }
        Ok(())
    }

    /// Drive `fut` to completion unless the context ends first
    pub async fn run<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.check()?;
        let deadline = self.deadline;
        tokio::select! {
            () = self.cancel.cancelled() => Err(Error::Cancelled),
            () = wait_until(deadline) => Err(Error::DeadlineExceeded),
            result = fut => result,
        }
    }

    /// Sleep for `duration` unless the context ends first
    pub async fn sleep(&self, duration: Duration) -> Result<()> {
        self.run(async {
            tokio::time::sleep(duration).await;
            Ok::<(), Error>(())
        })
        .await
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("cancelled", &self.cancel.is_cancelled())
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
