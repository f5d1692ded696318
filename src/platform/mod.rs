//! Git hosting providers
//!
//! Provides a unified interface for obtaining and checking credentials across
//! GitHub, GitLab, Gitea and Forgejo, plus a fallback for unrecognized hosts.

mod detection;
mod forgejo;
mod gitea;
mod github;
mod gitlab;
pub mod http;
mod registry;
mod unknown;

pub use detection::{DETECTION_TIMEOUT, detect};
pub use forgejo::ForgejoProvider;
pub use gitea::{GiteaFamilyDetector, GiteaProvider};
pub use github::{GitHubDetector, GitHubProvider};
pub use gitlab::{GitLabDetector, GitLabProvider};
pub use registry::{Constructor, Registration, Registry};
pub use unknown::UnknownProvider;

use crate::context::Context;
use crate::error::Result;
use crate::types::{UserInfo, ValidationStatus};
use async_trait::async_trait;

/// Provider trait for credential acquisition and verification
///
/// A provider is bound to one host at construction and never stores tokens;
/// every token is a return value handed back to the caller.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider name (e.g. "github", "forgejo", "unknown")
    fn name(&self) -> &str;

    /// Host this instance is bound to; empty when none was given and the
    /// provider has no default
    fn host(&self) -> &str;

    /// Scopes requested when creating a token
    fn scopes(&self) -> &[&'static str];

    /// OAuth client ID that authentication would use, if any
    fn client_id(&self) -> Option<&str> {
        None
    }

    /// Obtain a new token interactively
    async fn authenticate(&self, ctx: &Context) -> Result<String>;

    /// Check a token against the provider's "current user" endpoint
    async fn validate_token(&self, ctx: &Context, token: &str) -> ValidationStatus;

    /// Identity behind a token
    async fn user_info(&self, ctx: &Context, token: &str) -> Result<UserInfo>;

    /// Scopes actually granted to a token, or the requested scopes where the
    /// provider cannot report them
    async fn token_scopes(&self, ctx: &Context, token: &str) -> Result<Vec<String>>;
}

/// Check deciding whether a host runs a given provider family
///
/// `Ok(None)` means "not this family"; `Err` means the check itself failed
/// (DNS, connect, timeout) and detection should give up on the host.
#[async_trait]
pub trait Detector: Send + Sync {
    /// Inspect `host` using the detection client
    async fn detect(&self, client: &reqwest::Client, host: &str) -> Result<Option<Box<dyn Provider>>>;
}

/// Static scope list as owned strings
pub(crate) fn owned_scopes(scopes: &[&str]) -> Vec<String> {
    scopes.iter().map(ToString::to_string).collect()
}
