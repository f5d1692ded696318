//! Fallback for hosts detection could not identify

use crate::context::Context;
use crate::error::{Error, Result};
use crate::platform::Provider;
use crate::types::{UserInfo, ValidationStatus};
use async_trait::async_trait;

/// Manual token entry for an unrecognized host
///
/// Never touches the network, so nothing about the token can be checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownProvider {
    host: String,
}

impl UnknownProvider {
    /// Fallback provider for an unidentified host
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }
}

#[async_trait]
impl Provider for UnknownProvider {
    fn name(&self) -> &str {
        "unknown"
    }

    fn host(&self) -> &str {
        &self.host
    }

    fn scopes(&self) -> &[&'static str] {
        &[]
    }

    async fn authenticate(&self, ctx: &Context) -> Result<String> {
        let prompter = ctx.prompter();
        prompter.say(&format!("Unable to auto-detect provider type for {}", self.host));
        prompter.say("");

        if !prompter.read_yes_no("Would you like to manually add a token for this host? [y/N] ")? {
            return Err(Error::Aborted("login cancelled".to_string()));
        }

        prompter.say("");
        prompter.say("Note: the token cannot be validated for an unknown provider.");
        let token = prompter.read_secret("Token: ")?;
        let token = token.trim();
        if token.is_empty() {
            return Err(Error::EmptyToken);
        }
        Ok(token.to_string())
    }

    async fn validate_token(&self, _ctx: &Context, _token: &str) -> ValidationStatus {
        ValidationStatus::Unknown
    }

    async fn user_info(&self, _ctx: &Context, _token: &str) -> Result<UserInfo> {
        Err(Error::UserInfoUnavailable(self.name().to_string()))
    }

    async fn token_scopes(&self, _ctx: &Context, _token: &str) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}
