//! Personal access token flow for providers without device flow
//!
//! [`PatAuth`] is held by value inside each PAT-only provider and does the
//! actual work; the providers only add their name and detection rules.

use crate::context::Context;
use crate::error::{Error, Result};
use crate::interact::open_in_browser;
use crate::platform::http::{authenticated_get, base_url, json_body};
use crate::platform::owned_scopes;
use crate::types::{UserInfo, ValidationStatus};
use serde::Deserialize;
use tracing::debug;

/// Scopes a PAT needs for read access to repositories
pub const PAT_SCOPES: &[&str] = &["read:repository", "read:user"];

/// Web UI page where tokens are generated
pub const TOKEN_SETTINGS_PATH: &str = "/user/settings/applications";

#[derive(Deserialize)]
struct ApiUser {
    #[serde(default)]
    login: String,
    #[serde(default)]
    username: String,
    #[serde(default)]
    full_name: Option<String>,
}

/// Shared state and behavior of PAT-only providers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatAuth {
    provider: &'static str,
    host: String,
}

impl PatAuth {
    /// Bind to `host`, falling back to `default_host` when `host` is empty
    pub fn new(provider: &'static str, host: &str, default_host: Option<&str>) -> Self {
        let host = if host.is_empty() {
            default_host.unwrap_or_default().to_string()
        } else {
            host.to_string()
        };
        Self { provider, host }
    }

    /// Provider name
    pub const fn provider(&self) -> &'static str {
        self.provider
    }

    /// Resolved host, possibly empty
    pub fn host(&self) -> &str {
        &self.host
    }

    fn require_host(&self) -> Result<&str> {
        if self.host.is_empty() {
            let provider = self.provider;
            return Err(Error::Config(format!(
                "the {provider} provider requires a host (e.g. forge-auth login git.company.com --provider {provider})"
            )));
        }
        Ok(&self.host)
    }

    fn api_url(&self, path: &str) -> Result<String> {
        Ok(format!("{}/api/v1{path}", base_url(self.require_host()?)?))
    }

    fn authorization(token: &str) -> String {
        format!("token {token}")
    }

    /// Walk the user through creating a token, read it, and verify it
    pub async fn authenticate(&self, ctx: &Context) -> Result<String> {
        let host = self.require_host()?;
        let settings_url = format!("{}{TOKEN_SETTINGS_PATH}", base_url(host)?);
        let prompter = ctx.prompter();

        prompter.say(&format!(
            "{} does not support OAuth device flow. You'll need to create a Personal Access Token.",
            display_name(self.provider)
        ));
        prompter.say("");
        prompter.say("Instructions:");
        prompter.say(&format!("1. Go to {settings_url}"));
        prompter.say("2. In the 'Generate New Token' section, enter a token name (e.g. 'forge-auth')");
        prompter.say("3. Select the following access and permissions:");
        prompter.say("   - Repository and Organization Access: All (public, private, and limited)");
        prompter.say(&format!("   - Permissions: {}", PAT_SCOPES.join(", ")));
        prompter.say("4. Click 'Generate Token'");
        prompter.say("5. Copy the generated token");
        prompter.say("");

        if let Err(e) = prompter.read_line("Press Enter to open your browser and continue...") {
            debug!(error = %e, "no confirmation before opening browser");
        }
        open_in_browser(prompter, ctx.browser(), &settings_url);

        // Token entry is not bounded by the context deadline.
        let token = prompter.read_secret("Enter your Personal Access Token: ")?;
        let token = token.trim();
        if token.is_empty() {
            return Err(Error::EmptyToken);
        }

        match self.validate_token(&ctx.restarted(), token).await {
            ValidationStatus::Valid => Ok(token.to_string()),
            ValidationStatus::Invalid(err) => Err(err),
            ValidationStatus::Unknown => Err(Error::InvalidToken),
        }
    }

    /// GET `/api/v1/user` with the token
    pub async fn validate_token(&self, ctx: &Context, token: &str) -> ValidationStatus {
        let result = self.fetch_user(ctx, token).await.map(drop);
        debug!(provider = self.provider, host = %self.host, valid = result.is_ok(), "validated token");
        result.into()
    }

    async fn fetch_user(&self, ctx: &Context, token: &str) -> Result<reqwest::Response> {
        authenticated_get(ctx, &self.api_url("/user")?, &Self::authorization(token)).await
    }

    /// User behind the token; `username` falls back to `login`
    pub async fn user_info(&self, ctx: &Context, token: &str) -> Result<UserInfo> {
        let response = self.fetch_user(ctx, token).await?;
        let user: ApiUser = json_body(ctx, response).await?;

        let username = if user.username.is_empty() {
            user.login
        } else {
            user.username
        };
        Ok(UserInfo::new(username, user.full_name))
    }

    /// PATs cannot be introspected, so report the scopes we asked for
    pub fn token_scopes(&self) -> Vec<String> {
        owned_scopes(PAT_SCOPES)
    }
}

fn display_name(provider: &str) -> String {
    let mut chars = provider.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::scripted_context;

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("forgejo"), "Forgejo");
        assert_eq!(display_name(""), "");
    }

    #[test]
    fn test_default_host_fallback() {
        assert_eq!(PatAuth::new("gitea", "", Some("gitea.com")).host(), "gitea.com");
        assert_eq!(PatAuth::new("gitea", "git.corp", Some("gitea.com")).host(), "git.corp");
        assert_eq!(PatAuth::new("forgejo", "", None).host(), "");
    }

    #[tokio::test]
    async fn test_missing_host_is_config_error() {
        let (ctx, prompter, _) = scripted_context(["", "token"]);
        let err = PatAuth::new("forgejo", "", None).authenticate(&ctx).await.unwrap_err();

        assert!(matches!(err, Error::Config(_)));
        assert_eq!(prompter.remaining_answers(), 2);
    }

    #[tokio::test]
    async fn test_empty_token_skips_validation() {
        let mut server = mockito::Server::new_async().await;
        let user_mock = server.mock("GET", "/api/v1/user").expect(0).create_async().await;

        let (ctx, _, browser) = scripted_context(["", ""]);
        let err = PatAuth::new("gitea", &server.url(), None)
            .authenticate(&ctx)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::EmptyToken));
        assert_eq!(err.to_string(), "token cannot be empty");
        assert_eq!(
            browser.opened(),
            vec![format!("{}/user/settings/applications", server.url())]
        );
        user_mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_entered_token_is_validated() {
        let mut server = mockito::Server::new_async().await;
        let user_mock = server
            .mock("GET", "/api/v1/user")
            .match_header("authorization", "token good-token")
            .with_status(200)
            .with_body(r#"{"login":"alice","full_name":"Alice"}"#)
            .create_async()
            .await;

        let (ctx, prompter, _) = scripted_context(["", "  good-token \n"]);
        let token = PatAuth::new("gitea", &server.url(), None)
            .authenticate(&ctx)
            .await
            .unwrap();

        assert_eq!(token, "good-token");
        assert!(prompter.said("Gitea does not support OAuth device flow"));
        user_mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rejected_token_is_not_returned() {
        let mut server = mockito::Server::new_async().await;
        server.mock("GET", "/api/v1/user").with_status(401).create_async().await;

        let (ctx, _, _) = scripted_context(["", "stale"]);
        let err = PatAuth::new("forgejo", &server.url(), None)
            .authenticate(&ctx)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidToken));
    }

    #[tokio::test]
    async fn test_user_info_falls_back_to_login() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v1/user")
            .with_status(200)
            .with_body(r#"{"login":"bob","username":"","full_name":""}"#)
            .create_async()
            .await;

        let ctx = Context::background();
        let user = PatAuth::new("gitea", &server.url(), None)
            .user_info(&ctx, "t")
            .await
            .unwrap();

        assert_eq!(user, UserInfo::new("bob", None));
    }
}
