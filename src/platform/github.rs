//! GitHub provider (github.com and GitHub Enterprise Server)

use crate::auth::{DeviceEndpoints, DeviceFlow, PollTiming, resolve_client_id};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::platform::http::{authenticated_get, base_url, canonical_host, check_status, json_body};
use crate::platform::{Detector, Provider};
use crate::types::{ProviderConfig, UserInfo, ValidationStatus};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use tracing::debug;

/// Primary hosted instance
pub const GITHUB_HOST: &str = "github.com";

/// OAuth app ID shared by the GitHub CLI, valid only on github.com
const DEFAULT_CLIENT_ID: &str = "178c6fc778ccc68e1d6a";

/// Minimal scope needed for private repository access
const SCOPES: &[&str] = &["repo"];

const SCOPES_HEADER: &str = "x-oauth-scopes";

#[derive(Deserialize)]
struct ApiUser {
    login: String,
    #[serde(default)]
    name: Option<String>,
}

/// GitHub provider using the OAuth device flow
#[derive(Debug, Clone)]
pub struct GitHubProvider {
    host: String,
    client_id: Option<String>,
    timing: PollTiming,
}

impl GitHubProvider {
    /// Create a provider; an empty host means github.com
    pub fn new(config: ProviderConfig) -> Self {
        let host = if config.host.is_empty() {
            GITHUB_HOST.to_string()
        } else {
            config.host
        };
        Self {
            host,
            client_id: config.client_id,
            timing: PollTiming::default(),
        }
    }

    /// Override the device-flow polling cadence
    #[must_use]
    pub fn with_poll_timing(mut self, timing: PollTiming) -> Self {
        self.timing = timing;
        self
    }

    fn is_dotcom(&self) -> bool {
        canonical_host(&self.host) == GITHUB_HOST
    }

    fn web_url(&self) -> Result<String> {
        base_url(&self.host)
    }

    fn api_url(&self) -> Result<String> {
        if self.is_dotcom() {
            Ok("https://api.github.com".to_string())
        } else {
            Ok(format!("{}/api/v3", self.web_url()?))
        }
    }

    fn authorization(token: &str) -> String {
        format!("token {token}")
    }

    async fn get_user(&self, ctx: &Context, token: &str) -> Result<reqwest::Response> {
        let url = format!("{}/user", self.api_url()?);
        authenticated_get(ctx, &url, &Self::authorization(token)).await
    }

    fn missing_client_id(&self, ctx: &Context) -> Error {
        let web = match self.web_url() {
            Ok(web) => web,
            Err(e) => return e,
        };
        let prompter = ctx.prompter();
        prompter.say("GitHub Enterprise authentication requires an OAuth App client ID.");
        prompter.say("");
        prompter.say("To create one:");
        prompter.say(&format!("1. Go to {web}/settings/applications/new"));
        prompter.say("2. Register an application named e.g. 'forge-auth' and tick 'Enable Device Flow'");
        prompter.say("3. Copy the Client ID");
        prompter.say("");
        prompter.say("Then pass it with --client-id <id> or set GITHUB_CLIENT_ID.");

        Error::Config(
            "client ID required for GitHub Enterprise (use --client-id or GITHUB_CLIENT_ID)"
                .to_string(),
        )
    }
}

#[async_trait]
impl Provider for GitHubProvider {
    fn name(&self) -> &str {
        "github"
    }

    fn host(&self) -> &str {
        &self.host
    }

    fn scopes(&self) -> &[&'static str] {
        SCOPES
    }

    fn client_id(&self) -> Option<&str> {
        resolve_client_id(self.client_id.as_deref(), &self.host, GITHUB_HOST, DEFAULT_CLIENT_ID)
    }

    async fn authenticate(&self, ctx: &Context) -> Result<String> {
        let Some(client_id) = self.client_id() else {
            return Err(self.missing_client_id(ctx));
        };

        let web = self.web_url()?;
        let endpoints = DeviceEndpoints {
            device_code_url: format!("{web}/login/device/code"),
            token_url: format!("{web}/login/oauth/access_token"),
        };
        DeviceFlow::new(endpoints, client_id, SCOPES)
            .with_timing(self.timing)
            .run(ctx)
            .await
    }

    async fn validate_token(&self, ctx: &Context, token: &str) -> ValidationStatus {
        let result = self.get_user(ctx, token).await.map(drop);
        debug!(host = %self.host, valid = result.is_ok(), "validated GitHub token");
        result.into()
    }

    async fn user_info(&self, ctx: &Context, token: &str) -> Result<UserInfo> {
        let response = self.get_user(ctx, token).await?;
        let user: ApiUser = json_body(ctx, response).await?;
        Ok(UserInfo::new(user.login, user.name))
    }

    async fn token_scopes(&self, ctx: &Context, token: &str) -> Result<Vec<String>> {
        let response = self.get_user(ctx, token).await?;
        let header = response
            .headers()
            .get(SCOPES_HEADER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        Ok(parse_scopes_header(header))
    }
}

/// Split a comma-separated `X-OAuth-Scopes` value
pub fn parse_scopes_header(header: &str) -> Vec<String> {
    header
        .split(',')
        .map(str::trim)
        .filter(|scope| !scope.is_empty())
        .map(ToString::to_string)
        .collect()
}

#[derive(Deserialize)]
struct ApiRoot {
    #[serde(default)]
    current_user_url: Option<String>,
}

/// Matches github.com by name, Enterprise Server by its `/api/v3` root document
#[derive(Debug, Default, Clone, Copy)]
pub struct GitHubDetector;

#[async_trait]
impl Detector for GitHubDetector {
    async fn detect(&self, client: &reqwest::Client, host: &str) -> Result<Option<Box<dyn Provider>>> {
        if canonical_host(host) == GITHUB_HOST {
            return Ok(Some(Box::new(GitHubProvider::new(ProviderConfig::for_host(host)))));
        }

        let url = format!("{}/api/v3", base_url(host)?);
        debug!(url, "checking for GitHub Enterprise");
        let response = client.get(&url).header(ACCEPT, "application/json").send().await?;

        let Ok(response) = check_status(response) else {
            return Ok(None);
        };
        let body = response.text().await?;
        let matched = serde_json::from_str::<ApiRoot>(&body)
            .ok()
            .and_then(|root| root.current_user_url)
            .is_some();

        Ok(matched.then(|| Box::new(GitHubProvider::new(ProviderConfig::for_host(host))) as Box<dyn Provider>))
    }
}
