//! GitLab provider (gitlab.com and self-managed instances)

use crate::auth::{DeviceEndpoints, DeviceFlow, PollTiming, resolve_client_id};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::platform::http::{authenticated_get, base_url, canonical_host, check_status, json_body};
use crate::platform::{Detector, Provider, owned_scopes};
use crate::types::{ProviderConfig, UserInfo, ValidationStatus};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use tracing::debug;

/// Primary hosted instance
pub const GITLAB_HOST: &str = "gitlab.com";

/// OAuth application ID used by the GitLab CLI on gitlab.com
const DEFAULT_CLIENT_ID: &str = "41d48f9422ebd655dd9cf2947d6979681dfaddc6d0c56f7628f6ada59559af1e";

/// `read_api` covers private repositories through the API
const SCOPES: &[&str] = &["read_api", "read_repository"];

#[derive(Deserialize)]
struct ApiUser {
    username: String,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Deserialize)]
struct TokenSelf {
    #[serde(default)]
    scopes: Vec<String>,
}

/// GitLab provider using the OAuth device flow
#[derive(Debug, Clone)]
pub struct GitLabProvider {
    host: String,
    client_id: Option<String>,
    timing: PollTiming,
}

impl GitLabProvider {
    /// Create a provider; an empty host means gitlab.com
    pub fn new(config: ProviderConfig) -> Self {
        let host = if config.host.is_empty() {
            GITLAB_HOST.to_string()
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

    fn web_url(&self) -> Result<String> {
        base_url(&self.host)
    }

    fn api_url(&self, path: &str) -> Result<String> {
        Ok(format!("{}/api/v4{path}", self.web_url()?))
    }

    fn authorization(token: &str) -> String {
        format!("Bearer {token}")
    }

    async fn get(&self, ctx: &Context, path: &str, token: &str) -> Result<reqwest::Response> {
        authenticated_get(ctx, &self.api_url(path)?, &Self::authorization(token)).await
    }

    fn missing_client_id(&self, ctx: &Context) -> Error {
        let web = match self.web_url() {
            Ok(web) => web,
            Err(e) => return e,
        };
        let prompter = ctx.prompter();
        prompter.say("GitLab OAuth authentication requires a Client ID.");
        prompter.say("");
        prompter.say("To create one:");
        prompter.say(&format!("1. Go to {web}/-/user_settings/applications"));
        prompter.say("2. Create a new application with:");
        prompter.say("   - Name: forge-auth (or any name you prefer)");
        prompter.say("   - Redirect URI: urn:ietf:wg:oauth:2.0:oob");
        prompter.say("   - Confidential: unchecked");
        prompter.say(&format!("   - Scopes: {}", SCOPES.join(", ")));
        prompter.say("3. Copy the Application ID");
        prompter.say("");
        prompter.say(&format!(
            "Then run: forge-auth login {} --client-id <application-id>",
            self.host
        ));
        prompter.say("Or set the GITLAB_CLIENT_ID environment variable.");

        Error::Config(
            "client ID required for self-hosted GitLab (use --client-id or GITLAB_CLIENT_ID)"
                .to_string(),
        )
    }
}

#[async_trait]
impl Provider for GitLabProvider {
    fn name(&self) -> &str {
        "gitlab"
    }

    fn host(&self) -> &str {
        &self.host
    }

    fn scopes(&self) -> &[&'static str] {
        SCOPES
    }

    fn client_id(&self) -> Option<&str> {
        resolve_client_id(self.client_id.as_deref(), &self.host, GITLAB_HOST, DEFAULT_CLIENT_ID)
    }

    async fn authenticate(&self, ctx: &Context) -> Result<String> {
        let Some(client_id) = self.client_id() else {
            return Err(self.missing_client_id(ctx));
        };

        let web = self.web_url()?;
        let endpoints = DeviceEndpoints {
            device_code_url: format!("{web}/oauth/authorize_device"),
            token_url: format!("{web}/oauth/token"),
        };
        DeviceFlow::new(endpoints, client_id, SCOPES)
            .with_timing(self.timing)
            .run(ctx)
            .await
    }

    async fn validate_token(&self, ctx: &Context, token: &str) -> ValidationStatus {
        let result = self.get(ctx, "/user", token).await.map(drop);
        debug!(host = %self.host, valid = result.is_ok(), "validated GitLab token");
        result.into()
    }

    async fn user_info(&self, ctx: &Context, token: &str) -> Result<UserInfo> {
        let response = self.get(ctx, "/user", token).await?;
        let user: ApiUser = json_body(ctx, response).await?;
        Ok(UserInfo::new(user.username, user.name))
    }

    async fn token_scopes(&self, ctx: &Context, token: &str) -> Result<Vec<String>> {
        match self.get(ctx, "/personal_access_tokens/self", token).await {
            Ok(response) => Ok(json_body::<TokenSelf>(ctx, response).await?.scopes),
            // OAuth tokens are not personal access tokens; GitLab does not
            // expose their scopes, so report what was requested.
            Err(Error::UnexpectedStatus { status: 404 }) => Ok(owned_scopes(SCOPES)),
            Err(e) => Err(e),
        }
    }
}

#[derive(Deserialize)]
struct VersionInfo {
    #[serde(default)]
    version: Option<serde_json::Value>,
}

/// Matches gitlab.com by name, other hosts by their `/api/v4/version` document
#[derive(Debug, Default, Clone, Copy)]
pub struct GitLabDetector;

#[async_trait]
impl Detector for GitLabDetector {
    async fn detect(&self, client: &reqwest::Client, host: &str) -> Result<Option<Box<dyn Provider>>> {
        if canonical_host(host) == GITLAB_HOST {
            return Ok(Some(Box::new(GitLabProvider::new(ProviderConfig::for_host(host)))));
        }

        let url = format!("{}/api/v4/version", base_url(host)?);
        debug!(url, "checking for GitLab");
        let response = client.get(&url).header(ACCEPT, "application/json").send().await?;

        let Ok(response) = check_status(response) else {
            return Ok(None);
        };
        let body = response.text().await?;
        let matched = serde_json::from_str::<VersionInfo>(&body)
            .ok()
            .and_then(|info| info.version)
            .is_some();

        Ok(matched.then(|| Box::new(GitLabProvider::new(ProviderConfig::for_host(host))) as Box<dyn Provider>))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::http::client_with_timeout;
    use crate::testing::scripted_context;
    use mockito::Matcher;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn provider(host: &str) -> GitLabProvider {
        GitLabProvider::new(ProviderConfig::for_host(host))
    }

    #[test]
    fn test_client_id_only_defaults_on_gitlab_com() {
        assert_eq!(provider("gitlab.com").client_id(), Some(DEFAULT_CLIENT_ID));
        assert_eq!(provider("gitlab.example.com").client_id(), None);
    }

    #[tokio::test]
    async fn test_self_hosted_without_client_id() {
        let mut server = mockito::Server::new_async().await;
        let device_mock = server
            .mock("POST", "/oauth/authorize_device")
            .expect(0)
            .create_async()
            .await;

        let (ctx, prompter, _) = scripted_context(Vec::<&str>::new());
        let err = provider(&server.url()).authenticate(&ctx).await.unwrap_err();

        assert!(matches!(err, Error::Config(_)));
        assert!(prompter.said("/-/user_settings/applications"));
        device_mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_validate_token_statuses() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v4/user")
            .match_header("authorization", "Bearer good")
            .with_status(200)
            .with_body(r#"{"username":"root","name":"Administrator"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/api/v4/user")
            .match_header("authorization", "Bearer expired")
            .with_status(401)
            .create_async()
            .await;
        server
            .mock("GET", "/api/v4/user")
            .match_header("authorization", "Bearer flaky")
            .with_status(503)
            .create_async()
            .await;

        let gitlab = provider(&server.url());
        let ctx = Context::background();

        assert!(gitlab.validate_token(&ctx, "good").await.is_valid());
        assert!(matches!(
            gitlab.validate_token(&ctx, "expired").await,
            ValidationStatus::Invalid(Error::InvalidToken)
        ));
        assert!(matches!(
            gitlab.validate_token(&ctx, "flaky").await,
            ValidationStatus::Invalid(Error::UnexpectedStatus { status: 503 })
        ));
        assert_eq!(
            gitlab.user_info(&ctx, "good").await.unwrap(),
            UserInfo::new("root", Some("Administrator".into()))
        );
    }

    #[tokio::test]
    async fn test_transport_failure_is_invalid_not_unknown() {
        // Nothing listens on port 1.
        let status = provider("http://127.0.0.1:1")
            .validate_token(&Context::background(), "t")
            .await;
        assert!(matches!(status, ValidationStatus::Invalid(Error::Http(_))));
    }

    #[tokio::test]
    async fn test_token_scopes() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v4/personal_access_tokens/self")
            .match_header("authorization", "Bearer glpat-x")
            .with_status(200)
            .with_body(r#"{"id":1,"scopes":["api","read_repository"]}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/api/v4/personal_access_tokens/self")
            .match_header("authorization", "Bearer oauth-x")
            .with_status(404)
            .create_async()
            .await;

        let gitlab = provider(&server.url());
        let ctx = Context::background();

        assert_eq!(
            gitlab.token_scopes(&ctx, "glpat-x").await.unwrap(),
            vec!["api", "read_repository"]
        );
        assert_eq!(
            gitlab.token_scopes(&ctx, "oauth-x").await.unwrap(),
            vec!["read_api", "read_repository"]
        );
    }

    #[tokio::test]
    async fn test_detects_version_endpoint() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v4/version")
            .with_status(200)
            .with_body(r#"{"version":"16.11.1-ee","revision":"b6d1b4d2"}"#)
            .create_async()
            .await;

        let client = client_with_timeout(Duration::from_secs(3)).unwrap();
        let found = GitLabDetector.detect(&client, &server.url()).await.unwrap().unwrap();
        assert_eq!(found.name(), "gitlab");
    }

    #[tokio::test]
    async fn test_undecodable_body_is_no_match() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v4/version")
            .with_status(200)
            .with_body("<html>sign in</html>")
            .create_async()
            .await;

        let client = client_with_timeout(Duration::from_secs(3)).unwrap();
        assert!(GitLabDetector.detect(&client, &server.url()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_device_flow_against_gitlab_endpoints() {
        let mut server = mockito::Server::new_async().await;
        let code_mock = server
            .mock("POST", "/oauth/authorize_device")
            .match_body(Matcher::UrlEncoded("client_id".into(), "test-client".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"device_code":"dev-1","user_code":"ABCD-1234","verification_uri":"https://example.test/device","expires_in":900,"interval":0}"#,
            )
            .create_async()
            .await;

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let token_mock = server
            .mock("POST", "/oauth/token")
            .match_body(Matcher::UrlEncoded("device_code".into(), "dev-1".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body_from_request(move |_| {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    br#"{"error":"authorization_pending"}"#.to_vec()
                } else {
                    br#"{"access_token":"glpat-granted","token_type":"bearer"}"#.to_vec()
                }
            })
            .expect(2)
            .create_async()
            .await;

        let config = ProviderConfig::for_host(server.url()).with_client_id(Some("test-client"));
        let gitlab = GitLabProvider::new(config).with_poll_timing(PollTiming {
            min_interval: Duration::from_millis(20),
            slow_down_step: Duration::from_millis(20),
        });
        let (ctx, prompter, _) = scripted_context([""]);

        assert_eq!(gitlab.authenticate(&ctx).await.unwrap(), "glpat-granted");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(prompter.said("ABCD-1234"));
        code_mock.assert_async().await;
        token_mock.assert_async().await;
    }
}
