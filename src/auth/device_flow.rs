//! OAuth 2.0 Device Authorization Grant (RFC 8628)
//!
//! One [`DeviceFlow::run`] call walks the whole grant:
//!
//! 1. Request a device code and user code
//! 2. Show the user code and open the verification page
//! 3. Poll the token endpoint until the user approves, denies, or the code expires
//!
//! The poll loop sleeps through [`Context::sleep`], so cancellation and the
//! context deadline end it promptly with a distinguishable error.

use crate::context::Context;
use crate::error::{Error, Result};
use crate::interact::open_in_browser;
use crate::platform::http::api_client;
use crate::types::DeviceCode;
use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Grant type sent when polling the token endpoint
pub const DEVICE_CODE_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:device_code";

const ERROR_AUTHORIZATION_PENDING: &str = "authorization_pending";
const ERROR_SLOW_DOWN: &str = "slow_down";
const ERROR_EXPIRED_TOKEN: &str = "expired_token";
const ERROR_ACCESS_DENIED: &str = "access_denied";

/// Endpoints of one provider's device grant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceEndpoints {
    /// Device authorization endpoint
    pub device_code_url: String,
    /// Token endpoint
    pub token_url: String,
}

/// Poll pacing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollTiming {
    /// Floor applied to the provider's advertised interval
    pub min_interval: Duration,
    /// Added to the interval after every `slow_down`
    pub slow_down_step: Duration,
}

impl Default for PollTiming {
    fn default() -> Self {
        Self {
            min_interval: Duration::from_secs(5),
            slow_down_step: Duration::from_secs(5),
        }
    }
}

/// Current wait between token requests
#[derive(Debug, Clone, Copy)]
struct PollSchedule {
    interval: Duration,
    step: Duration,
}

impl PollSchedule {
    fn new(advertised_secs: u64, timing: PollTiming) -> Self {
        Self {
            interval: Duration::from_secs(advertised_secs).max(timing.min_interval),
            step: timing.slow_down_step,
        }
    }

    const fn interval(&self) -> Duration {
        self.interval
    }

    fn slow_down(&mut self) {
        self.interval = self.interval.saturating_add(self.step);
    }
}

/// Classified token endpoint reply
#[derive(Debug, PartialEq, Eq)]
enum TokenReply {
    Granted(String),
    Pending,
    SlowDown,
    Expired,
    Denied,
    Failed(String),
}

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

#[derive(Deserialize)]
struct OAuthError {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

fn describe(error: &str, description: Option<&str>) -> String {
    match description.filter(|d| !d.is_empty()) {
        Some(description) => format!("{error}: {description}"),
        None => error.to_string(),
    }
}

// GitHub answers pending polls with 200 + error body, GitLab with 400, so the
// body decides and the status only gates success.
fn classify_token_reply(status: StatusCode, body: &str) -> TokenReply {
    let Ok(parsed) = serde_json::from_str::<TokenResponse>(body) else {
        return TokenReply::Failed(format!("unexpected response from token endpoint ({status})"));
    };

    if status.is_success()
        && let Some(token) = parsed.access_token.filter(|t| !t.is_empty())
    {
        return TokenReply::Granted(token);
    }

    match parsed.error.as_deref() {
        Some(ERROR_AUTHORIZATION_PENDING) => TokenReply::Pending,
        Some(ERROR_SLOW_DOWN) => TokenReply::SlowDown,
        Some(ERROR_EXPIRED_TOKEN) => TokenReply::Expired,
        Some(ERROR_ACCESS_DENIED) => TokenReply::Denied,
        Some(other) => TokenReply::Failed(describe(other, parsed.error_description.as_deref())),
        None => TokenReply::Failed(format!("unexpected response from token endpoint ({status})")),
    }
}

/// Device grant for one provider and client
#[derive(Debug, Clone)]
pub struct DeviceFlow<'a> {
    endpoints: DeviceEndpoints,
    client_id: &'a str,
    scopes: &'a [&'static str],
    timing: PollTiming,
}

impl<'a> DeviceFlow<'a> {
    /// Create a flow with the default poll timing
    pub fn new(endpoints: DeviceEndpoints, client_id: &'a str, scopes: &'a [&'static str]) -> Self {
        Self {
            endpoints,
            client_id,
            scopes,
            timing: PollTiming::default(),
        }
    }

    /// Override poll pacing
    #[must_use]
    pub const fn with_timing(mut self, timing: PollTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Run the grant and return the access token
    pub async fn run(&self, ctx: &Context) -> Result<String> {
        let client = api_client()?;

        let code = self.request_code(ctx, &client).await?;
        display_code(ctx, &code);
        self.poll(ctx, &client, &code).await
    }

    async fn request_code(&self, ctx: &Context, client: &Client) -> Result<DeviceCode> {
        info!(url = %self.endpoints.device_code_url, "requesting device code");
        let scope = self.scopes.join(" ");

        let (status, body) = ctx
            .run(async {
                let response = client
                    .post(&self.endpoints.device_code_url)
                    .header(ACCEPT, "application/json")
                    .form(&[("client_id", self.client_id), ("scope", scope.as_str())])
                    .send()
                    .await?;
                let status = response.status();
                Ok::<_, Error>((status, response.text().await?))
            })
            .await?;

        if status != StatusCode::OK {
            return Err(serde_json::from_str::<OAuthError>(&body).map_or(
                Error::UnexpectedStatus {
                    status: status.as_u16(),
                },
                |e| {
                    Error::DeviceFlow(format!(
                        "failed to request device code: {}",
                        describe(&e.error, e.error_description.as_deref())
                    ))
                },
            ));
        }

        let code: DeviceCode = serde_json::from_str(&body)
            .map_err(|e| Error::DeviceFlow(format!("malformed device code response: {e}")))?;

        debug!(
            user_code = %code.user_code,
            verification_uri = %code.verification_uri,
            expires_in = code.expires_in,
            interval = code.interval,
            "device code issued"
        );
        Ok(code)
    }

    async fn poll(&self, ctx: &Context, client: &Client, code: &DeviceCode) -> Result<String> {
        let mut schedule = PollSchedule::new(code.interval, self.timing);
        // An expiry too far out to represent is treated as none.
        let expires_at = (code.expires_in > 0)
            .then(|| Instant::now().checked_add(Duration::from_secs(code.expires_in)))
            .flatten();
        let mut attempt = 0u32;

        loop {
            ctx.sleep(schedule.interval()).await?;

            if expires_at.is_some_and(|at| Instant::now() >= at) {
                warn!("device code expired locally");
                return Err(Error::DeviceCodeExpired);
            }

            attempt += 1;
            debug!(attempt, interval = ?schedule.interval(), "polling token endpoint");

            match self.request_token(ctx, client, &code.device_code).await? {
                TokenReply::Granted(token) => {
                    info!(attempt, "device authorization granted");
                    return Ok(token);
                }
                TokenReply::Pending => {}
                TokenReply::SlowDown => {
                    schedule.slow_down();
                    debug!(interval = ?schedule.interval(), "slow_down received");
                }
                TokenReply::Expired => {
                    warn!("device code expired");
                    return Err(Error::DeviceCodeExpired);
                }
                TokenReply::Denied => {
                    warn!("user denied authorization");
                    return Err(Error::AccessDenied);
                }
                TokenReply::Failed(reason) => return Err(Error::DeviceFlow(reason)),
            }
        }
    }

    async fn request_token(&self, ctx: &Context, client: &Client, device_code: &str) -> Result<TokenReply> {
        let (status, body) = ctx
            .run(async {
                let response = client
                    .post(&self.endpoints.token_url)
                    .header(ACCEPT, "application/json")
                    .form(&[
                        ("client_id", self.client_id),
                        ("device_code", device_code),
                        ("grant_type", DEVICE_CODE_GRANT_TYPE),
                    ])
                    .send()
                    .await?;
                let status = response.status();
                Ok::<_, Error>((status, response.text().await?))
            })
            .await?;

        Ok(classify_token_reply(status, &body))
    }
}

fn display_code(ctx: &Context, code: &DeviceCode) {
    let prompter = ctx.prompter();
    prompter.say(&format!("First, copy your one-time code: {}", code.user_code));

    let url = code.browser_url();
    // Pause so the code can be copied before the browser takes focus.
    if let Err(e) = prompter.read_line("Press Enter to open the verification page in your browser...") {
        debug!(error = %e, "no confirmation before opening browser");
    }
    open_in_browser(prompter, ctx.browser(), url);
    prompter.say("Waiting for authorization...");
}

/// Pick the client ID for a host
///
/// An explicit ID always wins. Without one, the family's shared default ID is
/// used only on its primary hosted instance; self-hosted instances get `None`.
pub fn resolve_client_id<'a>(
    configured: Option<&'a str>,
    host: &str,
    default_host: &str,
    default_client_id: &'a str,
) -> Option<&'a str> {
    configured.or_else(|| {
        let host = crate::platform::http::canonical_host(host);
        (host.is_empty() || host == default_host).then_some(default_client_id)
    })
}
