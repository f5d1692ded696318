//! Shared HTTP plumbing for provider API calls

use crate::context::Context;
use crate::error::{Error, Result};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Default request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// User agent sent with every request (GitHub rejects requests without one)
pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Build an HTTP client with the given timeout
pub fn client_with_timeout(timeout: Duration) -> Result<Client> {
    Ok(Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()?)
}

/// HTTP client for authentication and API calls
pub fn api_client() -> Result<Client> {
    client_with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
}

/// Base URL for a host
///
/// Bare hosts get `https://`; a host that already carries an `http://` or
/// `https://` scheme is used as given.
pub fn base_url(host: &str) -> Result<String> {
    let candidate = if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{host}")
    };

    let url = Url::parse(&candidate).map_err(|e| Error::InvalidHost {
        host: host.to_string(),
        reason: e.to_string(),
    })?;
    if url.host_str().is_none() {
        return Err(Error::InvalidHost {
            host: host.to_string(),
            reason: "missing hostname".to_string(),
        });
    }

    Ok(candidate.trim_end_matches('/').to_string())
}

/// Host without scheme, port-preserving, lowercased for canonical comparisons
pub fn canonical_host(host: &str) -> String {
    host.trim()
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_end_matches('/')
        .to_ascii_lowercase()
}

/// GET `url` with `authorization` and map the status per the validation rules
///
/// 200 yields the response, 401 is [`Error::InvalidToken`], anything else is
/// [`Error::UnexpectedStatus`]. Transport failures propagate unchanged.
pub async fn authenticated_get(ctx: &Context, url: &str, authorization: &str) -> Result<Response> {
    let client = api_client()?;
    debug!(url, "authenticated API request");

    let response = ctx
        .run(async {
            Ok::<_, Error>(client
                .get(url)
                .header(AUTHORIZATION, authorization)
                .header(ACCEPT, "application/json")
                .send()
                .await?)
        })
        .await?;

    check_status(response)
}

/// Classify a response status
pub fn check_status(response: Response) -> Result<Response> {
    match response.status() {
        StatusCode::OK => Ok(response),
        StatusCode::UNAUTHORIZED => Err(Error::InvalidToken),
        status => Err(Error::UnexpectedStatus {
            status: status.as_u16(),
        }),
    }
}

/// Decode a JSON body under the context's deadline
pub async fn json_body<T: serde::de::DeserializeOwned>(ctx: &Context, response: Response) -> Result<T> {
    let body = ctx.run(async { Ok::<_, Error>(response.text().await?) }).await?;
    Ok(serde_json::from_str(&body)?)
}
