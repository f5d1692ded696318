//! Core types shared by providers and authenticators

use crate::error::Error;
use serde::Deserialize;
use std::fmt;

/// Input to a provider constructor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Host to bind the provider to; empty means "use the default host"
    pub host: String,
    /// OAuth client ID override
    pub client_id: Option<String>,
}

impl ProviderConfig {
    /// Config for a host with no client ID override
    pub fn for_host(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            client_id: None,
        }
    }

    /// Attach a client ID, ignoring blank values
    #[must_use]
    pub fn with_client_id(mut self, client_id: Option<&str>) -> Self {
        self.client_id = client_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(ToString::to_string);
        self
    }
}

/// Outcome of a token check
///
/// `Invalid` always carries the reason. `Unknown` means validity could not be
/// determined at all and is never used for a token the provider rejected.
#[derive(Debug)]
pub enum ValidationStatus {
    /// Provider accepted the token
    Valid,
    /// Provider rejected the token, or the check failed
    Invalid(Error),
    /// Validity cannot be determined for this host
    Unknown,
}

impl ValidationStatus {
    /// True only for `Valid`
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Short label for display
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Invalid(_) => "invalid",
            Self::Unknown => "unknown",
        }
    }

    /// Reason attached to an `Invalid` status
    pub const fn error(&self) -> Option<&Error> {
        match self {
            Self::Invalid(err) => Some(err),
            _ => None,
        }
    }
}

impl From<crate::error::Result<()>> for ValidationStatus {
    fn from(result: crate::error::Result<()>) -> Self {
        match result {
            Ok(()) => Self::Valid,
            Err(err) => Self::Invalid(err),
        }
    }
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid(err) => write!(f, "invalid - {err}"),
            other => f.write_str(other.label()),
        }
    }
}

/// Identity behind a token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInfo {
    /// Login name
    pub username: String,
    /// Display name, if the account has one
    pub full_name: Option<String>,
}

impl UserInfo {
    /// Build from raw API fields, dropping a blank display name
    pub fn new(username: impl Into<String>, full_name: Option<String>) -> Self {
        Self {
            username: username.into(),
            full_name: full_name.filter(|name| !name.trim().is_empty()),
        }
    }
}

impl fmt::Display for UserInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.full_name {
            Some(name) => write!(f, "{} ({name})", self.username),
            None => f.write_str(&self.username),
        }
    }
}

/// Device authorization response (RFC 8628 section 3.2)
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceCode {
    /// Code the client polls with
    pub device_code: String,
    /// Code the user types at the verification page
    pub user_code: String,
    /// Verification page
    pub verification_uri: String,
    /// Verification page with the user code pre-filled
    #[serde(default)]
    pub verification_uri_complete: Option<String>,
    /// Seconds until the codes expire
    #[serde(default)]
    pub expires_in: u64,
    /// Minimum seconds between polls
    #[serde(default)]
    pub interval: u64,
}

impl DeviceCode {
    /// URL to show the user, preferring the pre-filled variant
    pub fn browser_url(&self) -> &str {
        self.verification_uri_complete
            .as_deref()
            .filter(|url| !url.is_empty())
            .unwrap_or(&self.verification_uri)
    }
}
