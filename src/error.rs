//! Error types for forge-auth

use thiserror::Error;

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while resolving providers, authenticating or validating tokens
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or inconsistent configuration (client ID, host, provider name)
    #[error("{0}")]
    Config(String),

    /// Device authorization grant failed with a provider-reported reason
    #[error("device flow failed: {0}")]
    DeviceFlow(String),

    /// Device code lifetime elapsed before the user authorized it
    #[error("device code expired, please try again")]
    DeviceCodeExpired,

    /// User rejected the authorization request
    #[error("access denied by user")]
    AccessDenied,

    /// Token rejected by the provider (HTTP 401) or by post-entry validation
    #[error("token is invalid or expired")]
    InvalidToken,

    /// Provider answered with a status we do not interpret
    #[error("unexpected status code: {status}")]
    UnexpectedStatus {
        /// HTTP status code
        status: u16,
    },

    /// Entered token was blank
    #[error("token cannot be empty")]
    EmptyToken,

    /// User declined to continue
    #[error("{0}")]
    Aborted(String),

    /// User information cannot be obtained for this provider
    #[error("user info not available for {0} provider")]
    UserInfoUnavailable(String),

    /// Interactive input failed or is unavailable
    #[error("failed to read input: {0}")]
    Prompt(String),

    /// Operation deadline elapsed
    #[error("context deadline exceeded")]
    DeadlineExceeded,

    /// Operation cancelled by the caller
    #[error("operation cancelled")]
    Cancelled,

    /// Invalid URL built from a host
    #[error("invalid host '{host}': {reason}")]
    InvalidHost {
        /// Host as supplied
        host: String,
        /// Parser message
        reason: String,
    },

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON decoding error
    #[error("failed to decode response: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error came from the deadline or an external cancellation
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::DeadlineExceeded | Self::Cancelled)
    }

    /// Whether the user deliberately stopped the attempt
    pub const fn is_abort(&self) -> bool {
        matches!(self, Self::Aborted(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_classification() {
        assert!(Error::DeadlineExceeded.is_timeout());
        assert!(Error::Cancelled.is_timeout());
        assert!(!Error::InvalidToken.is_timeout());
    }

    #[test]
    fn test_messages() {
        assert_eq!(Error::EmptyToken.to_string(), "token cannot be empty");
        assert_eq!(
            Error::InvalidToken.to_string(),
            "token is invalid or expired"
        );
        assert_eq!(
            Error::UnexpectedStatus { status: 502 }.to_string(),
            "unexpected status code: 502"
        );
        assert!(Error::Aborted("login cancelled".into()).is_abort());
    }
}
