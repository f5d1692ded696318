//! Provider detection from a bare host
//!
//! Detectors run one at a time in registry priority order. Any detector failure
//! ends detection with the unknown provider; detection itself never fails.

use crate::context::Context;
use crate::platform::http::client_with_timeout;
use crate::platform::{Provider, Registry, UnknownProvider};
use crate::types::ProviderConfig;
use std::time::Duration;
use tracing::{debug, warn};

/// Per-request detection timeout, separate from the authentication timeout
pub const DETECTION_TIMEOUT: Duration = Duration::from_secs(3);

/// Resolve the provider serving `host`
///
/// A non-empty `client_id` is applied to the matched provider by rebuilding
/// it through the registry.
pub async fn detect(
    registry: &Registry,
    ctx: &Context,
    host: &str,
    client_id: Option<&str>,
) -> Box<dyn Provider> {
    match client_with_timeout(DETECTION_TIMEOUT) {
        Ok(client) => detect_with(registry, ctx, &client, host, client_id).await,
        Err(e) => {
            warn!(host, error = %e, "could not build detection client");
            Box::new(UnknownProvider::new(host))
        }
    }
}

async fn detect_with(
    registry: &Registry,
    ctx: &Context,
    client: &reqwest::Client,
    host: &str,
    client_id: Option<&str>,
) -> Box<dyn Provider> {
    for name in registry.list_for_detection() {
        let Some(detector) = registry.registration(name).and_then(|r| r.detector.clone()) else {
            continue;
        };

        debug!(host, candidate = name, "trying detector");
        let provider = match ctx.run(detector.detect(client, host)).await {
            Ok(Some(provider)) => provider,
            Ok(None) => continue,
            Err(e) => {
                warn!(host, candidate = name, error = %e, "detection request failed, treating host as unknown");
                return Box::new(UnknownProvider::new(host));
            }
        };

        debug!(host, provider = provider.name(), "detected provider");
        if let Some(client_id) = client_id.filter(|id| !id.trim().is_empty()) {
            let config = ProviderConfig::for_host(provider.host()).with_client_id(Some(client_id));
            if let Some(rebuilt) = registry.get_with_config(provider.name(), config) {
                return rebuilt;
            }
        }
        return provider;
    }

    debug!(host, "no provider matched");
    Box::new(UnknownProvider::new(host))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::platform::{Detector, Registration};
    use async_trait::async_trait;
    use mockito::Matcher;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts calls and answers with a fixed outcome
    struct CountingDetector {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingDetector {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Detector for CountingDetector {
        async fn detect(&self, _client: &reqwest::Client, _host: &str) -> Result<Option<Box<dyn Provider>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Error::Io(std::io::Error::other("connection refused")));
            }
            Ok(None)
        }
    }

    fn unknown_constructor() -> Registration {
        Registration::new(|c| Box::new(UnknownProvider::new(c.host)))
    }

    #[tokio::test]
    async fn test_canonical_host_needs_no_network() {
        // Any real request would fail with a 1 ms timeout.
        let client = client_with_timeout(Duration::from_millis(1)).unwrap();
        let later = CountingDetector::new(false);
        let mut registry = Registry::builtin();
        registry.register("custom", unknown_constructor().with_detector(later.clone()));

        let provider = detect_with(&registry, &Context::background(), &client, "github.com", None).await;
        assert_eq!(provider.name(), "github");
        assert_eq!(provider.host(), "github.com");
        assert_eq!(later.calls(), 0);
    }

    #[tokio::test]
    async fn test_all_endpoints_missing_is_unknown() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", Matcher::Any)
            .with_status(404)
            .create_async()
            .await;

        let host = server.url();
        let provider = detect(&Registry::builtin(), &Context::background(), &host, None).await;
        assert_eq!(provider.name(), "unknown");
        assert_eq!(provider.host(), host);
    }

    #[tokio::test]
    async fn test_detector_error_stops_detection() {
        let failing = CountingDetector::new(true);
        let later = CountingDetector::new(false);

        let mut registry = Registry::new();
        registry.register("github", unknown_constructor().with_detector(failing.clone()));
        registry.register("gitlab", unknown_constructor().with_detector(later.clone()));

        let provider = detect(&registry, &Context::background(), "git.example", None).await;
        assert_eq!(provider.name(), "unknown");
        assert_eq!(provider.host(), "git.example");
        assert_eq!(failing.calls(), 1);
        assert_eq!(later.calls(), 0);
    }

    #[tokio::test]
    async fn test_no_match_tries_every_candidate() {
        let first = CountingDetector::new(false);
        let second = CountingDetector::new(false);

        let mut registry = Registry::new();
        registry.register("github", unknown_constructor().with_detector(first.clone()));
        registry.register("custom", unknown_constructor().with_detector(second.clone()));

        detect(&registry, &Context::background(), "git.example", None).await;
        assert_eq!((first.calls(), second.calls()), (1, 1));
    }

    #[tokio::test]
    async fn test_detects_gitea_and_forgejo() {
        for (version, expected) in [("1.22.1", "gitea"), ("8.0.0+gitea-1.21.0 forgejo", "forgejo")] {
            let mut server = mockito::Server::new_async().await;
            server
                .mock("GET", "/api/v1/version")
                .with_status(200)
                .with_body(format!(r#"{{"version":"{version}"}}"#))
                .create_async()
                .await;

            // Unmatched requests get mockito's 501, which is not a match.
            let provider = detect(&Registry::builtin(), &Context::background(), &server.url(), None).await;
            assert_eq!(provider.name(), expected);
            assert_eq!(provider.host(), server.url());
        }
    }

    #[tokio::test]
    async fn test_explicit_client_id_is_honored() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v3")
            .with_status(404)
            .create_async()
            .await;
        server
            .mock("GET", "/api/v4/version")
            .with_status(200)
            .with_body(r#"{"version":"17.0.0"}"#)
            .create_async()
            .await;

        let registry = Registry::builtin();
        let ctx = Context::background();

        let plain = detect(&registry, &ctx, &server.url(), None).await;
        assert_eq!(plain.name(), "gitlab");
        assert_eq!(plain.client_id(), None);

        let configured = detect(&registry, &ctx, &server.url(), Some("my-app")).await;
        assert_eq!(configured.name(), "gitlab");
        assert_eq!(configured.host(), server.url());
        assert_eq!(configured.client_id(), Some("my-app"));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_unknown() {
        let provider = detect(&Registry::builtin(), &Context::background(), "http://127.0.0.1:1", None).await;
        assert_eq!(provider.name(), "unknown");
    }

    #[tokio::test]
    async fn test_cancelled_context_is_unknown() {
        let ctx = Context::background();
        ctx.cancel();
        let provider = detect(&Registry::builtin(), &ctx, "git.example", None).await;
        assert_eq!(provider.name(), "unknown");
    }
}
