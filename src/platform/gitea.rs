//! Gitea provider and the detector shared with Forgejo

use crate::auth::{PAT_SCOPES, PatAuth};
use crate::context::Context;
use crate::error::Result;
use crate::platform::http::{base_url, canonical_host, check_status};
use crate::platform::{Detector, ForgejoProvider, Provider};
use crate::types::{ProviderConfig, UserInfo, ValidationStatus};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use tracing::debug;

/// Primary hosted instance
pub const GITEA_HOST: &str = "gitea.com";

/// Gitea provider using personal access tokens
#[derive(Debug, Clone)]
pub struct GiteaProvider {
    pat: PatAuth,
}

impl GiteaProvider {
    /// Create a provider; an empty host means gitea.com
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            pat: PatAuth::new("gitea", &config.host, Some(GITEA_HOST)),
        }
    }
}

#[async_trait]
impl Provider for GiteaProvider {
    fn name(&self) -> &str {
        self.pat.provider()
    }

    fn host(&self) -> &str {
        self.pat.host()
    }

    fn scopes(&self) -> &[&'static str] {
        PAT_SCOPES
    }

    async fn authenticate(&self, ctx: &Context) -> Result<String> {
        self.pat.authenticate(ctx).await
    }

    async fn validate_token(&self, ctx: &Context, token: &str) -> ValidationStatus {
        self.pat.validate_token(ctx, token).await
    }

    async fn user_info(&self, ctx: &Context, token: &str) -> Result<UserInfo> {
        self.pat.user_info(ctx, token).await
    }

    async fn token_scopes(&self, _ctx: &Context, _token: &str) -> Result<Vec<String>> {
        Ok(self.pat.token_scopes())
    }
}

#[derive(Deserialize)]
struct VersionInfo {
    #[serde(default)]
    version: String,
}

/// Which of the two forge flavors a `/api/v1/version` string belongs to
fn classify_version(version: &str) -> Option<&'static str> {
    if version.to_ascii_lowercase().contains("forgejo") {
        Some("forgejo")
    } else if version.is_empty() {
        None
    } else {
        Some("gitea")
    }
}

/// Detector for Gitea and Forgejo, which expose the same version endpoint
///
/// Known hosted instances match by name. Elsewhere a version string containing
/// "forgejo" selects Forgejo and any other non-empty version selects Gitea, so
/// a rebranded Forgejo instance is reported as Gitea.
#[derive(Debug, Default, Clone, Copy)]
pub struct GiteaFamilyDetector;

impl GiteaFamilyDetector {
    fn provider(flavor: &str, host: &str) -> Box<dyn Provider> {
        let config = ProviderConfig::for_host(host);
        if flavor == "forgejo" {
            Box::new(ForgejoProvider::new(config))
        } else {
            Box::new(GiteaProvider::new(config))
        }
    }
}

#[async_trait]
impl Detector for GiteaFamilyDetector {
    async fn detect(&self, client: &reqwest::Client, host: &str) -> Result<Option<Box<dyn Provider>>> {
        match canonical_host(host).as_str() {
            "codeberg.org" => return Ok(Some(Self::provider("forgejo", host))),
            "gitea.com" | "gitea.io" => return Ok(Some(Self::provider("gitea", host))),
            _ => {}
        }

        let url = format!("{}/api/v1/version", base_url(host)?);
        debug!(url, "checking for Gitea or Forgejo");
        let response = client.get(&url).header(ACCEPT, "application/json").send().await?;

        let Ok(response) = check_status(response) else {
            return Ok(None);
        };
        let body = response.text().await?;
        let Ok(info) = serde_json::from_str::<VersionInfo>(&body) else {
            return Ok(None);
        };

        debug!(version = %info.version, "forge version reported");
        Ok(classify_version(&info.version).map(|flavor| Self::provider(flavor, host)))
    }
}
