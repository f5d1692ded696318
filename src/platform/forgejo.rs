//! Forgejo provider (Codeberg and self-hosted instances)

use crate::auth::{PAT_SCOPES, PatAuth};
use crate::context::Context;
use crate::error::Result;
use crate::platform::Provider;
use crate::types::{ProviderConfig, UserInfo, ValidationStatus};
use async_trait::async_trait;

/// Hosted Forgejo instance behind the `codeberg` alias
pub const CODEBERG_HOST: &str = "codeberg.org";

/// Forgejo provider using personal access tokens
///
/// Forgejo has no canonical instance, so without a host it cannot
/// authenticate; the `codeberg` registry alias supplies one.
#[derive(Debug, Clone)]
pub struct ForgejoProvider {
    pat: PatAuth,
}

impl ForgejoProvider {
    /// Create a provider bound to `config.host`
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            pat: PatAuth::new("forgejo", &config.host, None),
        }
    }

    /// Create a provider that defaults to codeberg.org
    pub fn codeberg(config: ProviderConfig) -> Self {
        Self {
            pat: PatAuth::new("forgejo", &config.host, Some(CODEBERG_HOST)),
        }
    }
}

#[async_trait]
impl Provider for ForgejoProvider {
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
