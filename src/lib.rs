//! forge-auth - credentials for Git hosting services
//!
//! Resolves which service a host runs (GitHub, GitLab, Gitea, Forgejo) and
//! obtains a token for it through the OAuth device flow or a personal access
//! token, falling back to manual entry when the host cannot be identified.
//!
//! ```no_run
//! use forge_auth::{Context, Registry, detect};
//!
//! # async fn run() -> forge_auth::Result<()> {
//! let registry = Registry::builtin();
//! let ctx = Context::background();
//! let provider = detect(&registry, &ctx, "gitlab.example.com", None).await;
//! let token = provider.authenticate(&ctx).await?;
//! assert!(provider.validate_token(&ctx, &token).await.is_valid());
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod context;
pub mod error;
pub mod interact;
pub mod platform;
pub mod types;

#[cfg(test)]
mod testing;

pub use context::Context;
pub use error::{Error, Result};
pub use interact::{Browser, NonInteractive, Prompter, SystemBrowser};
pub use platform::{Detector, Provider, Registration, Registry, UnknownProvider, detect};
pub use types::{ProviderConfig, UserInfo, ValidationStatus};
