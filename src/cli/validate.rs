//! Validate command - check an existing token

use crate::cli::resolve::resolve_provider;
use crate::cli::style::{Stylize, check, cross};
use anstream::eprintln;
use forge_auth::error::{Error, Result};
use forge_auth::{Context, Registry, ValidationStatus};
use std::time::Duration;

/// Read a token and report what the provider says about it
///
/// An invalid token is reported and then returned as the command's error so
/// the exit status reflects it.
pub async fn run_validate(
    registry: &Registry,
    ctx: Context,
    input: &str,
    provider_flag: &str,
    timeout: Duration,
) -> Result<()> {
    let ctx = ctx.with_timeout(timeout);
    let provider = resolve_provider(registry, &ctx, input, provider_flag, None).await?;

    let token = ctx.prompter().read_secret("Token: ")?;
    let token = token.trim();
    if token.is_empty() {
        return Err(Error::EmptyToken);
    }

    let ctx = ctx.restarted();
    eprintln!("{}", provider.host().emphasis());
    eprintln!("  {} {}", "Provider:".muted(), provider.name());

    match provider.validate_token(&ctx, token).await {
        ValidationStatus::Valid => {
            eprintln!("  {} {} valid", "Status:".muted(), check());
        }
        ValidationStatus::Unknown => {
            eprintln!("  {} {}", "Status:".muted(), "unknown (cannot be validated)".muted());
            return Ok(());
        }
        ValidationStatus::Invalid(e) => {
            eprintln!("  {} {} invalid - {e}", "Status:".muted(), cross());
            return Err(e);
        }
    }

    match provider.user_info(&ctx, token).await {
        Ok(user) => eprintln!("  {} {}", "User:".muted(), user.to_string().accent()),
        Err(e) => tracing::debug!(error = %e, "user lookup failed"),
    }
    match provider.token_scopes(&ctx, token).await {
        Ok(scopes) if !scopes.is_empty() => {
            eprintln!("  {} {}", "Scopes:".muted(), scopes.join(", "));
        }
        Ok(_) => {}
        Err(e) => tracing::debug!(error = %e, "scope lookup failed"),
    }
    Ok(())
}
