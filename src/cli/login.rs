//! Login command - obtain a token for a host

use crate::cli::resolve::resolve_provider;
use crate::cli::style::{Stylize, check};
use anstream::{eprintln, println};
use forge_auth::error::{Error, Result};
use forge_auth::platform::http::base_url;
use forge_auth::{Context, Provider, Registry, ValidationStatus};
use std::time::Duration;

/// Options for the login command
#[derive(Debug, Clone)]
pub struct LoginOptions<'a> {
    /// Provider name or host
    pub input: &'a str,
    /// `auto` or a registered provider name
    pub provider: &'a str,
    /// OAuth client ID override
    pub client_id: Option<&'a str>,
    /// Bound on the whole operation
    pub timeout: Duration,
    /// Show the resolved provider and stop
    pub dry_run: bool,
}

/// Run the login command
///
/// The token is the only thing written to stdout.
pub async fn run_login(registry: &Registry, ctx: Context, options: LoginOptions<'_>) -> Result<()> {
    let ctx = ctx.with_timeout(options.timeout);
    let provider =
        resolve_provider(registry, &ctx, options.input, options.provider, options.client_id).await?;

    eprintln!(
        "Authenticating with {} ({})...",
        provider.name().accent(),
        provider.host().accent()
    );

    if options.dry_run {
        print_dry_run(provider.as_ref());
        return Ok(());
    }

    // Detection requests do not count against the authentication budget.
    let ctx = ctx.restarted();
    let token = match provider.authenticate(&ctx).await {
        Ok(token) => token,
        Err(e) if e.is_abort() => {
            eprintln!("Login cancelled.");
            return Ok(());
        }
        Err(e) => {
            print_failure_hints(&e, provider.host(), options.timeout);
            return Err(e);
        }
    };

    let ctx = ctx.restarted();
    eprintln!();
    eprintln!("Validating token...");
    match provider.validate_token(&ctx, &token).await {
        ValidationStatus::Valid => match provider.user_info(&ctx, &token).await {
            Ok(user) => eprintln!(
                "{} Authenticated to {} as {}",
                check(),
                provider.host().accent(),
                user.to_string().accent()
            ),
            Err(e) => {
                tracing::debug!(error = %e, "user lookup failed after validation");
                eprintln!("{} Authenticated to {}", check(), provider.host().accent());
            }
        },
        ValidationStatus::Unknown => {
            eprintln!("{}", "Token accepted without validation.".muted());
        }
        ValidationStatus::Invalid(e) => {
            if e.is_timeout() {
                print_failure_hints(&e, provider.host(), options.timeout);
            }
            return Err(e);
        }
    }

    println!("{token}");
    Ok(())
}

fn print_dry_run(provider: &dyn Provider) {
    eprintln!();
    eprintln!("{}", "Dry-run mode: preview of what would happen".emphasis());
    eprintln!("  {} {}", "Provider:".muted(), provider.name());
    eprintln!("  {} {}", "Host:".muted(), provider.host());
    let scopes = provider.scopes();
    if scopes.is_empty() {
        eprintln!("  {} {}", "Scopes:".muted(), "none".muted());
    } else {
        eprintln!("  {} {}", "Scopes:".muted(), scopes.join(", "));
    }
    if let Some(client_id) = provider.client_id() {
        eprintln!("  {} {client_id}", "Client ID:".muted());
    }
    eprintln!();
    eprintln!("No authentication performed. Run without --dry-run to authenticate.");
}

fn print_failure_hints(error: &Error, host: &str, timeout: Duration) {
    if error.is_timeout() {
        eprintln!();
        eprintln!(
            "The operation timed out after {} seconds. Try:",
            timeout.as_secs()
        );
        eprintln!("  - Increasing the timeout: {}", "--timeout 120".accent());
        eprintln!("  - Checking your internet connection");
        eprintln!(
            "  - Verifying the host is accessible: {}",
            format!("curl {}", base_url(host).unwrap_or_else(|_| host.to_string())).accent()
        );
    } else if matches!(error, Error::Config(msg) if msg.contains("client ID")) {
        eprintln!();
        eprintln!("For self-hosted instances, you need to create an OAuth application.");
        eprintln!("See the instructions above or use --dry-run to preview the configuration.");
    }
}
