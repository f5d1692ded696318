//! Turning a command-line target into a provider

use crate::cli::style::{Stylize, spinner_style};
use forge_auth::error::{Error, Result};
use forge_auth::{Context, Provider, ProviderConfig, Registry, detect};
use indicatif::ProgressBar;
use std::time::Duration;
use tracing::debug;

/// `--provider` value that asks for detection
pub const AUTO: &str = "auto";

/// Environment variable holding the OAuth client ID for a provider
fn client_id_env(provider: &str) -> Option<&'static str> {
    match provider {
        "github" => Some("GITHUB_CLIENT_ID"),
        "gitlab" => Some("GITLAB_CLIENT_ID"),
        _ => None,
    }
}

/// Resolve `input` (a registered name or a host) to a provider
///
/// A registered name is used as-is and must agree with `--provider`. Anything
/// else is a host, detected unless `--provider` names the family. Without a
/// `--client-id`, a provider that has no client ID of its own picks one up
/// from its environment variable.
pub async fn resolve_provider(
    registry: &Registry,
    ctx: &Context,
    input: &str,
    provider_flag: &str,
    client_id: Option<&str>,
) -> Result<Box<dyn Provider>> {
    let input = input.trim().to_lowercase();
    let explicit = (provider_flag != AUTO).then_some(provider_flag);

    let provider = if registry.contains(&input) {
        if let Some(flag) = explicit
            && flag != input
        {
            return Err(Error::Config(format!(
                "cannot use --provider {flag} with provider alias '{input}'\nUse: forge-auth login {input}"
            )));
        }
        let config = ProviderConfig::default().with_client_id(client_id);
        let provider = registry
            .get_with_config(&input, config)
            .ok_or_else(|| unknown_provider(registry, &input))?;
        if provider.host().is_empty() {
            return Err(Error::Config(format!(
                "provider '{input}' requires a host\nUse: forge-auth login <host> --provider {input}"
            )));
        }
        provider
    } else if let Some(name) = explicit {
        let config = ProviderConfig::for_host(&input).with_client_id(client_id);
        registry
            .get_with_config(name, config)
            .ok_or_else(|| unknown_provider(registry, name))?
    } else {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(spinner_style());
        spinner.set_message(format!("Detecting provider type for {}...", input.accent()));
        spinner.enable_steady_tick(Duration::from_millis(80));

        let provider = detect(registry, ctx, &input, client_id).await;
        spinner.finish_and_clear();
        provider
    };

    if client_id.is_some() || provider.client_id().is_some() {
        return Ok(provider);
    }
    let Some(var) = client_id_env(provider.name()) else {
        return Ok(provider);
    };
    let Ok(env_client_id) = std::env::var(var) else {
        return Ok(provider);
    };

    debug!(var, provider = provider.name(), "using client ID from environment");
    let config = ProviderConfig::for_host(provider.host()).with_client_id(Some(&env_client_id));
    Ok(registry
        .get_with_config(provider.name(), config)
        .unwrap_or(provider))
}

fn unknown_provider(registry: &Registry, name: &str) -> Error {
    Error::Config(format!(
        "unknown provider '{name}'. Available providers: {}",
        registry.list().join(", ")
    ))
}
