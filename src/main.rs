//! forge-auth - access tokens for Git hosting services
//!
//! CLI binary that detects a host's provider and runs its login flow.

use anyhow::Result;
use clap::{Parser, Subcommand};
use forge_auth::{Context, Registry, SystemBrowser};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

mod cli;

#[derive(Parser)]
#[command(name = "forge-auth")]
#[command(about = "Obtain and validate tokens for GitHub, GitLab, Gitea and Forgejo")]
#[command(version)]
struct Cli {
    /// Show debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Obtain a token and print it to stdout
    Login {
        /// Provider name (github, gitlab, codeberg, ...) or host
        #[arg(default_value = "github")]
        target: String,

        /// Provider type for a host, or "auto" to detect it
        #[arg(long, default_value = cli::AUTO)]
        provider: String,

        /// OAuth client ID (falls back to GITHUB_CLIENT_ID / GITLAB_CLIENT_ID)
        #[arg(long)]
        client_id: Option<String>,

        /// Timeout in seconds for network operations
        #[arg(long, default_value_t = 30)]
        timeout: u64,

        /// Dry run - show what would be done without authenticating
        #[arg(long)]
        dry_run: bool,
    },

    /// Check a token read from stdin
    Validate {
        /// Provider name or host the token belongs to
        target: String,

        /// Provider type for a host, or "auto" to detect it
        #[arg(long, default_value = cli::AUTO)]
        provider: String,

        /// Timeout in seconds for network operations
        #[arg(long, default_value_t = 30)]
        timeout: u64,
    },

    /// Print the provider type a host runs
    Detect {
        /// Host to inspect
        host: String,
    },

    /// List registered providers
    Providers,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "forge_auth=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let registry = Registry::builtin();
    let ctx = Context::new(Arc::new(cli::TerminalPrompter::default()), Arc::new(SystemBrowser));

    match cli.command {
        Commands::Login {
            target,
            provider,
            client_id,
            timeout,
            dry_run,
        } => {
            cli::run_login(
                &registry,
                ctx,
                cli::LoginOptions {
                    input: &target,
                    provider: &provider,
                    client_id: client_id.as_deref(),
                    timeout: Duration::from_secs(timeout),
                    dry_run,
                },
            )
            .await?;
        }
        Commands::Validate {
            target,
            provider,
            timeout,
        } => {
            cli::run_validate(&registry, ctx, &target, &provider, Duration::from_secs(timeout)).await?;
        }
        Commands::Detect { host } => {
            cli::run_detect(&registry, &ctx, &host).await;
        }
        Commands::Providers => cli::run_providers(&registry),
    }

    Ok(())
}
