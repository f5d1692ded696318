//! Common test utilities for forge-auth tests

use assert_cmd::Command;

/// The binary with a clean environment for client IDs and logging
pub fn forge_auth() -> Command {
    let mut cmd = Command::cargo_bin("forge-auth").expect("binary builds");
    cmd.env_remove("GITHUB_CLIENT_ID")
        .env_remove("GITLAB_CLIENT_ID")
        .env_remove("RUST_LOG");
    cmd
}
