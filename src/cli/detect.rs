//! Detect and providers commands

use anstream::println;
use forge_auth::{Context, Registry, detect};

/// Print the provider name detected for `host`
pub async fn run_detect(registry: &Registry, ctx: &Context, host: &str) {
    let provider = detect(registry, ctx, host.trim(), None).await;
    println!("{}", provider.name());
}

/// Print every registered provider with its default host
pub fn run_providers(registry: &Registry) {
    for name in registry.list() {
        let default_host = registry
            .registration(name)
            .and_then(|r| r.default_host.as_deref())
            .unwrap_or("-");
        println!("{name:<10} {default_host}");
    }
}
