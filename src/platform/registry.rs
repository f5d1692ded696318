//! Provider registry
//!
//! Maps provider names to constructors and detectors. Built once at startup
//! with [`Registry::builtin`] and passed by reference afterwards.

use crate::platform::{
    ForgejoProvider, GiteaFamilyDetector, GiteaProvider, GitHubDetector, GitHubProvider,
    GitLabDetector, GitLabProvider, Detector, Provider,
};
use crate::types::ProviderConfig;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Builds a provider bound to `config.host`
pub type Constructor = fn(ProviderConfig) -> Box<dyn Provider>;

/// Names tried first, most common services first
const DETECTION_PRIORITY: &[&str] = &["github", "gitlab", "gitea", "forgejo"];

/// How to construct and detect one provider kind
#[derive(Clone)]
pub struct Registration {
    /// Provider constructor
    pub constructor: Constructor,
    /// Host detector; `None` for providers that are only reachable by name
    pub detector: Option<Arc<dyn Detector>>,
    /// Host used when the caller gives none
    pub default_host: Option<String>,
    /// Alternate name for another entry; never detected on its own
    pub alias: bool,
}

impl Registration {
    /// Registration with only a constructor: not detectable, no default host
    pub fn new(constructor: Constructor) -> Self {
        Self {
            constructor,
            detector: None,
            default_host: None,
            alias: false,
        }
    }

    /// Make the provider a detection candidate
    #[must_use]
    pub fn with_detector(mut self, detector: Arc<dyn Detector>) -> Self {
        self.detector = Some(detector);
        self
    }

    /// Host used when the provider is requested by name
    #[must_use]
    pub fn with_default_host(mut self, host: &str) -> Self {
        self.default_host = Some(host.to_string());
        self
    }

    /// Mark as a shortcut for another entry, skipped during detection
    #[must_use]
    pub const fn as_alias(mut self) -> Self {
        self.alias = true;
        self
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("detector", &self.detector.is_some())
            .field("default_host", &self.default_host)
            .field("alias", &self.alias)
            .finish_non_exhaustive()
    }
}

/// Name to registration table
#[derive(Debug, Default, Clone)]
pub struct Registry {
    entries: BTreeMap<String, Registration>,
}

impl Registry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in provider
    pub fn builtin() -> Self {
        let gitea_family: Arc<dyn Detector> = Arc::new(GiteaFamilyDetector);
        let mut registry = Self::new();

        registry.register(
            "github",
            Registration::new(|c| Box::new(GitHubProvider::new(c)))
                .with_detector(Arc::new(GitHubDetector))
                .with_default_host("github.com"),
        );
        registry.register(
            "gitlab",
            Registration::new(|c| Box::new(GitLabProvider::new(c)))
                .with_detector(Arc::new(GitLabDetector))
                .with_default_host("gitlab.com"),
        );
        registry.register(
            "gitea",
            Registration::new(|c| Box::new(GiteaProvider::new(c)))
                .with_detector(Arc::clone(&gitea_family))
                .with_default_host("gitea.com"),
        );
        registry.register(
            "forgejo",
            Registration::new(|c| Box::new(ForgejoProvider::new(c)))
                .with_detector(Arc::clone(&gitea_family)),
        );
        registry.register(
            "codeberg",
            Registration::new(|c| Box::new(ForgejoProvider::codeberg(c)))
                .with_detector(gitea_family)
                .with_default_host("codeberg.org")
                .as_alias(),
        );

        registry
    }

    /// Insert or replace the entry for `name`
    pub fn register(&mut self, name: &str, registration: Registration) {
        self.entries.insert(name.to_string(), registration);
    }

    /// Registration for `name`
    pub fn registration(&self, name: &str) -> Option<&Registration> {
        self.entries.get(name)
    }

    /// Whether `name` is registered
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Construct `name` bound to its default host
    pub fn get(&self, name: &str) -> Option<Box<dyn Provider>> {
        self.get_with_config(name, ProviderConfig::default())
    }

    /// Construct `name` from `config`, filling an empty host with the default
    pub fn get_with_config(&self, name: &str, mut config: ProviderConfig) -> Option<Box<dyn Provider>> {
        let registration = self.entries.get(name)?;
        if config.host.is_empty()
            && let Some(default_host) = &registration.default_host
        {
            config.host.clone_from(default_host);
        }
        Some((registration.constructor)(config))
    }

    /// All registered names, sorted
    pub fn list(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    /// Names to try during detection, in order
    ///
    /// Priority names come first, then the rest alphabetically. Aliases and
    /// entries whose detector is already scheduled under another name are
    /// left out so each detector runs at most once per host.
    pub fn list_for_detection(&self) -> Vec<&str> {
        let rest = self
            .entries
            .keys()
            .map(String::as_str)
            .filter(|name| !DETECTION_PRIORITY.contains(name));
        let candidates = DETECTION_PRIORITY
            .iter()
            .copied()
            .filter(|name| self.entries.contains_key(*name))
            .chain(rest);

        let mut scheduled: Vec<&Arc<dyn Detector>> = Vec::new();
        let mut names = Vec::new();
        for name in candidates {
            let Some(registration) = self.entries.get(name) else {
                continue;
            };
            if registration.alias {
                continue;
            }
            if let Some(detector) = &registration.detector {
                if scheduled.iter().any(|seen| Arc::ptr_eq(seen, detector)) {
                    continue;
                }
                scheduled.push(detector);
            }
            names.push(name);
        }
        names
    }
}
