use std::path::Path;
use std::time::Duration;
use serde::Deserialize;
use anyhow::{Context, Result};
use shared::protocol::{DEFAULT_LIST_PATH, DEFAULT_POLL_MS, DEFAULT_REFRESH_MS};
use shared::types::ProtoRange;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    /// Base URL that relative asset and list paths are resolved against
    pub root: String,
    #[serde(default = "default_list")]
    pub list: String,
    /// Defaults to `root`
    #[serde(default)]
    pub list_root: Option<String>,
    /// Overrides `list_root + list` when set
    #[serde(default)]
    pub list_url: Option<String>,
    #[serde(default)]
    pub no_refresh: bool,
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_ms: u64,
}

/// Entry of the bootstrap sequence as written in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", content = "url", rename_all = "lowercase")]
pub enum ResourceEntry {
    Script(String),
    Style(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapConfig {
    #[serde(default = "default_resources")]
    pub resources: Vec<ResourceEntry>,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    #[serde(default)]
    pub ui_library: UiLibraryConfig,
}

/// The UI helper library the page needs, and where to get it when the
/// bootstrap sequence did not provide it.
#[derive(Debug, Clone, Deserialize)]
pub struct UiLibraryConfig {
    #[serde(default = "default_ui_library_name")]
    pub name: String,
    #[serde(default = "default_ui_library_fallback")]
    pub fallback_url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub proto_range: Option<ProtoRange>,
    #[serde(default)]
    pub min_clients: Option<u32>,
    #[serde(default)]
    pub limit: Option<usize>,
    /// Choices offered by the protocol control on the page
    #[serde(default)]
    pub proto_ranges: Vec<ProtoRangeChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProtoRangeChoice {
    pub label: String,
    pub range: ProtoRange,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
}

fn default_list() -> String {
    DEFAULT_LIST_PATH.to_string()
}

fn default_refresh_interval() -> u64 {
    DEFAULT_REFRESH_MS
}

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_MS
}

fn default_resources() -> Vec<ResourceEntry> {
    vec![
        ResourceEntry::Style("style.css".to_string()),
        ResourceEntry::Script("servers.js".to_string()),
    ]
}

fn default_ui_library_name() -> String {
    "jquery".to_string()
}

fn default_ui_library_fallback() -> String {
    "https://ajax.googleapis.com/ajax/libs/jquery/3.7.1/jquery.min.js".to_string()
}

fn default_listen() -> String {
    "[::]:8080".to_string()
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            resources: default_resources(),
            poll_interval_ms: default_poll_interval(),
            ui_library: UiLibraryConfig::default(),
        }
    }
}

impl Default for UiLibraryConfig {
    fn default() -> Self {
        Self {
            name: default_ui_library_name(),
            fallback_url: default_ui_library_fallback(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

impl DashboardConfig {
    /// The list endpoint: `list_url`, else `list_root + list`, else `root + list`.
    pub fn list_url(&self) -> String {
        if let Some(url) = &self.list_url {
            return url.clone();
        }
        let list_root = self.list_root.as_deref().unwrap_or(&self.root);
        format!("{}{}", list_root, self.list)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }
}

impl BootstrapConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Resolve a possibly relative asset URL against the dashboard root.
/// Protocol-relative URLs get an `https:` scheme.
pub fn resolve_url(root: &str, url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else if let Some(rest) = url.strip_prefix("//") {
        format!("https://{}", rest)
    } else {
        format!("{}{}", root, url)
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config = Self::parse(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.dashboard.root.is_empty() && self.dashboard.list_url.is_none() {
            anyhow::bail!("dashboard.root cannot be empty unless dashboard.list_url is set");
        }
        if self.bootstrap.poll_interval_ms == 0 {
            anyhow::bail!("bootstrap.poll_interval_ms must be greater than 0");
        }
        if !self.dashboard.no_refresh && self.dashboard.refresh_interval_ms == 0 {
            anyhow::bail!("dashboard.refresh_interval_ms must be greater than 0");
        }
        for choice in &self.filter.proto_ranges {
            if choice.range.low > choice.range.high {
                anyhow::bail!("proto range '{}' has low > high", choice.label);
            }
        }
        Ok(())
    }
}
