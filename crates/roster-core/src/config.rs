use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::platform;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub acquisition: AcquisitionConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

/// One way of reaching the roster endpoint. Routes are tried in list order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Route {
    /// Request the target URL as-is.
    Direct,
    /// Wrap the target URL in a relay template.
    /// `{url}` is replaced with the percent-encoded target, `{raw}` with the
    /// target verbatim.
    Relay { name: String, template: String },
}

impl Route {
    pub fn relay(name: impl Into<String>, template: impl Into<String>) -> Self {
        Self::Relay {
            name: name.into(),
            template: template.into(),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Direct => "direct",
            Self::Relay { name, .. } => name,
        }
    }

    /// The URL actually requested when going through this route.
    pub fn wrap(&self, target: &str) -> String {
        match self {
            Self::Direct => target.to_string(),
            Self::Relay { template, .. } => template
                .replace("{url}", &urlencoding::encode(target))
                .replace("{raw}", target),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquisitionConfig {
    /// Server descriptor endpoint; `ip_address` and `port` are appended as
    /// query parameters.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_route_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_routes")]
    pub routes: Vec<Route>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Lookup service, `{id}` is the external id.
    #[serde(default = "default_lookup_url")]
    pub lookup_url: String,
    /// Canonical avatar, `{id}` and `{avatar}` come from the lookup body.
    #[serde(default = "default_avatar_url")]
    pub avatar_url: String,
    /// Used when the lookup fails; only `{id}` is available.
    #[serde(default = "default_fallback_url")]
    pub fallback_url: String,
    #[serde(default = "default_lookup_timeout_secs")]
    pub timeout_secs: u64,
    /// Identifier tags that carry an external id, checked in order.
    #[serde(default = "default_prefixes")]
    pub prefixes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_batch_pause_ms")]
    pub batch_pause_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_port")]
    pub default_port: u16,
}

impl AcquisitionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl IdentityConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl EnrichmentConfig {
    pub fn batch_pause(&self) -> Duration {
        Duration::from_millis(self.batch_pause_ms)
    }
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_secs: default_route_timeout_secs(),
            routes: default_routes(),
        }
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            lookup_url: default_lookup_url(),
            avatar_url: default_avatar_url(),
            fallback_url: default_fallback_url(),
            timeout_secs: default_lookup_timeout_secs(),
            prefixes: default_prefixes(),
        }
    }
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            batch_pause_ms: default_batch_pause_ms(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_port: default_port(),
        }
    }
}

fn default_endpoint() -> String {
    "https://itools.zone/fivem/".to_string()
}

fn default_route_timeout_secs() -> u64 {
    10
}

fn default_routes() -> Vec<Route> {
    vec![
        Route::Direct,
        Route::relay("allorigins", "https://api.allorigins.win/raw?url={url}"),
        Route::relay("codetabs", "https://api.codetabs.com/v1/proxy?quest={url}"),
    ]
}

fn default_lookup_url() -> String {
    "https://itools.zone/fivem/a.php?user_id={id}".to_string()
}

fn default_avatar_url() -> String {
    "https://cdn.discordapp.com/avatars/{id}/{avatar}.png".to_string()
}

fn default_fallback_url() -> String {
    "https://cdn.discordapp.com/avatars/{id}/avatar.png".to_string()
}

fn default_lookup_timeout_secs() -> u64 {
    5
}

fn default_prefixes() -> Vec<String> {
    vec!["discord:".to_string()]
}

fn default_batch_size() -> usize {
    5
}

fn default_batch_pause_ms() -> u64 {
    100
}

fn default_port() -> u16 {
    30120
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(&config_path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }
}
