//! External identity lookup: external id → avatar URL.
//!
//! Resolution never fails: anything short of a well-formed lookup body yields
//! the fallback URL built from the external id alone, so the display layer
//! always has something to try.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::IdentityConfig;

/// Seam between the enrichment pipeline and the lookup service.
pub trait AvatarResolver: Send + Sync + 'static {
    fn resolve(&self, external_id: &str) -> impl Future<Output = String> + Send;
}

/// Body returned by the lookup service. Ids occasionally arrive as numbers.
#[derive(Debug, Deserialize)]
struct LookupBody {
    id: Option<serde_json::Value>,
    avatar: Option<String>,
}

fn text_field(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[derive(Clone)]
pub struct HttpAvatarResolver {
    client: Client,
    lookup_url: String,
    avatar_url: String,
    fallback_url: String,
    timeout: Duration,
}

impl HttpAvatarResolver {
    pub fn new(config: &IdentityConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(client: Client, config: &IdentityConfig) -> Self {
        Self {
            client,
            lookup_url: config.lookup_url.clone(),
            avatar_url: config.avatar_url.clone(),
            fallback_url: config.fallback_url.clone(),
            timeout: config.timeout(),
        }
    }

    /// Override the lookup timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn fallback(&self, external_id: &str) -> String {
        self.fallback_url.replace("{id}", external_id)
    }

    async fn lookup(&self, external_id: &str) -> anyhow::Result<String> {
        let url = self
            .lookup_url
            .replace("{id}", &urlencoding::encode(external_id));
        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("lookup returned status: {}", response.status());
        }

        let body: LookupBody = response.json().await?;
        match (body.id.as_ref().and_then(text_field), body.avatar) {
            (Some(id), Some(avatar)) if !avatar.is_empty() => Ok(self
                .avatar_url
                .replace("{id}", &id)
                .replace("{avatar}", &avatar)),
            _ => anyhow::bail!("lookup body missing id or avatar"),
        }
    }
}

impl AvatarResolver for HttpAvatarResolver {
    async fn resolve(&self, external_id: &str) -> String {
        match self.lookup(external_id).await {
            Ok(url) => url,
            Err(e) => {
                debug!("[identity] {} falling back: {}", external_id, e);
                self.fallback(external_id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_lookup_falls_back() {
        let config = IdentityConfig {
            // Port 9 (discard) on loopback refuses connections.
            lookup_url: "http://127.0.0.1:9/a.php?user_id={id}".into(),
            timeout_secs: 1,
            ..IdentityConfig::default()
        };
        let resolver = HttpAvatarResolver::new(&config);
        assert_eq!(
            resolver.resolve("55").await,
            "https://cdn.discordapp.com/avatars/55/avatar.png"
        );
    }

    #[test]
    fn test_fallback_template() {
        let resolver = HttpAvatarResolver::new(&IdentityConfig::default());
        assert_eq!(
            resolver.fallback("1234"),
            "https://cdn.discordapp.com/avatars/1234/avatar.png"
        );
    }
}
