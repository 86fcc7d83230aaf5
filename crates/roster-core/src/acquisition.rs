//! Roster acquisition: one snapshot per call, through an ordered route list.
//!
//! Each route gets exactly one timeout-bounded attempt. The first route that
//! answers with a success status wins and no further routes are tried, even if
//! its body later fails validation. Nothing is cached between calls.

use std::collections::HashSet;
use std::time::Duration;

use reqwest::{Client, Url};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::{AcquisitionConfig, Route};
use crate::error::{AcquisitionError, RouteError};
use crate::model::{Player, RosterSnapshot};

#[derive(Clone)]
pub struct RosterClient {
    client: Client,
    endpoint: String,
    routes: Vec<Route>,
    timeout: Duration,
}

impl RosterClient {
    pub fn new(config: &AcquisitionConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(client: Client, config: &AcquisitionConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
            routes: config.routes.clone(),
            timeout: config.timeout(),
        }
    }

    /// Override the per-route timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// The descriptor URL for `host:port`, before any route wraps it.
    pub fn target_url(&self, host: &str, port: u16) -> Result<String, AcquisitionError> {
        let host = host.trim();
        if host.is_empty() {
            return Err(AcquisitionError::InvalidTarget("host is empty".into()));
        }
        let url = Url::parse_with_params(
            &self.endpoint,
            &[("ip_address", host), ("port", &port.to_string())],
        )
        .map_err(|e| AcquisitionError::InvalidTarget(format!("bad endpoint: {}", e)))?;
        Ok(url.to_string())
    }

    pub async fn fetch_roster(
        &self,
        host: &str,
        port: u16,
    ) -> Result<RosterSnapshot, AcquisitionError> {
        let target = self.target_url(host, port)?;
        info!("[acquire] {}:{} via {} route(s)", host.trim(), port, self.routes.len());

        let mut last_error = RouteError::Network("no routes configured".into());
        for route in &self.routes {
            match self.attempt(route, &target).await {
                Ok(body) => {
                    info!("[acquire] route {} answered ({} bytes)", route.label(), body.len());
                    return parse_roster_body(&body);
                }
                Err(e) => {
                    warn!("[acquire] route {} failed: {}", route.label(), e);
                    last_error = e;
                }
            }
        }

        Err(AcquisitionError::AllRoutesFailed { last_error })
    }

    async fn attempt(&self, route: &Route, target: &str) -> Result<String, RouteError> {
        let url = route.wrap(target);
        debug!("[acquire] GET {} ({})", url, route.label());

        // The request timeout covers connect, headers and the full body read.
        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RouteError::Status(status.as_u16()));
        }

        Ok(response.text().await?)
    }
}

/// Validate a success body and turn it into a snapshot.
///
/// A `players` array wins; otherwise an `error` field is reported as a remote
/// error; anything else is an invalid shape. Duplicate player ids are rejected
/// rather than silently collapsed.
pub fn parse_roster_body(body: &str) -> Result<RosterSnapshot, AcquisitionError> {
    let doc: Value = serde_json::from_str(body).map_err(|e| AcquisitionError::InvalidShape {
        detail: format!("not JSON: {}", e),
    })?;

    let Some(obj) = doc.as_object() else {
        return Err(AcquisitionError::InvalidShape {
            detail: "top level is not an object".into(),
        });
    };

    match obj.get("players") {
        Some(Value::Array(entries)) => {
            let players: Vec<Player> = entries
                .iter()
                .cloned()
                .map(serde_json::from_value)
                .collect::<Result<_, _>>()
                .map_err(|e| AcquisitionError::InvalidShape {
                    detail: format!("bad player entry: {}", e),
                })?;

            let mut seen = HashSet::with_capacity(players.len());
            if let Some(dup) = players.iter().find(|p| !seen.insert(p.id)) {
                return Err(AcquisitionError::InvalidShape {
                    detail: format!("duplicate player id {}", dup.id),
                });
            }

            let dynamic_info = obj
                .get("dynamic")
                .or_else(|| obj.get("dynamicInfo"))
                .cloned()
                .unwrap_or(Value::Null);

            Ok(RosterSnapshot {
                dynamic_info,
                players,
            })
        }
        _ => match obj.get("error") {
            Some(err) => Err(AcquisitionError::RemoteError {
                detail: err
                    .as_str()
                    .map(str::to_string)
                    .unwrap_or_else(|| err.to_string()),
            }),
            None => Err(AcquisitionError::InvalidShape {
                detail: "missing players array".into(),
            }),
        },
    }
}
