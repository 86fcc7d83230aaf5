//! Error types for roster acquisition.

use thiserror::Error;

/// Why a single route attempt did not produce a usable response.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RouteError {
    #[error("timed out")]
    Timeout,

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("network error: {0}")]
    Network(String),
}

impl From<reqwest::Error> for RouteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if let Some(status) = e.status() {
            Self::Status(status.as_u16())
        } else {
            Self::Network(e.to_string())
        }
    }
}

/// Failure of one `fetch_roster` call. Surfaced to the operator as a single
/// notification; never fatal.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AcquisitionError {
    /// Every configured route failed; carries the last route's error.
    #[error("all routes failed (last: {last_error})")]
    AllRoutesFailed { last_error: RouteError },

    /// The server answered with an explicit `error` field.
    #[error("remote reported error: {detail}")]
    RemoteError { detail: String },

    /// Success status, but the body is not a roster document.
    #[error("invalid response shape: {detail}")]
    InvalidShape { detail: String },

    /// Host or port unusable before any request was made.
    #[error("invalid target: {0}")]
    InvalidTarget(String),
}

impl AcquisitionError {
    /// Stable reason string, independent of detail text.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::AllRoutesFailed { .. } => "all routes failed",
            Self::RemoteError { .. } => "remote reported error",
            Self::InvalidShape { .. } => "invalid response shape",
            Self::InvalidTarget(_) => "invalid target",
        }
    }
}
