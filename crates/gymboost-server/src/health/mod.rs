//! Third-party provider health checks.
//!
//! Each probe reports the reachability of an external dependency, never of
//! this server. Every outcome, including a missing key or a network failure,
//! folds into a [`HealthStatus`].

pub mod gemini;
pub mod resend;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::secrets::Secrets;
use crate::util::mask_id;

pub use gemini::Gemini;
pub use resend::Resend;

/// Used when a failed upstream reply carries no recognisable message.
pub const FALLBACK_MESSAGE: &str = "Unknown error";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Online,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<String>,
}

impl HealthStatus {
    pub fn online() -> Self {
        Self {
            status: Status::Online,
            debug: None,
        }
    }

    pub fn error(debug: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            debug: Some(debug.into()),
        }
    }
}

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("{0}")]
    Transport(reqwest::Error),
    #[error("{0}")]
    Decode(#[from] serde_json::Error),
}

impl From<reqwest::Error> for ProbeError {
    fn from(e: reqwest::Error) -> Self {
        // The AI provider takes its key as a query parameter; keep URLs out
        // of anything that reaches a response body or a log line.
        Self::Transport(e.without_url())
    }
}

/// An external service with a status or introspection endpoint.
pub trait Provider: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Environment variable holding the API key.
    fn key_var(&self) -> &'static str;

    /// The single outbound request, already authenticated with `key`.
    fn request(&self, client: &reqwest::Client, key: &str) -> reqwest::RequestBuilder;

    /// Pulls the human-readable message out of an error body.
    fn error_message(&self, body: &serde_json::Value) -> Option<String>;
}

/// Runs one health check against `provider`.
///
/// No request is made when the key is not configured.
pub async fn probe<P: Provider + ?Sized>(
    provider: &P,
    client: &reqwest::Client,
    secrets: &Secrets,
) -> HealthStatus {
    let Some(key) = secrets.get(provider.key_var()) else {
        warn!(
            provider = provider.name(),
            var = provider.key_var(),
            "provider key not configured"
        );
        return HealthStatus::error(format!("{} not configured", provider.key_var()));
    };

    debug!(
        provider = provider.name(),
        key = %mask_id(Some(key.as_str())),
        "probing provider"
    );

    match check(provider, client, &key).await {
        Ok(status) => {
            debug!(provider = provider.name(), status = ?status.status, "probe finished");
            status
        }
        Err(e) => {
            warn!(provider = provider.name(), error = %e, "probe failed");
            HealthStatus::error(e.to_string())
        }
    }
}

async fn check<P: Provider + ?Sized>(
    provider: &P,
    client: &reqwest::Client,
    key: &str,
) -> Result<HealthStatus, ProbeError> {
    let resp = provider.request(client, key).send().await?;
    if resp.status().is_success() {
        return Ok(HealthStatus::online());
    }

    let status = resp.status();
    let body = resp.bytes().await?;
    let json: serde_json::Value = serde_json::from_slice(&body)?;
    let message = provider
        .error_message(&json)
        .unwrap_or_else(|| FALLBACK_MESSAGE.to_owned());

    debug!(provider = provider.name(), %status, %message, "provider reported an error");
    Ok(HealthStatus::error(message))
}
