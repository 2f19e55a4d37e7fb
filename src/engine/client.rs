use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::EngineSettings;
use crate::errors::{ScanError, TransportError};

/// Thin HTTP wrapper around the relay. Every remote call goes through
/// `get_json`, which is the single place low-level outcomes are turned into
/// a `TransportError`.
#[derive(Debug, Clone)]
pub struct EngineClient {
    client: Client,
    base_url: String,
    path_prefix: String,
    default_timeout: Duration,
}

impl EngineClient {
    pub fn new(settings: &EngineSettings) -> Result<Self, ScanError> {
        let client = Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(|e| ScanError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: settings.relay_url.trim_end_matches('/').to_string(),
            path_prefix: settings.path_prefix.trim_end_matches('/').to_string(),
            default_timeout: settings.request_timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for an engine path such as `/JSON/core/view/version/`.
    pub fn endpoint(&self, path: &str) -> String {
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };
        if path.starts_with(&format!("{}/", self.path_prefix)) && !self.path_prefix.is_empty() {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}{}{}", self.base_url, self.path_prefix, path)
        }
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
        timeout: Option<Duration>,
    ) -> Result<T, TransportError> {
        let url = self.endpoint(path);
        debug!(url = %url, params = params.len(), "Engine request");

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .query(params)
            .timeout(timeout.unwrap_or(self.default_timeout))
            .send()
            .await
            .map_err(from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!(url = %url, status = status.as_u16(), "Engine returned error status");
            return Err(TransportError::Status { status: status.as_u16(), body });
        }

        let bytes = response.bytes().await.map_err(from_reqwest)?;
        serde_json::from_slice(&bytes)
            .map_err(|e| TransportError::Other(format!("Malformed engine response: {}", e)))
    }
}

fn from_reqwest(err: reqwest::Error) -> TransportError {
    if err.is_connect() || err.is_timeout() || err.is_request() {
        TransportError::NoResponse(err.to_string())
    } else {
        TransportError::Other(err.to_string())
    }
}
