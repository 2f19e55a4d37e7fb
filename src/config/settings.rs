//! Resolved runtime settings: file values, then environment, then defaults.

use std::path::PathBuf;
use std::time::Duration;

use crate::errors::ScanError;
use super::types::{EngineConfig, HistoryConfig, RelayConfig, ScanConfig, ScanMode};

pub const DEFAULT_RELAY_URL: &str = "http://localhost:3001";
pub const DEFAULT_ENGINE_URL: &str = "http://localhost:8090";
pub const DEFAULT_PATH_PREFIX: &str = "/zap";

/// How the transport client reaches the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    pub relay_url: String,
    pub path_prefix: String,
    pub request_timeout: Duration,
    pub status_timeout: Duration,
    pub probe_timeout: Duration,
    pub alerts_timeout: Duration,
    pub stop_timeout: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            relay_url: DEFAULT_RELAY_URL.to_string(),
            path_prefix: DEFAULT_PATH_PREFIX.to_string(),
            request_timeout: Duration::from_secs(30),
            status_timeout: Duration::from_secs(5),
            probe_timeout: Duration::from_secs(10),
            alerts_timeout: Duration::from_secs(15),
            stop_timeout: Duration::from_secs(3),
        }
    }
}

impl EngineSettings {
    /// CLI override > config file > `SITESCAN_RELAY_URL` > default.
    pub fn resolve(file: Option<&EngineConfig>, relay_override: Option<&str>) -> Result<Self, ScanError> {
        let defaults = Self::default();
        let file = file.cloned().unwrap_or_default();

        let relay_url = relay_override
            .map(str::to_string)
            .or(file.relay_url)
            .or_else(|| std::env::var("SITESCAN_RELAY_URL").ok())
            .unwrap_or(defaults.relay_url);
        url::Url::parse(&relay_url)
            .map_err(|e| ScanError::Config(format!("Invalid relay URL '{}': {}", relay_url, e)))?;

        let secs = |value: Option<u64>, fallback: Duration| value.map(Duration::from_secs).unwrap_or(fallback);

        Ok(Self {
            relay_url,
            path_prefix: file.path_prefix.unwrap_or(defaults.path_prefix),
            request_timeout: secs(file.request_timeout_secs, defaults.request_timeout),
            status_timeout: secs(file.status_timeout_secs, defaults.status_timeout),
            probe_timeout: secs(file.probe_timeout_secs, defaults.probe_timeout),
            alerts_timeout: secs(file.alerts_timeout_secs, defaults.alerts_timeout),
            stop_timeout: secs(file.stop_timeout_secs, defaults.stop_timeout),
        })
    }
}

/// Phase budgets. Phase timeouts are attempt counts; the wall-clock bound is
/// roughly `attempts * poll_interval`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanSettings {
    pub poll_interval: Duration,
    pub spider_max_attempts: u32,
    pub quick_max_attempts: u32,
    pub full_max_attempts: u32,
    pub start_attempts: u32,
    pub start_backoff: Duration,
    pub alert_page_size: u32,
    pub scan_policy: String,
    pub threads_per_host: u32,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            spider_max_attempts: 30,
            quick_max_attempts: 60,
            full_max_attempts: 300,
            start_attempts: 3,
            start_backoff: Duration::from_secs(2),
            alert_page_size: 1000,
            scan_policy: "Default Policy".to_string(),
            threads_per_host: 2,
        }
    }
}

impl ScanSettings {
    pub fn from_config(file: Option<&ScanConfig>) -> Self {
        let defaults = Self::default();
        let Some(file) = file else {
            return defaults;
        };
        Self {
            poll_interval: file.poll_interval_ms.map(Duration::from_millis).unwrap_or(defaults.poll_interval),
            spider_max_attempts: file.spider_max_attempts.unwrap_or(defaults.spider_max_attempts),
            quick_max_attempts: file.quick_max_attempts.unwrap_or(defaults.quick_max_attempts),
            full_max_attempts: file.full_max_attempts.unwrap_or(defaults.full_max_attempts),
            start_attempts: file.start_attempts.unwrap_or(defaults.start_attempts),
            start_backoff: file.start_backoff_ms.map(Duration::from_millis).unwrap_or(defaults.start_backoff),
            alert_page_size: file.alert_page_size.unwrap_or(defaults.alert_page_size),
            scan_policy: file.scan_policy.clone().unwrap_or(defaults.scan_policy),
            threads_per_host: file.threads_per_host.unwrap_or(defaults.threads_per_host),
        }
    }

    /// Attempt ceiling for the active-scan poll.
    pub fn active_max_attempts(&self, mode: ScanMode) -> u32 {
        match mode {
            ScanMode::Quick => self.quick_max_attempts,
            ScanMode::Full => self.full_max_attempts,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistorySettings {
    pub path: PathBuf,
    pub max_entries: usize,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data/history.db"),
            max_entries: 100,
        }
    }
}

impl HistorySettings {
    pub fn from_config(file: Option<&HistoryConfig>) -> Self {
        let defaults = Self::default();
        let Some(file) = file else {
            return defaults;
        };
        Self {
            path: file.path.as_ref().map(PathBuf::from).unwrap_or(defaults.path),
            max_entries: file.max_entries.unwrap_or(defaults.max_entries),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelaySettings {
    pub host: String,
    pub port: u16,
    pub engine_url: String,
    pub api_key: Option<String>,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
            engine_url: DEFAULT_ENGINE_URL.to_string(),
            api_key: None,
        }
    }
}

impl RelaySettings {
    /// Config file > `ZAP_API_URL` / `ZAP_API_KEY` / `PORT` > default.
    pub fn resolve(file: Option<&RelayConfig>) -> Result<Self, ScanError> {
        let defaults = Self::default();
        let file = file.cloned().unwrap_or_default();

        let engine_url = file
            .engine_url
            .or_else(|| std::env::var("ZAP_API_URL").ok())
            .unwrap_or(defaults.engine_url);
        url::Url::parse(&engine_url)
            .map_err(|e| ScanError::Config(format!("Invalid engine URL '{}': {}", engine_url, e)))?;

        let port = match file.port {
            Some(port) => port,
            None => match std::env::var("PORT") {
                Ok(raw) => raw
                    .parse()
                    .map_err(|_| ScanError::Config(format!("Invalid PORT value: {}", raw)))?,
                Err(_) => defaults.port,
            },
        };

        Ok(Self {
            host: file.host.unwrap_or(defaults.host),
            port,
            engine_url,
            api_key: file
                .api_key
                .or_else(|| std::env::var("ZAP_API_KEY").ok())
                .filter(|key| !key.is_empty()),
        })
    }
}
