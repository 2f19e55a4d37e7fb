use serde::{Deserialize, Serialize};

/// On-disk configuration. Every field is optional; unset values fall back to
/// environment variables and then to built-in defaults (see `settings`).
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct SitescanConfig {
    pub engine: Option<EngineConfig>,
    pub scan: Option<ScanConfig>,
    pub history: Option<HistoryConfig>,
    pub relay: Option<RelayConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct EngineConfig {
    /// Base URL of the relay in front of the scanning engine.
    pub relay_url: Option<String>,
    /// Path segment the relay expects in front of every engine path.
    pub path_prefix: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub status_timeout_secs: Option<u64>,
    pub probe_timeout_secs: Option<u64>,
    pub alerts_timeout_secs: Option<u64>,
    pub stop_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ScanConfig {
    pub poll_interval_ms: Option<u64>,
    pub spider_max_attempts: Option<u32>,
    pub quick_max_attempts: Option<u32>,
    pub full_max_attempts: Option<u32>,
    pub start_attempts: Option<u32>,
    pub start_backoff_ms: Option<u64>,
    pub alert_page_size: Option<u32>,
    pub scan_policy: Option<String>,
    pub threads_per_host: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct HistoryConfig {
    pub path: Option<String>,
    pub max_entries: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct RelayConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub engine_url: Option<String>,
    pub api_key: Option<String>,
}

/// Quick scans probe a single page; full scans crawl first and then scan
/// recursively.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    #[default]
    Quick,
    Full,
}

impl ScanMode {
    pub fn is_full(&self) -> bool {
        matches!(self, Self::Full)
    }

    /// Whether the active scan should follow links below the target.
    pub fn recurse(&self) -> bool {
        self.is_full()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Quick => "quick",
            Self::Full => "full",
        }
    }
}

impl std::fmt::Display for ScanMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
