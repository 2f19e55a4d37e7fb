use std::path::Path;
use crate::errors::ScanError;
use super::types::SitescanConfig;
use tracing::warn;

const MAX_CONFIG_BYTES: u64 = 1_048_576;

pub async fn parse_config(path: &Path) -> Result<SitescanConfig, ScanError> {
    if !path.exists() {
        return Err(ScanError::Config(format!("Config file not found: {}", path.display())));
    }

    let metadata = tokio::fs::metadata(path).await?;
    if metadata.len() > MAX_CONFIG_BYTES {
        return Err(ScanError::Config("Config file exceeds 1MB limit".into()));
    }

    let content = tokio::fs::read_to_string(path).await?;
    parse_config_str(&content)
}

pub fn parse_config_str(content: &str) -> Result<SitescanConfig, ScanError> {
    // An empty document deserializes to unit, not to an empty mapping
    if content.trim().is_empty() {
        return Ok(SitescanConfig::default());
    }
    let config: SitescanConfig = serde_yaml::from_str(content)?;
    validate_settings(&config)?;
    Ok(config)
}

/// Reject values that would make a scan hang or misbehave.
fn validate_settings(config: &SitescanConfig) -> Result<(), ScanError> {
    if let Some(engine) = &config.engine {
        if let Some(relay_url) = &engine.relay_url {
            if relay_url.trim().is_empty() {
                return Err(ScanError::Config("engine.relay_url must not be empty".into()));
            }
            url::Url::parse(relay_url)
                .map_err(|e| ScanError::Config(format!("engine.relay_url is not a valid URL: {}", e)))?;
        }
        if let Some(prefix) = &engine.path_prefix {
            if !prefix.is_empty() && !prefix.starts_with('/') {
                return Err(ScanError::Config(format!(
                    "engine.path_prefix must start with '/': {}",
                    prefix
                )));
            }
        }
        let timeouts = [
            ("request_timeout_secs", engine.request_timeout_secs),
            ("status_timeout_secs", engine.status_timeout_secs),
            ("probe_timeout_secs", engine.probe_timeout_secs),
            ("alerts_timeout_secs", engine.alerts_timeout_secs),
            ("stop_timeout_secs", engine.stop_timeout_secs),
        ];
        for (name, value) in timeouts {
            if value == Some(0) {
                return Err(ScanError::Config(format!("engine.{} must be greater than zero", name)));
            }
        }
    }

    if let Some(scan) = &config.scan {
        if scan.poll_interval_ms == Some(0) {
            return Err(ScanError::Config("scan.poll_interval_ms must be greater than zero".into()));
        }
        if scan.start_attempts == Some(0) {
            return Err(ScanError::Config("scan.start_attempts must be at least 1".into()));
        }
        if scan.alert_page_size == Some(0) {
            return Err(ScanError::Config("scan.alert_page_size must be greater than zero".into()));
        }
        if scan.quick_max_attempts == Some(0) || scan.full_max_attempts == Some(0) {
            warn!("Active scan attempt ceiling of 0 disables the scan timeout");
        }
    }

    if let Some(history) = &config.history {
        if history.max_entries == Some(0) {
            return Err(ScanError::Config("history.max_entries must be at least 1".into()));
        }
    }

    if let Some(relay) = &config.relay {
        if let Some(engine_url) = &relay.engine_url {
            url::Url::parse(engine_url)
                .map_err(|e| ScanError::Config(format!("relay.engine_url is not a valid URL: {}", e)))?;
        }
        if relay.api_key.as_deref().is_some_and(str::is_empty) {
            warn!("relay.api_key is empty; requests will be forwarded without a key");
        }
    }

    Ok(())
}
