use async_trait::async_trait;
use crate::errors::TransportError;
use super::schema::{ActiveScanRequest, AlertQuery, RawAlert};

/// Typed view of the remote scanning engine's API.
#[async_trait]
pub trait EngineApi: Send + Sync {
    /// Lightweight version/info read used as the connectivity probe
    async fn version(&self) -> Result<String, TransportError>;

    async fn start_spider(&self, url: &str) -> Result<String, TransportError>;

    /// Spider progress, 0..=100
    async fn spider_status(&self, scan_id: &str) -> Result<u8, TransportError>;

    /// Ask the engine to fetch `url` so it lands in the engine's site tree
    async fn access_url(&self, url: &str) -> Result<(), TransportError>;

    async fn list_contexts(&self) -> Result<Vec<String>, TransportError>;

    /// Create a context; returns its id when the engine reports one
    async fn new_context(&self, name: &str) -> Result<Option<String>, TransportError>;

    async fn include_in_context(&self, name: &str, regex: &str) -> Result<(), TransportError>;

    async fn context_id(&self, name: &str) -> Result<Option<String>, TransportError>;

    async fn start_active_scan(&self, request: &ActiveScanRequest) -> Result<String, TransportError>;

    /// Active-scan progress, 0..=100
    async fn active_scan_status(&self, scan_id: &str) -> Result<u8, TransportError>;

    async fn stop_active_scan(&self, scan_id: &str) -> Result<(), TransportError>;

    async fn alerts(&self, query: &AlertQuery) -> Result<Vec<RawAlert>, TransportError>;

    /// Where requests go, for diagnostics
    fn endpoint(&self) -> &str;
}
