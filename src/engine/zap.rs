use async_trait::async_trait;
use tracing::{debug, info};

use crate::config::EngineSettings;
use crate::errors::{ScanError, TransportError};
use super::client::EngineClient;
use super::provider::EngineApi;
use super::schema::*;

/// `EngineApi` over the engine's JSON API, reached through the relay.
#[derive(Debug, Clone)]
pub struct ZapEngine {
    client: EngineClient,
    settings: EngineSettings,
}

impl ZapEngine {
    pub fn new(settings: &EngineSettings) -> Result<Self, ScanError> {
        Ok(Self {
            client: EngineClient::new(settings)?,
            settings: settings.clone(),
        })
    }
}

#[async_trait]
impl EngineApi for ZapEngine {
    async fn version(&self) -> Result<String, TransportError> {
        let resp: VersionResponse = self
            .client
            .get_json("/JSON/core/view/version/", &[], Some(self.settings.probe_timeout))
            .await?;
        Ok(resp.version.unwrap_or_else(|| "unknown".to_string()))
    }

    async fn start_spider(&self, url: &str) -> Result<String, TransportError> {
        let resp: ScanStartResponse = self
            .client
            .get_json("/JSON/spider/action/scan/", &[("url", url.to_string())], None)
            .await?;
        let id = resp
            .scan_id()
            .ok_or_else(|| TransportError::Other("Invalid response from engine when starting spider scan".into()))?;
        info!(scan_id = %id, url = %url, "Spider scan started");
        Ok(id)
    }

    async fn spider_status(&self, scan_id: &str) -> Result<u8, TransportError> {
        let resp: StatusResponse = self
            .client
            .get_json(
                "/JSON/spider/view/status/",
                &[("scanId", scan_id.to_string())],
                Some(self.settings.status_timeout),
            )
            .await?;
        Ok(resp.progress())
    }

    async fn access_url(&self, url: &str) -> Result<(), TransportError> {
        let _: ActionResponse = self
            .client
            .get_json(
                "/JSON/core/action/accessUrl/",
                &[
                    ("url", url.to_string()),
                    ("followRedirects", "true".to_string()),
                    ("handleParameters", "IGNORE_VALUE".to_string()),
                ],
                Some(self.settings.alerts_timeout),
            )
            .await?;
        debug!(url = %url, "Target accessed through engine");
        Ok(())
    }

    async fn list_contexts(&self) -> Result<Vec<String>, TransportError> {
        let resp: ContextListResponse = self
            .client
            .get_json("/JSON/context/view/contextList/", &[], None)
            .await?;
        Ok(resp.context_list.map(|list| list.names()).unwrap_or_default())
    }

    async fn new_context(&self, name: &str) -> Result<Option<String>, TransportError> {
        let resp: NewContextResponse = self
            .client
            .get_json("/JSON/context/action/newContext/", &[("contextName", name.to_string())], None)
            .await?;
        Ok(resp.context_id.as_ref().and_then(value_to_string))
    }

    async fn include_in_context(&self, name: &str, regex: &str) -> Result<(), TransportError> {
        let _: ActionResponse = self
            .client
            .get_json(
                "/JSON/context/action/includeInContext/",
                &[("contextName", name.to_string()), ("regex", regex.to_string())],
                None,
            )
            .await?;
        Ok(())
    }

    async fn context_id(&self, name: &str) -> Result<Option<String>, TransportError> {
        let resp: ContextViewResponse = self
            .client
            .get_json("/JSON/context/view/context/", &[("contextName", name.to_string())], None)
            .await?;
        Ok(resp.context.and_then(|c| c.id).as_ref().and_then(value_to_string))
    }

    async fn start_active_scan(&self, request: &ActiveScanRequest) -> Result<String, TransportError> {
        let resp: ScanStartResponse = self
            .client
            .get_json("/JSON/ascan/action/scan/", &request.to_params(), Some(self.settings.request_timeout))
            .await?;
        let id = resp
            .scan_id()
            .ok_or_else(|| TransportError::Other("Invalid response from engine when starting active scan".into()))?;
        info!(scan_id = %id, url = %request.url, recurse = request.recurse, "Active scan started");
        Ok(id)
    }

    async fn active_scan_status(&self, scan_id: &str) -> Result<u8, TransportError> {
        let resp: StatusResponse = self
            .client
            .get_json(
                "/JSON/ascan/view/status/",
                &[("scanId", scan_id.to_string())],
                Some(self.settings.status_timeout),
            )
            .await?;
        Ok(resp.progress())
    }

    async fn stop_active_scan(&self, scan_id: &str) -> Result<(), TransportError> {
        let _: ActionResponse = self
            .client
            .get_json(
                "/JSON/ascan/action/stop/",
                &[("scanId", scan_id.to_string())],
                Some(self.settings.stop_timeout),
            )
            .await?;
        Ok(())
    }

    async fn alerts(&self, query: &AlertQuery) -> Result<Vec<RawAlert>, TransportError> {
        let resp: AlertsResponse = self
            .client
            .get_json("/JSON/core/view/alerts/", &query.to_params(), Some(self.settings.alerts_timeout))
            .await?;
        Ok(resp.alerts.unwrap_or_default())
    }

    fn endpoint(&self) -> &str {
        self.client.base_url()
    }
}
