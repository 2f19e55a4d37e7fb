use tracing::{debug, info, warn};

use crate::errors::ScanError;
use crate::models::finding::{Finding, Severity};
use crate::target::ScanTarget;
use super::provider::EngineApi;
use super::schema::{value_to_string, AlertQuery, RawAlert};

/// Retrieve every high/medium/low alert under the target. An empty or
/// missing alert list is a successful, empty result.
pub async fn fetch_findings(
    engine: &dyn EngineApi,
    target: &ScanTarget,
    page_size: u32,
) -> Result<Vec<Finding>, ScanError> {
    let query = AlertQuery::for_target(target, page_size);
    match engine.alerts(&query).await {
        Ok(raw) => {
            let findings = map_alerts(raw);
            info!(target = %target, count = findings.len(), "Fetched scan findings");
            Ok(findings)
        }
        Err(e) if e.is_not_found() => {
            warn!(target = %target, "Alerts endpoint returned 404, treating as no findings");
            Ok(Vec::new())
        }
        Err(e) => Err(ScanError::from_remote(e, |e| ScanError::ResultFetch(e.to_string()))),
    }
}

/// Map raw alerts in engine order, dropping alerts without a
/// high/medium/low risk label.
pub fn map_alerts(raw: Vec<RawAlert>) -> Vec<Finding> {
    raw.into_iter().filter_map(map_alert).collect()
}

pub fn map_alert(alert: RawAlert) -> Option<Finding> {
    let severity = match alert.risk.as_deref().and_then(Severity::from_risk) {
        Some(severity) => severity,
        None => {
            debug!(risk = ?alert.risk, name = ?alert.name, "Skipping alert without a reportable risk level");
            return None;
        }
    };

    Some(Finding {
        id: alert.id.as_ref().and_then(value_to_string),
        title: alert.name.or(alert.alert).unwrap_or_default(),
        severity,
        description: alert.description,
        confidence: alert.confidence,
        url: alert.url,
    })
}
