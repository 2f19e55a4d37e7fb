//! Engine response shapes. The engine omits fields freely and mixes string
//! and number encodings, so everything here is optional and read through
//! accessors with fallbacks.

use serde::Deserialize;
use serde_json::Value;

use crate::config::{ScanMode, ScanSettings};
use crate::target::ScanTarget;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VersionResponse {
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScanStartResponse {
    pub scan: Option<Value>,
}

impl ScanStartResponse {
    pub fn scan_id(&self) -> Option<String> {
        value_to_string(self.scan.as_ref()?).filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusResponse {
    pub status: Option<Value>,
}

impl StatusResponse {
    /// Progress percentage clamped to 0..=100; unreadable values count as 0.
    pub fn progress(&self) -> u8 {
        let parsed = match &self.status {
            Some(Value::Number(n)) => n.as_u64(),
            Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
            _ => None,
        };
        parsed.unwrap_or(0).min(100) as u8
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ContextList {
    Names(Vec<String>),
    /// Some engine versions render the list as `"[Default Context, other]"`.
    Raw(String),
}

impl ContextList {
    pub fn names(&self) -> Vec<String> {
        match self {
            ContextList::Names(names) => names.clone(),
            ContextList::Raw(raw) => raw
                .trim()
                .trim_start_matches('[')
                .trim_end_matches(']')
                .split(',')
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContextListResponse {
    #[serde(rename = "contextList")]
    pub context_list: Option<ContextList>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewContextResponse {
    #[serde(rename = "contextId")]
    pub context_id: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContextDetail {
    pub id: Option<Value>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContextViewResponse {
    pub context: Option<ContextDetail>,
}

/// Generic `{"Result": "OK"}` acknowledgement of engine actions.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActionResponse {
    #[serde(rename = "Result")]
    pub result: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawAlert {
    pub id: Option<Value>,
    pub name: Option<String>,
    /// Older engines put the title here instead of `name`.
    pub alert: Option<String>,
    pub risk: Option<String>,
    pub description: Option<String>,
    pub confidence: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlertsResponse {
    pub alerts: Option<Vec<RawAlert>>,
}

/// Parameters of an active-scan start call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveScanRequest {
    pub url: String,
    pub recurse: bool,
    pub in_scope_only: bool,
    pub scan_policy: String,
    pub context_id: Option<String>,
    pub threads_per_host: u32,
}

impl ActiveScanRequest {
    pub fn new(target: &ScanTarget, mode: ScanMode, settings: &ScanSettings, context_id: Option<String>) -> Self {
        Self {
            url: target.as_str().to_string(),
            recurse: mode.recurse(),
            in_scope_only: false,
            scan_policy: settings.scan_policy.clone(),
            context_id,
            threads_per_host: settings.threads_per_host,
        }
    }

    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("url", self.url.clone()),
            ("recurse", self.recurse.to_string()),
            ("inScopeOnly", self.in_scope_only.to_string()),
            ("scanPolicyName", self.scan_policy.clone()),
            ("method", "GET".to_string()),
            ("postData", String::new()),
            ("contextId", self.context_id.clone().unwrap_or_default()),
            ("handleParameters", "IGNORE_VALUE".to_string()),
            ("scanHeadersAllRequests", "true".to_string()),
            ("delayInMs", "0".to_string()),
            ("threadPerHost", self.threads_per_host.to_string()),
        ]
    }
}

/// Alert listing filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertQuery {
    pub base_url: String,
    pub start: u32,
    pub count: u32,
    pub risk_ids: String,
}

impl AlertQuery {
    /// All high, medium and low alerts under the target.
    pub fn for_target(target: &ScanTarget, page_size: u32) -> Self {
        Self {
            base_url: target.as_str().to_string(),
            start: 0,
            count: page_size,
            risk_ids: "1,2,3".to_string(),
        }
    }

    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("baseurl", self.base_url.clone()),
            ("start", self.start.to_string()),
            ("count", self.count.to_string()),
            ("riskId", self.risk_ids.clone()),
        ]
    }
}

pub(crate) fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
