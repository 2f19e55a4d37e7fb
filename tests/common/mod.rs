#![allow(dead_code)]

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use sitescan::config::ScanSettings;
use sitescan::engine::{ActiveScanRequest, AlertQuery, EngineApi, RawAlert};
use sitescan::errors::{ScanError, TransportError};
use sitescan::history::HistorySink;
use sitescan::models::history::HistoryEntry;

/// Status replies played back in order; the last one repeats.
struct Script {
    entries: Vec<Result<u8, TransportError>>,
    next: usize,
}

impl Script {
    fn new(entries: Vec<Result<u8, TransportError>>) -> Self {
        Self { entries, next: 0 }
    }

    fn pop(&mut self) -> Result<u8, TransportError> {
        let i = self.next.min(self.entries.len().saturating_sub(1));
        self.next += 1;
        self.entries.get(i).cloned().unwrap_or(Ok(100))
    }
}

/// In-memory engine with scripted replies and a call log.
pub struct FakeEngine {
    reachable: bool,
    spider: Mutex<Script>,
    active: Mutex<Script>,
    start_failures: Mutex<u32>,
    access_failures: Mutex<u32>,
    stop_fails: bool,
    contexts: Result<Vec<String>, TransportError>,
    alerts: Result<Vec<RawAlert>, TransportError>,
    cancel_after_active_reads: Mutex<Option<(usize, CancellationToken)>>,
    calls: Mutex<Vec<&'static str>>,
    pub last_request: Mutex<Option<ActiveScanRequest>>,
    pub last_alert_query: Mutex<Option<AlertQuery>>,
    pub accessed: Mutex<Vec<String>>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self {
            reachable: true,
            spider: Mutex::new(Script::new(vec![Ok(100)])),
            active: Mutex::new(Script::new(vec![Ok(100)])),
            start_failures: Mutex::new(0),
            access_failures: Mutex::new(0),
            stop_fails: false,
            contexts: Ok(vec!["Default Context".to_string()]),
            alerts: Ok(Vec::new()),
            cancel_after_active_reads: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
            last_request: Mutex::new(None),
            last_alert_query: Mutex::new(None),
            accessed: Mutex::new(Vec::new()),
        }
    }

    pub fn unreachable(mut self) -> Self {
        self.reachable = false;
        self
    }

    pub fn spider_statuses(self, statuses: Vec<Result<u8, TransportError>>) -> Self {
        *self.spider.lock().unwrap() = Script::new(statuses);
        self
    }

    pub fn active_statuses(self, statuses: Vec<Result<u8, TransportError>>) -> Self {
        *self.active.lock().unwrap() = Script::new(statuses);
        self
    }

    pub fn failing_starts(self, failures: u32) -> Self {
        *self.start_failures.lock().unwrap() = failures;
        self
    }

    /// The first `failures` access_url calls fail.
    pub fn failing_access(self, failures: u32) -> Self {
        *self.access_failures.lock().unwrap() = failures;
        self
    }

    pub fn failing_stop(mut self) -> Self {
        self.stop_fails = true;
        self
    }

    pub fn contexts(mut self, contexts: Result<Vec<String>, TransportError>) -> Self {
        self.contexts = contexts;
        self
    }

    pub fn alerts(mut self, alerts: Result<Vec<RawAlert>, TransportError>) -> Self {
        self.alerts = alerts;
        self
    }

    /// Cancel `token` once the active-scan status has been read `reads` times.
    pub fn cancel_after_active_reads(self, reads: usize, token: CancellationToken) -> Self {
        *self.cancel_after_active_reads.lock().unwrap() = Some((reads, token));
        self
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| **c == call).count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn call_log(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl EngineApi for FakeEngine {
    async fn version(&self) -> Result<String, TransportError> {
        self.record("version");
        if self.reachable {
            Ok("2.14.0".to_string())
        } else {
            Err(TransportError::NoResponse("connection refused".into()))
        }
    }

    async fn start_spider(&self, _url: &str) -> Result<String, TransportError> {
        self.record("start_spider");
        Ok("0".to_string())
    }

    async fn spider_status(&self, _scan_id: &str) -> Result<u8, TransportError> {
        self.record("spider_status");
        self.spider.lock().unwrap().pop()
    }

    async fn access_url(&self, url: &str) -> Result<(), TransportError> {
        self.record("access_url");
        self.accessed.lock().unwrap().push(url.to_string());
        let mut failures = self.access_failures.lock().unwrap();
        if *failures > 0 {
            *failures -= 1;
            return Err(TransportError::Status { status: 502, body: "Bad Gateway".into() });
        }
        Ok(())
    }

    async fn list_contexts(&self) -> Result<Vec<String>, TransportError> {
        self.record("list_contexts");
        self.contexts.clone()
    }

    async fn new_context(&self, _name: &str) -> Result<Option<String>, TransportError> {
        self.record("new_context");
        Ok(Some("2".to_string()))
    }

    async fn include_in_context(&self, _name: &str, _regex: &str) -> Result<(), TransportError> {
        self.record("include_in_context");
        Ok(())
    }

    async fn context_id(&self, _name: &str) -> Result<Option<String>, TransportError> {
        self.record("context_id");
        Ok(Some("1".to_string()))
    }

    async fn start_active_scan(&self, request: &ActiveScanRequest) -> Result<String, TransportError> {
        self.record("start_active_scan");
        *self.last_request.lock().unwrap() = Some(request.clone());
        let mut failures = self.start_failures.lock().unwrap();
        if *failures > 0 {
            *failures -= 1;
            return Err(TransportError::Status { status: 400, body: "url_not_found".into() });
        }
        Ok("7".to_string())
    }

    async fn active_scan_status(&self, _scan_id: &str) -> Result<u8, TransportError> {
        self.record("active_scan_status");
        let reading = self.active.lock().unwrap().pop();
        if let Some((reads, token)) = self.cancel_after_active_reads.lock().unwrap().as_ref() {
            if self.count("active_scan_status") >= *reads {
                token.cancel();
            }
        }
        reading
    }

    async fn stop_active_scan(&self, _scan_id: &str) -> Result<(), TransportError> {
        self.record("stop_active_scan");
        if self.stop_fails {
            return Err(TransportError::NoResponse("timeout".into()));
        }
        Ok(())
    }

    async fn alerts(&self, query: &AlertQuery) -> Result<Vec<RawAlert>, TransportError> {
        self.record("alerts");
        *self.last_alert_query.lock().unwrap() = Some(query.clone());
        self.alerts.clone()
    }

    fn endpoint(&self) -> &str {
        "http://fake-relay"
    }
}

pub fn alert(name: &str, risk: &str) -> RawAlert {
    RawAlert {
        id: Some(json!(name.len())),
        name: Some(name.to_string()),
        alert: None,
        risk: Some(risk.to_string()),
        description: Some(format!("{} description", name)),
        confidence: Some("Medium".to_string()),
        url: Some("https://example.com/".to_string()),
    }
}

/// Scan settings with millisecond timings.
pub fn fast_settings() -> ScanSettings {
    ScanSettings {
        poll_interval: Duration::from_millis(1),
        start_backoff: Duration::from_millis(1),
        ..ScanSettings::default()
    }
}

#[derive(Default)]
pub struct RecordingHistory {
    pub entries: Mutex<Vec<HistoryEntry>>,
}

impl HistorySink for RecordingHistory {
    fn record(&self, entry: &HistoryEntry) -> Result<(), ScanError> {
        self.entries.lock().unwrap().push(entry.clone());
        Ok(())
    }
}

pub struct FailingHistory;

impl HistorySink for FailingHistory {
    fn record(&self, _entry: &HistoryEntry) -> Result<(), ScanError> {
        Err(ScanError::Database("disk full".into()))
    }
}
