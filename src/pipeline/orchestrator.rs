use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::cache::ResultCache;
use crate::config::{ScanMode, ScanSettings};
use crate::engine::probe::probe;
use crate::engine::results::fetch_findings;
use crate::engine::EngineApi;
use crate::errors::ScanError;
use crate::history::HistorySink;
use crate::models::finding::{Finding, SeverityCounts};
use crate::models::history::HistoryEntry;
use crate::target::ScanTarget;
use super::events::{EventSink, ProgressEvent, ScanState, CACHE_PHASE, CONNECTING_PHASE};
use super::runner::PhaseRunner;
use super::state::{PhaseName, ScanSession};

/// Top-level scan workflow: normalize, consult the cache, probe the engine,
/// run the phases, fetch and map results, then cache and record them.
pub struct ScanOrchestrator {
    engine: Arc<dyn EngineApi>,
    cache: Arc<ResultCache>,
    settings: ScanSettings,
    events: EventSink,
    history: Option<Arc<dyn HistorySink>>,
}

impl ScanOrchestrator {
    pub fn new(engine: Arc<dyn EngineApi>, cache: Arc<ResultCache>, settings: ScanSettings) -> Self {
        Self {
            engine,
            cache,
            settings,
            events: EventSink::default(),
            history: None,
        }
    }

    /// Attach an event channel for streaming progress to a display or other consumer.
    pub fn with_event_channel(mut self, tx: mpsc::UnboundedSender<ProgressEvent>) -> Self {
        self.events = EventSink::new(tx);
        self
    }

    pub fn with_history(mut self, history: Arc<dyn HistorySink>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    /// Run one scan. `cancel` is owned by the caller; the orchestrator only
    /// observes it.
    pub async fn run(
        &self,
        url: &str,
        mode: ScanMode,
        cancel: &CancellationToken,
    ) -> Result<Vec<Finding>, ScanError> {
        match self.execute(url, mode, cancel).await {
            Ok(findings) => Ok(findings),
            Err(e) => {
                self.report_failure(url, &e);
                Err(e)
            }
        }
    }

    async fn execute(
        &self,
        url: &str,
        mode: ScanMode,
        cancel: &CancellationToken,
    ) -> Result<Vec<Finding>, ScanError> {
        let target = ScanTarget::parse(url)?;

        if let Some(entry) = self.cache.get(&target, mode) {
            info!(target = %target, mode = %mode, count = entry.findings.len(), "Cache hit, skipping scan");
            self.events.emit(
                ScanState::Completed,
                CACHE_PHASE,
                100,
                format!("Loaded {} findings from cache", entry.findings.len()),
            );
            return Ok(entry.findings.clone());
        }

        let mut session = ScanSession::new(target, mode);
        info!(
            session_id = %session.id,
            target = %session.target,
            mode = %mode,
            query_stripped = session.target.has_query(),
            "Scan started"
        );

        checkpoint(cancel)?;
        self.events.emit(
            ScanState::Connecting,
            CONNECTING_PHASE,
            0,
            format!("Connecting to scanning engine at {}...", self.engine.endpoint()),
        );
        probe(self.engine.as_ref()).await?;

        PhaseRunner::new(self.engine.as_ref(), &self.settings, &self.events, cancel)
            .run(&mut session)
            .await?;

        session.enter(PhaseName::FetchingResults)?;
        checkpoint(cancel)?;
        self.events.emit(
            ScanState::Fetching,
            PhaseName::FetchingResults.as_str(),
            0,
            "Fetching scan results...",
        );
        let findings = fetch_findings(self.engine.as_ref(), &session.target, self.settings.alert_page_size).await?;
        session.record_progress(100);

        self.cache.put(&session.target, mode, findings.clone());
        self.record_history(&session, &findings);

        info!(
            session_id = %session.id,
            target = %session.target,
            findings = findings.len(),
            duration_ms = session.elapsed_ms(),
            "Scan completed"
        );
        self.events.emit(
            ScanState::Completed,
            PhaseName::FetchingResults.as_str(),
            100,
            format!("Scan complete: {} findings", findings.len()),
        );
        Ok(findings)
    }

    fn record_history(&self, session: &ScanSession, findings: &[Finding]) {
        let Some(history) = self.history.as_ref() else {
            return;
        };
        let entry = HistoryEntry::new(session.target.display(), Utc::now(), SeverityCounts::tally(findings));
        if let Err(e) = history.record(&entry) {
            warn!(error = %e, url = %entry.url, "Failed to record scan history");
        }
    }

    fn report_failure(&self, url: &str, err: &ScanError) {
        let classification = err.classify();
        if matches!(err, ScanError::Cancelled) {
            info!(url = %url, "Scan cancelled");
            self.events.emit(ScanState::Cancelled, classification.error_type, 0, err.user_message());
        } else {
            error!(
                url = %url,
                error_type = classification.error_type,
                category = ?classification.category,
                error = %err,
                "Scan failed"
            );
            self.events.emit(ScanState::Error, classification.error_type, 0, err.user_message());
        }
    }
}

fn checkpoint(cancel: &CancellationToken) -> Result<(), ScanError> {
    if cancel.is_cancelled() {
        Err(ScanError::Cancelled)
    } else {
        Ok(())
    }
}
