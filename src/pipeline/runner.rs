use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ScanSettings;
use crate::engine::context;
use crate::engine::{ActiveScanRequest, EngineApi};
use crate::errors::{with_retry, RetryConfig, ScanError, TransportError};
use crate::target::ScanTarget;
use super::events::{EventSink, ScanState};
use super::poller::{poll_until_complete, PollPolicy, StatusReading};
use super::state::{PhaseName, ScanSession};

/// Drives the remote phases of one session: spider and context
/// registration for full scans, then the active scan.
pub struct PhaseRunner<'a> {
    engine: &'a dyn EngineApi,
    settings: &'a ScanSettings,
    events: &'a EventSink,
    cancel: &'a CancellationToken,
}

impl<'a> PhaseRunner<'a> {
    pub fn new(
        engine: &'a dyn EngineApi,
        settings: &'a ScanSettings,
        events: &'a EventSink,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self { engine, settings, events, cancel }
    }

    pub async fn run(&self, session: &mut ScanSession) -> Result<(), ScanError> {
        let context_id = if session.mode.is_full() {
            self.spider(session).await?;
            self.register_context(session).await?
        } else {
            None
        };
        self.active_scan(session, context_id).await
    }

    fn checkpoint(&self) -> Result<(), ScanError> {
        if self.cancel.is_cancelled() {
            Err(ScanError::Cancelled)
        } else {
            Ok(())
        }
    }

    async fn spider(&self, session: &mut ScanSession) -> Result<(), ScanError> {
        session.enter(PhaseName::Spidering)?;
        self.checkpoint()?;
        self.events.emit(
            ScanState::Scanning,
            PhaseName::Spidering.as_str(),
            0,
            format!("Spidering {}...", session.target.display()),
        );

        let job_id = self
            .engine
            .start_spider(session.target.as_str())
            .await
            .map_err(|e| ScanError::from_remote(e, |e| ScanError::ScanStart(format!("spider: {}", e))))?;
        session.set_job(job_id.as_str());

        let engine = self.engine;
        let id = job_id.as_str();
        let events = self.events;
        let policy = PollPolicy::new(self.settings.spider_max_attempts, self.settings.poll_interval);
        let result = poll_until_complete(
            move || async move { engine.spider_status(id).await.map(StatusReading::from_progress) },
            |progress, _| {
                session.record_progress(progress);
                events.emit(
                    ScanState::Scanning,
                    PhaseName::Spidering.as_str(),
                    progress,
                    format!("Spidering: {}%", progress),
                );
            },
            self.cancel,
            &policy,
        )
        .await;

        match result {
            Ok(outcome) => {
                info!(scan_id = %job_id, attempts = outcome.attempts, "Spider complete");
                Ok(())
            }
            Err(ScanError::PollTimeout { attempts }) => {
                warn!(scan_id = %job_id, attempts, "Spider did not finish in time, continuing with active scan");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn register_context(&self, session: &mut ScanSession) -> Result<Option<String>, ScanError> {
        session.enter(PhaseName::RegisteringContext)?;
        self.checkpoint()?;
        self.events.emit(
            ScanState::Scanning,
            PhaseName::RegisteringContext.as_str(),
            0,
            "Configuring scan context...",
        );

        let context_id = context::register_context(self.engine, &session.target, self.cancel).await?;
        session.record_progress(100);
        Ok(context_id)
    }

    /// Make sure the engine has seen the target before an active scan is
    /// started against it. The origin is only tried when the full URL fails.
    /// Failures are logged only.
    async fn register_target(&self, target: &ScanTarget) -> Result<(), ScanError> {
        let full = target.as_str().to_string();
        let base = target.base_url();
        let urls = if full == base { vec![full] } else { vec![full, base] };

        for url in urls {
            self.checkpoint()?;
            match self.engine.access_url(&url).await {
                Ok(()) => {
                    debug!(url = %url, "Target registered with engine");
                    return Ok(());
                }
                Err(e) => warn!(url = %url, error = %e, "Could not register target with engine"),
            }
        }
        Ok(())
    }

    async fn active_scan(&self, session: &mut ScanSession, context_id: Option<String>) -> Result<(), ScanError> {
        session.enter(PhaseName::ActiveScanning)?;
        self.checkpoint()?;
        self.events.emit(
            ScanState::Scanning,
            PhaseName::ActiveScanning.as_str(),
            0,
            format!("Starting active scan of {}...", session.target.display()),
        );

        let target = session.target.clone();
        self.register_target(&target).await?;

        let request = ActiveScanRequest::new(&target, session.mode, self.settings, context_id);
        let retry = RetryConfig {
            max_attempts: self.settings.start_attempts,
            backoff: self.settings.start_backoff,
        };
        let job_id = with_retry("active_scan_start", &retry, self.cancel, |attempt| {
            let request = &request;
            let target = &target;
            async move {
                if attempt > 0 {
                    self.register_target(target).await?;
                }
                self.checkpoint()?;
                self.engine
                    .start_active_scan(request)
                    .await
                    .map_err(start_error)
            }
        })
        .await?;
        session.set_job(job_id.as_str());

        let engine = self.engine;
        let id = job_id.as_str();
        let events = self.events;
        let policy = PollPolicy::new(self.settings.active_max_attempts(session.mode), self.settings.poll_interval);
        let result = poll_until_complete(
            move || async move { engine.active_scan_status(id).await.map(StatusReading::from_progress) },
            |progress, _| {
                session.record_progress(progress);
                events.emit(
                    ScanState::Scanning,
                    PhaseName::ActiveScanning.as_str(),
                    progress,
                    format!("Active scan: {}%", progress),
                );
            },
            self.cancel,
            &policy,
        )
        .await;

        match result {
            Ok(outcome) => {
                info!(scan_id = %job_id, attempts = outcome.attempts, recovered = outcome.recovered, "Active scan complete");
                Ok(())
            }
            Err(ScanError::Cancelled) => {
                self.stop_quietly(&job_id).await;
                Err(ScanError::Cancelled)
            }
            Err(ScanError::PollTimeout { attempts }) => Err(ScanError::ScanTimeout { attempts }),
            Err(e) => Err(e),
        }
    }

    async fn stop_quietly(&self, job_id: &str) {
        match self.engine.stop_active_scan(job_id).await {
            Ok(()) => info!(scan_id = %job_id, "Active scan stopped after cancellation"),
            Err(e) => warn!(scan_id = %job_id, error = %e, "Failed to stop active scan"),
        }
    }
}

fn start_error(err: TransportError) -> ScanError {
    ScanError::from_remote(err, |err| {
        if err.is_not_found() {
            ScanError::ScanStart(format!(
                "{} (URL not found in scan tree; the engine could not access the target)",
                err
            ))
        } else {
            ScanError::ScanStart(err.to_string())
        }
    })
}
