use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::ScanMode;
use crate::errors::ScanError;
use crate::target::ScanTarget;

/// Phases in the order a session moves through them. Quick scans skip the
/// first two.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum PhaseName {
    Spidering,
    RegisteringContext,
    ActiveScanning,
    FetchingResults,
}

impl PhaseName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Spidering => "spidering",
            Self::RegisteringContext => "registering-context",
            Self::ActiveScanning => "active-scanning",
            Self::FetchingResults => "fetching-results",
        }
    }
}

impl std::fmt::Display for PhaseName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseState {
    pub phase: PhaseName,
    pub job_id: Option<String>,
    pub progress: u8,
}

impl PhaseState {
    fn new(phase: PhaseName) -> Self {
        Self { phase, job_id: None, progress: 0 }
    }
}

/// Per-run bookkeeping. Lives for one `run` call and is never persisted.
#[derive(Debug, Clone)]
pub struct ScanSession {
    pub id: Uuid,
    pub target: ScanTarget,
    pub mode: ScanMode,
    pub started_at: DateTime<Utc>,
    sequence: Vec<PhaseName>,
    current: Option<PhaseState>,
}

impl ScanSession {
    pub fn new(target: ScanTarget, mode: ScanMode) -> Self {
        Self {
            id: Uuid::new_v4(),
            target,
            mode,
            started_at: Utc::now(),
            sequence: Vec::new(),
            current: None,
        }
    }

    /// Move to `phase`. Phases only move forward; going back or re-entering
    /// one is an internal error.
    pub fn enter(&mut self, phase: PhaseName) -> Result<(), ScanError> {
        if let Some(last) = self.sequence.last() {
            if phase <= *last {
                return Err(ScanError::Internal(format!(
                    "phase order violated: {} after {}",
                    phase, last
                )));
            }
        }
        self.sequence.push(phase);
        self.current = Some(PhaseState::new(phase));
        Ok(())
    }

    pub fn set_job(&mut self, job_id: impl Into<String>) {
        if let Some(state) = self.current.as_mut() {
            state.job_id = Some(job_id.into());
        }
    }

    pub fn record_progress(&mut self, progress: u8) {
        if let Some(state) = self.current.as_mut() {
            state.progress = progress.min(100);
        }
    }

    pub fn current(&self) -> Option<&PhaseState> {
        self.current.as_ref()
    }

    pub fn phases(&self) -> &[PhaseName] {
        &self.sequence
    }

    pub fn elapsed_ms(&self) -> u64 {
        Utc::now()
            .signed_duration_since(self.started_at)
            .num_milliseconds()
            .unsigned_abs()
    }
}
