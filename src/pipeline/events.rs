use serde::Serialize;
use tokio::sync::mpsc;

/// Coarse scan state carried on every progress event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanState {
    Connecting,
    Scanning,
    Fetching,
    Completed,
    Cancelled,
    Error,
}

impl ScanState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Error)
    }
}

/// Messages sent from the orchestrator to a display or other consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressEvent {
    pub state: ScanState,
    pub phase: String,
    pub progress: u8,
    pub message: String,
    pub cancellable: bool,
}

/// Phase label used for events that are not tied to a scan phase.
pub const CONNECTING_PHASE: &str = "connecting";
pub const CACHE_PHASE: &str = "cache";

/// Sending half of the progress stream. Without a channel attached every
/// emit is a no-op, and a dropped receiver is ignored.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    tx: Option<mpsc::UnboundedSender<ProgressEvent>>,
}

impl EventSink {
    pub fn new(tx: mpsc::UnboundedSender<ProgressEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    pub fn emit(&self, state: ScanState, phase: &str, progress: u8, message: impl Into<String>) {
        if let Some(ref tx) = self.tx {
            let _ = tx.send(ProgressEvent {
                state,
                phase: phase.to_string(),
                progress: progress.min(100),
                message: message.into(),
                cancellable: !state.is_terminal(),
            });
        }
    }
}
