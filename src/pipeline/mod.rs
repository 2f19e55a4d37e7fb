pub mod events;
pub mod orchestrator;
pub mod phase;
pub mod poller;
pub mod runner;
pub mod state;

pub use events::{EventSink, ProgressEvent, ScanState};
pub use orchestrator::ScanOrchestrator;
pub use poller::{poll_until_complete, PollOutcome, PollPolicy, StatusReading};
pub use state::{PhaseName, PhaseState, ScanSession};
