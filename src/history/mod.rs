pub mod schema;
pub mod store;

pub use store::HistoryStore;

use crate::errors::ScanError;
use crate::models::history::HistoryEntry;

/// Receives one entry per successful, non-cached scan.
pub trait HistorySink: Send + Sync {
    fn record(&self, entry: &HistoryEntry) -> Result<(), ScanError>;
}
