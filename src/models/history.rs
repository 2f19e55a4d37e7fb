use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use super::finding::SeverityCounts;

/// Flat summary of one completed scan, handed to the history sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub url: String,
    pub timestamp: DateTime<Utc>,
    pub counts: SeverityCounts,
}

impl HistoryEntry {
    pub fn new(url: &str, timestamp: DateTime<Utc>, counts: SeverityCounts) -> Self {
        Self {
            id: format!("{}-{}", timestamp.timestamp_millis(), url),
            url: url.to_string(),
            timestamp,
            counts,
        }
    }
}
