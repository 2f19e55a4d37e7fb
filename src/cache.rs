//! Process-lifetime result cache keyed by normalized target and scan mode.
//!
//! Entries are never evicted. Concurrent sessions share one instance; the
//! last writer for a key wins.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::debug;

use crate::config::ScanMode;
use crate::models::finding::Finding;
use crate::target::ScanTarget;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    target: String,
    mode: ScanMode,
}

impl CacheKey {
    pub fn new(target: &ScanTarget, mode: ScanMode) -> Self {
        Self { target: target.as_str().to_string(), mode }
    }
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub findings: Vec<Finding>,
    pub stored_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct ResultCache {
    entries: DashMap<CacheKey, Arc<CacheEntry>>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, target: &ScanTarget, mode: ScanMode) -> Option<Arc<CacheEntry>> {
        self.entries
            .get(&CacheKey::new(target, mode))
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Store findings for `(target, mode)`. The entry is built before it is
    /// inserted, so readers see either the old or the new one in full.
    pub fn put(&self, target: &ScanTarget, mode: ScanMode, findings: Vec<Finding>) {
        let entry = Arc::new(CacheEntry { findings, stored_at: Utc::now() });
        debug!(target = %target, mode = %mode, count = entry.findings.len(), "Caching scan results");
        self.entries.insert(CacheKey::new(target, mode), entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::finding::Severity;

    fn finding(title: &str) -> Finding {
        Finding {
            id: None,
            title: title.into(),
            severity: Severity::Low,
            description: None,
            confidence: None,
            url: None,
        }
    }

    #[test]
    fn test_keyed_by_target_and_mode() {
        let cache = ResultCache::new();
        let target = ScanTarget::parse("example.com").unwrap();
        cache.put(&target, ScanMode::Quick, vec![finding("a")]);

        assert!(cache.get(&target, ScanMode::Full).is_none());
        assert_eq!(cache.get(&target, ScanMode::Quick).unwrap().findings, vec![finding("a")]);
    }

    #[test]
    fn test_query_variants_share_entry() {
        let cache = ResultCache::new();
        let plain = ScanTarget::parse("https://example.com/search").unwrap();
        let with_query = ScanTarget::parse("https://example.com/search?q=1#top").unwrap();
        cache.put(&plain, ScanMode::Quick, vec![finding("a")]);
        assert!(cache.get(&with_query, ScanMode::Quick).is_some());
    }

    #[test]
    fn test_last_writer_wins() {
        let cache = ResultCache::new();
        let target = ScanTarget::parse("example.com").unwrap();
        cache.put(&target, ScanMode::Full, vec![finding("old")]);
        cache.put(&target, ScanMode::Full, vec![finding("new"), finding("newer")]);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&target, ScanMode::Full).unwrap().findings.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
    }
}
