//! Canonicalization of user-supplied addresses into scan targets.
//!
//! The query string is stripped from everything the engine and the cache
//! see (scan URL, alert filter, cache key). It survives only in the display
//! value used for progress messages and history.

use url::Url;
use crate::errors::ScanError;

const DEFAULT_SCHEME: &str = "https";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScanTarget {
    url: Url,
    display: String,
}

impl ScanTarget {
    pub fn parse(raw: &str) -> Result<Self, ScanError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ScanError::InvalidUrl("empty address".into()));
        }

        let candidate = if trimmed.contains("://") {
            trimmed.to_string()
        } else {
            format!("{}://{}", DEFAULT_SCHEME, trimmed)
        };

        let mut url = Url::parse(&candidate)
            .map_err(|e| ScanError::InvalidUrl(format!("{}: {}", trimmed, e)))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ScanError::InvalidUrl(format!(
                "{}: unsupported scheme '{}'",
                trimmed,
                url.scheme()
            )));
        }
        if url.host_str().map_or(true, str::is_empty) {
            return Err(ScanError::InvalidUrl(format!("{}: missing host", trimmed)));
        }

        url.set_fragment(None);
        let display = url.to_string();
        url.set_query(None);

        Ok(Self { url, display })
    }

    /// Canonical scan URL: scheme, host, port and path.
    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    /// The address as entered, minus the fragment.
    pub fn display(&self) -> &str {
        &self.display
    }

    /// Scheme, host and port with a trailing slash.
    pub fn base_url(&self) -> String {
        format!("{}/", self.url.origin().ascii_serialization())
    }

    pub fn has_query(&self) -> bool {
        self.display != self.url.as_str()
    }

    /// Regex the engine uses to include this target (and everything below it)
    /// in a scan context.
    pub fn include_pattern(&self) -> String {
        format!("{}.*", regex::escape(self.as_str()))
    }
}

impl std::fmt::Display for ScanTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepends_https_when_scheme_missing() {
        let target = ScanTarget::parse("example.com").unwrap();
        assert_eq!(target.as_str(), "https://example.com/");
        let target = ScanTarget::parse("localhost:8080/app").unwrap();
        assert_eq!(target.as_str(), "https://localhost:8080/app");
    }

    #[test]
    fn test_keeps_explicit_http() {
        let target = ScanTarget::parse("http://example.com/login").unwrap();
        assert_eq!(target.as_str(), "http://example.com/login");
    }

    #[test]
    fn test_strips_fragment_and_query_from_scan_key() {
        let target = ScanTarget::parse("https://Example.com/search?q=1&utm=x#results").unwrap();
        assert_eq!(target.as_str(), "https://example.com/search");
        assert_eq!(target.display(), "https://example.com/search?q=1&utm=x");
        assert!(target.has_query());
    }

    #[test]
    fn test_base_url_drops_path() {
        let target = ScanTarget::parse("http://localhost:8080/app/login?x=1").unwrap();
        assert_eq!(target.base_url(), "http://localhost:8080/");
        let target = ScanTarget::parse("example.com/a/b").unwrap();
        assert_eq!(target.base_url(), "https://example.com/");
    }

    #[test]
    fn test_trims_whitespace() {
        let target = ScanTarget::parse("  https://example.com  ").unwrap();
        assert_eq!(target.as_str(), "https://example.com/");
        assert!(!target.has_query());
    }

    #[test]
    fn test_rejects_empty_and_blank() {
        assert!(matches!(ScanTarget::parse(""), Err(ScanError::InvalidUrl(_))));
        assert!(matches!(ScanTarget::parse("   \t"), Err(ScanError::InvalidUrl(_))));
    }

    #[test]
    fn test_rejects_unparsable_input() {
        assert!(matches!(ScanTarget::parse("exa mple.com"), Err(ScanError::InvalidUrl(_))));
        assert!(matches!(ScanTarget::parse("http://"), Err(ScanError::InvalidUrl(_))));
        assert!(matches!(ScanTarget::parse("https://[::1"), Err(ScanError::InvalidUrl(_))));
    }

    #[test]
    fn test_rejects_non_web_scheme() {
        assert!(matches!(ScanTarget::parse("ftp://example.com"), Err(ScanError::InvalidUrl(_))));
    }

    #[test]
    fn test_include_pattern_escapes_regex_metacharacters() {
        let target = ScanTarget::parse("https://example.com/a.b").unwrap();
        assert_eq!(target.include_pattern(), r"https://example\.com/a\.b.*");
    }

    #[test]
    fn test_same_site_different_query_share_scan_key() {
        let a = ScanTarget::parse("example.com/page?session=1").unwrap();
        let b = ScanTarget::parse("https://example.com/page?session=2").unwrap();
        assert_eq!(a.as_str(), b.as_str());
    }
}
