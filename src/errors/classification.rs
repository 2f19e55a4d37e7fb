use super::types::{ScanError, TransportError};

/// Who is expected to act on a surfaced error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Engine down, relay misconfigured, API key mismatch.
    Configuration,
    /// The site rejected or outlasted the scan.
    Target,
    /// The operator asked for it (cancellation).
    Operator,
    Internal,
}

#[derive(Debug, Clone)]
pub struct ErrorClassification {
    pub error_type: &'static str,
    pub category: ErrorCategory,
    pub retryable: bool,
}

impl ScanError {
    /// Classify this error into the scan failure taxonomy.
    pub fn classify(&self) -> ErrorClassification {
        match self {
            ScanError::InvalidUrl(_) => ErrorClassification {
                error_type: "InvalidUrlError",
                category: ErrorCategory::Target,
                retryable: false,
            },
            ScanError::EngineUnreachable(_) => ErrorClassification {
                error_type: "EngineUnreachableError",
                category: ErrorCategory::Configuration,
                retryable: true,
            },
            ScanError::ScanStart(_) => ErrorClassification {
                error_type: "ScanStartError",
                category: ErrorCategory::Target,
                retryable: true,
            },
            ScanError::ScanTimeout { .. } => ErrorClassification {
                error_type: "ScanTimeoutError",
                category: ErrorCategory::Target,
                retryable: false,
            },
            ScanError::PollTimeout { .. } => ErrorClassification {
                error_type: "PollTimeoutError",
                category: ErrorCategory::Target,
                retryable: false,
            },
            ScanError::Cancelled => ErrorClassification {
                error_type: "CancelledError",
                category: ErrorCategory::Operator,
                retryable: false,
            },
            ScanError::ResultFetch(_) => ErrorClassification {
                error_type: "ResultFetchError",
                category: ErrorCategory::Internal,
                retryable: true,
            },
            ScanError::Transport(inner) => ErrorClassification {
                error_type: "UnknownError",
                category: transport_category(inner),
                retryable: true,
            },
            ScanError::Config(_) => ErrorClassification {
                error_type: "ConfigError",
                category: ErrorCategory::Configuration,
                retryable: false,
            },
            ScanError::Io(_)
            | ScanError::Json(_)
            | ScanError::Yaml(_)
            | ScanError::Database(_)
            | ScanError::Internal(_) => ErrorClassification {
                error_type: "UnknownError",
                category: ErrorCategory::Internal,
                retryable: false,
            },
        }
    }

    /// Human-readable message for the caller. Each kind has one template and
    /// carries the most specific diagnostic that was captured.
    pub fn user_message(&self) -> String {
        match self {
            ScanError::InvalidUrl(detail) => format!(
                "The address could not be understood as a web URL ({}). Enter something like https://example.com.",
                detail
            ),
            ScanError::EngineUnreachable(detail) => format!(
                "Cannot connect to the scanning engine ({}). Ensure the engine is running, its API is enabled, the API key matches and the relay is reachable.",
                detail
            ),
            ScanError::ScanStart(detail) => format!(
                "The scanning engine refused to start the scan ({}). The site may block automated probing.",
                detail
            ),
            ScanError::ScanTimeout { attempts } => format!(
                "The scan did not finish after {} status checks. The site may be slow or blocking automated probing.",
                attempts
            ),
            ScanError::PollTimeout { attempts } => format!(
                "The scanning engine stopped reporting progress after {} status checks.",
                attempts
            ),
            ScanError::Cancelled => "The scan was cancelled.".to_string(),
            ScanError::ResultFetch(detail) => format!(
                "The scan finished but its results could not be retrieved ({}).",
                detail
            ),
            ScanError::Transport(inner) => inner.to_string(),
            other => other.to_string(),
        }
    }
}

fn transport_category(err: &TransportError) -> ErrorCategory {
    match err {
        TransportError::NoResponse(_) => ErrorCategory::Configuration,
        TransportError::Status { status: 401 | 403, .. } => ErrorCategory::Configuration,
        _ => ErrorCategory::Internal,
    }
}
