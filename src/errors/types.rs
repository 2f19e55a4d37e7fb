use thiserror::Error;

/// Uniform failure shape for every remote call made through the engine
/// transport client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The engine (or relay) answered with a non-success status.
    #[error("HTTP {status}{}", body_suffix(.body))]
    Status { status: u16, body: String },

    /// The request was sent but nothing came back: refused connection,
    /// DNS failure, reset, or the request timed out.
    #[error("No response from engine (request made, no reply): {0}")]
    NoResponse(String),

    #[error("{0}")]
    Other(String),
}

fn body_suffix(body: &str) -> String {
    if body.trim().is_empty() {
        String::new()
    } else {
        format!(" - {}", body.trim())
    }
}

impl TransportError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The engine tears down per-job endpoints once a job finishes, so a 404
    /// on a status or alerts read usually means "nothing left to report".
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn is_no_response(&self) -> bool {
        matches!(self, Self::NoResponse(_))
    }
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Cannot reach scanning engine: {0}")]
    EngineUnreachable(String),

    #[error("Failed to start scan: {0}")]
    ScanStart(String),

    #[error("Active scan timed out after {attempts} attempts")]
    ScanTimeout { attempts: u32 },

    #[error("Polling timed out after {attempts} attempts")]
    PollTimeout { attempts: u32 },

    #[error("Scan was cancelled")]
    Cancelled,

    #[error("Failed to fetch scan results: {0}")]
    ResultFetch(String),

    #[error("{0}")]
    Transport(#[from] TransportError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ScanError {
    /// Wrap a failed remote call. A call that got no response at all means
    /// the engine went away mid-scan; every other failure goes through `wrap`.
    pub fn from_remote(err: TransportError, wrap: impl FnOnce(TransportError) -> ScanError) -> ScanError {
        if err.is_no_response() {
            ScanError::EngineUnreachable(err.to_string())
        } else {
            wrap(err)
        }
    }
}
