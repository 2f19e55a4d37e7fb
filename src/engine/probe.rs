use tracing::{info, warn};
use crate::errors::ScanError;
use super::provider::EngineApi;

/// Verify the engine answers before any scan work starts. No retries: a
/// failure here means the engine (or relay) is down, not that a phase failed.
pub async fn probe(engine: &dyn EngineApi) -> Result<String, ScanError> {
    match engine.version().await {
        Ok(version) => {
            info!(endpoint = %engine.endpoint(), version = %version, "Scanning engine reachable");
            Ok(version)
        }
        Err(e) => {
            warn!(endpoint = %engine.endpoint(), error = %e, "Scanning engine unreachable");
            Err(ScanError::EngineUnreachable(format!(
                "cannot reach engine API via relay at {}: {}",
                engine.endpoint(),
                e
            )))
        }
    }
}
