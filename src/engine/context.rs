use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::ScanError;
use crate::target::ScanTarget;
use super::provider::EngineApi;

/// Put the target into a scan context and return the context id to scope
/// the active scan with.
///
/// Best-effort: any engine failure yields `Ok(None)` and the active scan
/// runs unscoped. Only cancellation is returned as an error.
pub async fn register_context(
    engine: &dyn EngineApi,
    target: &ScanTarget,
    cancel: &CancellationToken,
) -> Result<Option<String>, ScanError> {
    match try_register(engine, target, cancel).await {
        Ok(context_id) => Ok(context_id),
        Err(ScanError::Cancelled) => Err(ScanError::Cancelled),
        Err(e) => {
            warn!(error = %e, "Context registration failed, using unscoped scan parameters");
            Ok(None)
        }
    }
}

async fn try_register(
    engine: &dyn EngineApi,
    target: &ScanTarget,
    cancel: &CancellationToken,
) -> Result<Option<String>, ScanError> {
    let pattern = target.include_pattern();

    checkpoint(cancel)?;
    let existing = engine.list_contexts().await?;
    for name in existing {
        checkpoint(cancel)?;
        match engine.include_in_context(&name, &pattern).await {
            Ok(()) => {
                info!(context = %name, pattern = %pattern, "Target included in existing context");
                checkpoint(cancel)?;
                return Ok(lookup_id(engine, &name).await);
            }
            Err(e) => {
                debug!(context = %name, error = %e, "Context rejected target, trying next");
            }
        }
    }

    let name = format!("scan-context-{}", Utc::now().timestamp_millis());
    checkpoint(cancel)?;
    let created_id = engine.new_context(&name).await?;
    checkpoint(cancel)?;
    engine.include_in_context(&name, &pattern).await?;
    info!(context = %name, pattern = %pattern, "Created scan context for target");

    match created_id {
        Some(id) => Ok(Some(id)),
        None => {
            checkpoint(cancel)?;
            Ok(lookup_id(engine, &name).await)
        }
    }
}

async fn lookup_id(engine: &dyn EngineApi, name: &str) -> Option<String> {
    match engine.context_id(name).await {
        Ok(id) => id,
        Err(e) => {
            warn!(context = %name, error = %e, "Could not resolve context id, scanning unscoped");
            None
        }
    }
}

fn checkpoint(cancel: &CancellationToken) -> Result<(), ScanError> {
    if cancel.is_cancelled() {
        Err(ScanError::Cancelled)
    } else {
        Ok(())
    }
}
