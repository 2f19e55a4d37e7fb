use tracing::{info, warn};

use crate::cli::commands::ServeArgs;
use crate::config::RelaySettings;
use crate::errors::ScanError;
use crate::relay::{self, RelayState};

pub async fn handle_serve(args: ServeArgs, config_path: Option<&str>) -> Result<(), ScanError> {
    let config = super::load_config(config_path).await?;
    let mut settings = RelaySettings::resolve(config.relay.as_ref())?;
    if let Some(port) = args.port {
        settings.port = port;
    }
    if let Some(host) = args.host {
        settings.host = host;
    }
    if settings.api_key.is_none() {
        warn!("No engine API key configured, requests are forwarded without one");
    }

    let app = relay::build_router(RelayState::new(&settings)?);

    let addr = format!("{}:{}", settings.host, settings.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, engine = %settings.engine_url, "Engine relay listening");

    axum::serve(listener, app)
        .await
        .map_err(|e| ScanError::Internal(format!("Server error: {}", e)))?;

    Ok(())
}
