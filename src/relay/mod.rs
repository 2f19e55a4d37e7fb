//! HTTP relay in front of the scanning engine. Clients talk to `/zap/...`;
//! the relay strips the prefix, attaches the API key and forwards the call.

pub mod proxy;

use std::sync::Arc;

use axum::routing::{any, get};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::RelaySettings;
use crate::errors::ScanError;

#[derive(Clone)]
pub struct RelayState {
    pub client: reqwest::Client,
    pub engine_url: Arc<str>,
    pub api_key: Option<Arc<str>>,
}

impl RelayState {
    pub fn new(settings: &RelaySettings) -> Result<Self, ScanError> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|e| ScanError::Config(format!("Failed to build relay HTTP client: {}", e)))?;

        Ok(Self {
            client,
            engine_url: Arc::from(settings.engine_url.trim_end_matches('/')),
            api_key: settings.api_key.as_deref().map(Arc::from),
        })
    }
}

pub fn build_router(state: RelayState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/zap", any(proxy::forward))
        .route("/zap/*path", any(proxy::forward))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
