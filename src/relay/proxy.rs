use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::{debug, error};
use url::Url;

use super::RelayState;

const ROUTE_PREFIX: &str = "/zap";
const API_KEY_PARAM: &str = "apikey";

/// Forward one `/zap/...` request to the engine and relay its answer.
pub async fn forward(
    State(state): State<RelayState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let target = match engine_url(&state, &uri) {
        Ok(target) => target,
        Err(message) => return proxy_error(&state, &uri, &method, message),
    };
    debug!(method = %method, from = %uri, to = %redact(&target), "Proxying engine request");

    let mut request = state.client.request(method.clone(), target.as_str());
    if let Some(content_type) = headers.get(header::CONTENT_TYPE) {
        request = request.header(header::CONTENT_TYPE, content_type.clone());
    }
    if !body.is_empty() {
        request = request.body(body);
    }

    let upstream = match request.send().await {
        Ok(resp) => resp,
        Err(e) => return proxy_error(&state, &uri, &method, e.to_string()),
    };

    let status = upstream.status();
    let content_type = upstream.headers().get(header::CONTENT_TYPE).cloned();
    let bytes = match upstream.bytes().await {
        Ok(bytes) => bytes,
        Err(e) => return proxy_error(&state, &uri, &method, e.to_string()),
    };

    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = status;
    if let Some(content_type) = content_type {
        response.headers_mut().insert(header::CONTENT_TYPE, content_type);
    }
    response
}

/// Engine URL for an incoming request: prefix removed, any caller-supplied
/// key replaced by the configured one.
pub fn engine_url(state: &RelayState, uri: &Uri) -> Result<Url, String> {
    let path = uri.path().strip_prefix(ROUTE_PREFIX).unwrap_or(uri.path());
    let path = if path.is_empty() { "/" } else { path };

    let mut target = Url::parse(&format!("{}{}", state.engine_url, path))
        .map_err(|e| format!("invalid engine URL: {}", e))?;

    let pairs: Vec<(String, String)> = url::form_urlencoded::parse(uri.query().unwrap_or("").as_bytes())
        .into_owned()
        .filter(|(name, _)| state.api_key.is_none() || name != API_KEY_PARAM)
        .collect();

    if pairs.is_empty() && state.api_key.is_none() {
        target.set_query(None);
    } else {
        let mut query = target.query_pairs_mut();
        query.clear();
        query.extend_pairs(pairs);
        if let Some(key) = &state.api_key {
            query.append_pair(API_KEY_PARAM, &**key);
        }
    }
    Ok(target)
}

fn redact(url: &Url) -> String {
    let mut shown = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .into_owned()
        .map(|(name, value)| if name == API_KEY_PARAM { (name, "***".to_string()) } else { (name, value) })
        .collect();
    if !pairs.is_empty() {
        shown.query_pairs_mut().clear().extend_pairs(pairs);
    }
    shown.to_string()
}

fn proxy_error(state: &RelayState, uri: &Uri, method: &Method, message: String) -> Response {
    error!(method = %method, uri = %uri, error = %message, "Proxy error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": "Proxy error",
            "message": message,
            "details": {
                "engineUrl": &*state.engine_url,
                "originalUrl": uri.to_string(),
                "method": method.as_str(),
            }
        })),
    )
        .into_response()
}
