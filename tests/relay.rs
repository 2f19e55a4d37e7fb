use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sitescan::config::RelaySettings;
use sitescan::relay::{build_router, RelayState};

fn state(engine_url: &str, api_key: Option<&str>) -> RelayState {
    let settings = RelaySettings {
        engine_url: engine_url.to_string(),
        api_key: api_key.map(str::to_string),
        ..Default::default()
    };
    RelayState::new(&settings).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap()
}

async fn response_json(response: axum::http::Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = build_router(state("http://127.0.0.1:1", None));
    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await, json!({"status": "ok"}));
}

#[tokio::test]
async fn test_forwards_with_prefix_stripped_and_key() {
    let engine = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/JSON/core/view/version/"))
        .and(query_param("apikey", "s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"version": "2.14.0"})))
        .expect(1)
        .mount(&engine)
        .await;

    let app = build_router(state(&engine.uri(), Some("s3cret")));
    let response = app.oneshot(get("/zap/JSON/core/view/version/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap().to_str().unwrap(),
        "application/json"
    );
    assert_eq!(response_json(response).await, json!({"version": "2.14.0"}));
}

#[tokio::test]
async fn test_engine_status_relayed() {
    let engine = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/JSON/ascan/view/status/"))
        .and(query_param("scanId", "5"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Does Not Exist"))
        .mount(&engine)
        .await;

    let app = build_router(state(&engine.uri(), None));
    let response = app.oneshot(get("/zap/JSON/ascan/view/status/?scanId=5")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"Does Not Exist");
}

#[tokio::test]
async fn test_unreachable_engine_is_proxy_error() {
    let app = build_router(state("http://127.0.0.1:1", Some("k")));
    let response = app.oneshot(get("/zap/JSON/core/view/version/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = response_json(response).await;
    assert_eq!(body["error"], "Proxy error");
    assert!(body["message"].as_str().is_some());
    assert_eq!(body["details"]["engineUrl"], "http://127.0.0.1:1");
    assert_eq!(body["details"]["originalUrl"], "/zap/JSON/core/view/version/");
    assert_eq!(body["details"]["method"], "GET");
}

#[tokio::test]
async fn test_cors_headers_present() {
    let app = build_router(state("http://127.0.0.1:1", None));
    let request = Request::builder()
        .method("GET")
        .uri("/health")
        .header("origin", "http://localhost:5173")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert!(response.headers().contains_key("access-control-allow-origin"));
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = build_router(state("http://127.0.0.1:1", None));
    let response = app.oneshot(get("/api/other")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[test]
fn test_state_trims_trailing_slash() {
    let state = state("http://engine:8090/", None);
    assert_eq!(&*state.engine_url, "http://engine:8090");
    assert!(state.api_key.is_none());
}
