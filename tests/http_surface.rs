//! Router behaviour that does not need a reachable database. The pool points at a closed port,
//! so anything that checks out a connection fails with 503.

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use settings_api::{app, builtin_catalog, connect_pool, resolve, AppState, Settings};
use std::sync::Arc;
use tower::ServiceExt;

fn test_app() -> Router {
    let settings = Settings::from_lookup(|k| match k {
        "DB_HOST" => Some("127.0.0.1".into()),
        "DB_PORT" => Some("1".into()),
        "DB_CONNECT_TIMEOUT_SECS" => Some("1".into()),
        _ => None,
    })
    .unwrap();
    let model = resolve(&builtin_catalog().unwrap(), None).unwrap();
    let state = AppState {
        pool: connect_pool(&settings).unwrap(),
        model: Arc::new(model),
    };
    app(state, settings.body_limit)
}

async fn send(method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            req = req.header("content-type", "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    let res = test_app().oneshot(req.body(body).unwrap()).await.unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn send_raw(uri: &str, content_type: Option<&str>, body: &'static str) -> (StatusCode, Value) {
    let mut req = Request::builder().method("POST").uri(uri);
    if let Some(ct) = content_type {
        req = req.header("content-type", ct);
    }
    let res = test_app().oneshot(req.body(Body::from(body)).unwrap()).await.unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn health_does_not_need_database() {
    let (status, body) = send("GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn version_lists_mounted_resources() {
    let (status, body) = send("GET", "/version", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "settings-api");
    assert_eq!(body["resources"].as_array().unwrap().len(), 9);
}

#[tokio::test]
async fn invalid_email_is_rejected_before_storage() {
    let (status, body) = send(
        "POST",
        "/business",
        Some(json!({"name": "Acme", "email": "nope", "address": "1 Main St", "contact": "555"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "validation_error");
    assert_eq!(body["error"]["message"], "email must be a valid email");
}

#[tokio::test]
async fn missing_required_field() {
    let (status, body) = send("POST", "/currency/", Some(json!({"currencyname": "Dollar"}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["message"], "country is required");
}

#[tokio::test]
async fn non_numeric_id_is_bad_request() {
    let (status, body) = send("GET", "/currency/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn update_without_id_is_rejected() {
    let (status, body) = send("PUT", "/currency/", Some(json!({"country": "USA"}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["message"], "id is required");
}

#[tokio::test]
async fn mismatched_body_id_is_bad_request() {
    let (status, _) = send("PUT", "/currency/1", Some(json!({"id": 2, "country": "USA"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unreachable_database_is_503_without_detail() {
    let (status, body) = send("GET", "/currency/1", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["message"], "Database connection failed");
}

#[tokio::test]
async fn ready_reports_degraded() {
    let (status, body) = send("GET", "/ready", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["database"], "unavailable");
}

#[tokio::test]
async fn toggle_requires_flag_and_keys() {
    let (status, body) = send("PUT", "/notifications/settings?module=orders&action=created", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["message"], "enabled is required");

    let (status, body) = send("PUT", "/notifications/settings?module=orders&enabled=true", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["message"], "action is required");

    let (status, _) = send("PUT", "/notifications/settings?module=orders&action=created&enabled=maybe", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn multi_segment_paths_are_mounted() {
    let (status, _) = send("GET", "/api/privacy/xyz", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_route_is_404() {
    let (status, _) = send("GET", "/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_json_body_uses_error_shape() {
    let (status, body) = send_raw("/currency", Some("application/json"), "{currencyname: Dollar").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");
    assert_eq!(body["error"]["message"], "body must be valid JSON");
}

#[tokio::test]
async fn missing_content_type_uses_error_shape() {
    let (status, body) = send_raw("/currency", None, r#"{"currencyname": "Dollar", "country": "USA"}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");
    assert_eq!(body["error"]["message"], "content type must be application/json");
}
