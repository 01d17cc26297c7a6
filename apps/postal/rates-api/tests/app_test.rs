//! Tests for the assembled application: routing, docs, health and readiness.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use core_config::rates::RateTablesConfig;
use core_config::AppInfo;
use http_body_util::BodyExt;
use rates_api::{build_service, server};
use serde_json::{Value, json};
use tower::ServiceExt; // For oneshot()

const APP: AppInfo = AppInfo {
    name: "rates_api",
    version: "0.1.0",
};

// Helper to parse JSON response body
async fn json_body(body: Body) -> Value {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn embedded_app() -> axum::Router {
    let service = build_service(&RateTablesConfig::default()).unwrap();
    server::app(service, APP, None).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_quote_is_served_under_api_rates() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/rates/quote")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "product": "POSTA1",
                "destination": {"type": "ITALY"},
                "weightGrams": 20,
                "format": "standard"
            })
            .to_string(),
        ))
        .unwrap();

    let response = embedded_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );

    let body = json_body(response.into_body()).await;
    assert_eq!(body["totalCents"], 285);
    assert_eq!(body["productCode"], "POSTA1/standard");
}

#[tokio::test]
async fn test_health_reports_app_info() {
    let response = embedded_app().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response.into_body()).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["name"], "rates_api");
}

#[tokio::test]
async fn test_ready_with_embedded_tables() {
    let response = embedded_app().oneshot(get("/ready")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response.into_body()).await;
    assert_eq!(body["status"], "ready");
    assert_eq!(body["tables"], 6);
    assert!(body.get("failures").is_none());
}

#[tokio::test]
async fn test_ready_is_unavailable_when_a_tariff_table_is_missing() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("zones.json"), r#"{"FR": "ZONE_1"}"#).unwrap();
    std::fs::write(dir.path().join("options.json"), "{}").unwrap();

    let config = RateTablesConfig {
        tables_dir: Some(dir.path().to_path_buf()),
        strict_sub_format: false,
        warm_up: false,
    };
    let app = server::app(build_service(&config).unwrap(), APP, None).unwrap();

    let response = app.oneshot(get("/ready")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = json_body(response.into_body()).await;
    assert_eq!(body["status"], "not ready");
    assert!(body["failures"]["posta1"].is_string());
}

#[tokio::test]
async fn test_missing_zone_table_fails_startup() {
    let dir = tempfile::tempdir().unwrap();
    let config = RateTablesConfig {
        tables_dir: Some(dir.path().to_path_buf()),
        ..RateTablesConfig::default()
    };

    assert!(build_service(&config).is_err());
}

#[tokio::test]
async fn test_openapi_document_lists_rate_paths() {
    let response = embedded_app()
        .oneshot(get("/api-docs/openapi.json"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response.into_body()).await;
    assert!(body["paths"].get("/api/rates/quote").is_some());
    assert!(body["paths"].get("/api/rates/zones/{country}").is_some());
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let response = embedded_app().oneshot(get("/api/nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[test]
fn test_invalid_cors_origin_is_rejected() {
    assert!(server::cors_layer(" , ").is_err());
    assert!(server::cors_layer("http://localhost:3000,https://example.com").is_ok());
}
