//! Liveness and readiness endpoints

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use core_config::AppInfo;
use domain_postal_rates::{QuoteService, RateTableSource};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub name: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadyResponse {
    pub status: &'static str,
    pub source: String,
    pub tables: usize,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub failures: BTreeMap<&'static str, String>,
}

/// Health check endpoint handler.
///
/// Always returns 200 while the process is serving requests.
pub async fn health_handler(State(app): State<AppInfo>) -> Response {
    let response = HealthResponse {
        status: "healthy",
        name: app.name,
        version: app.version,
    };

    (StatusCode::OK, Json(response)).into_response()
}

/// Readiness check endpoint handler.
///
/// Loads any tariff table that is not cached yet and returns 503 while at
/// least one of them fails.
pub async fn ready_handler<S: RateTableSource + 'static>(
    State(service): State<QuoteService<S>>,
) -> Response {
    let source = service.source_description();
    let tables = service.catalog().len();
    let warm = service.clone();

    let failures = match tokio::task::spawn_blocking(move || warm.warm_up()).await {
        Ok(failures) => failures
            .into_iter()
            .map(|(table, err)| (table.as_str(), err.to_string()))
            .collect::<BTreeMap<_, _>>(),
        Err(err) => {
            tracing::error!("Readiness check panicked: {}", err);
            return StatusCode::SERVICE_UNAVAILABLE.into_response();
        }
    };

    for (table, error) in &failures {
        tracing::error!(table = table, error = %error, "Readiness check failed");
    }

    let status = if failures.is_empty() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let response = ReadyResponse {
        status: if failures.is_empty() { "ready" } else { "not ready" },
        source,
        tables,
        failures,
    };

    (status, Json(response)).into_response()
}

/// Creates a router with the /health endpoint.
pub fn health_router(app_info: AppInfo) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .with_state(app_info)
}

/// Creates a router with the /ready endpoint.
pub fn ready_router<S: RateTableSource + 'static>(service: QuoteService<S>) -> Router {
    Router::new()
        .route("/ready", get(ready_handler::<S>))
        .with_state(service)
}
