//! Observability utilities for the postal rate services.
//!
//! This crate provides:
//! - Prometheus metrics recording and export
//! - Quote and tariff table metrics
//! - Axum middleware for automatic request metrics
//!
//! # Example
//!
//! ```rust,ignore
//! use observability::{init_metrics, metrics_handler, QuoteMetrics};
//!
//! // Initialize metrics recorder
//! init_metrics();
//!
//! // Record quote operations
//! QuoteMetrics::record_tariff_load("posta1", true);
//!
//! // Add metrics endpoint to router
//! let app = Router::new()
//!     .route("/metrics", get(metrics_handler));
//! ```

pub mod middleware;
pub mod quotes;

pub use middleware::metrics_middleware;
pub use quotes::QuoteMetrics;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use tracing::{info, warn};

static METRICS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Initialize the Prometheus metrics recorder.
///
/// This should be called once at application startup.
/// Returns the PrometheusHandle for rendering metrics.
pub fn init_metrics() -> &'static PrometheusHandle {
    METRICS_HANDLE.get_or_init(|| {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        match metrics::set_global_recorder(recorder) {
            Ok(()) => info!("Prometheus metrics recorder initialized"),
            Err(err) => warn!("Metrics recorder already installed: {}", err),
        }

        register_metric_descriptions();

        handle
    })
}

/// Get the metrics handle (must call init_metrics first)
pub fn get_metrics_handle() -> Option<&'static PrometheusHandle> {
    METRICS_HANDLE.get()
}

/// Axum handler for /metrics endpoint
pub async fn metrics_handler() -> String {
    match get_metrics_handle() {
        Some(handle) => handle.render(),
        None => "# Metrics not initialized\n".to_string(),
    }
}

/// Register metric descriptions for documentation
fn register_metric_descriptions() {
    use metrics::describe_counter;
    use metrics::describe_gauge;
    use metrics::describe_histogram;

    // HTTP metrics
    describe_counter!("http_requests_total", "Total number of HTTP requests");
    describe_histogram!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds"
    );
    describe_counter!(
        "http_requests_errors_total",
        "Total number of HTTP request errors"
    );

    // Quote metrics
    describe_counter!(
        "postal_quotes_total",
        "Quote requests by product and outcome"
    );
    describe_counter!("postal_quote_errors_total", "Failed quotes by error code");
    describe_histogram!("postal_quote_total_cents", "Quoted totals in euro cents");
    describe_histogram!(
        "postal_quote_duration_seconds",
        "Quote computation time in seconds"
    );

    // Tariff table metrics
    describe_counter!(
        "postal_tariff_loads_total",
        "Tariff table load attempts by table and status"
    );
    describe_gauge!(
        "postal_tariff_tables_loaded",
        "Tariff tables currently cached"
    );
}
