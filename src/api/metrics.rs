//! Prometheus metrics endpoint and HTTP request tracking middleware.
//!
//! This module provides:
//! - A `/metrics` endpoint that returns Prometheus-formatted metrics
//! - Middleware for tracking HTTP request counts and durations
//! - Helper functions to record sale, ledger and login events

use axum::{
    body::Body,
    extract::{MatchedPath, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::sync::Arc;
use std::time::Instant;

use crate::AppState;

pub const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";
pub const HTTP_REQUEST_DURATION_SECONDS: &str = "http_request_duration_seconds";
pub const SALES_RECORDED_TOTAL: &str = "sales_recorded_total";
pub const LEDGER_UPDATES_TOTAL: &str = "ledger_updates_total";
pub const LOGIN_FAILURES_TOTAL: &str = "login_failures_total";
pub const PRODUCTS_TOTAL: &str = "products_total";
pub const CUSTOMERS_TOTAL: &str = "customers_total";

/// Install the global Prometheus recorder and return a handle for rendering metrics.
///
/// Call once during startup. Without it the `counter!` calls are no-ops.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    describe_counter!(
        HTTP_REQUESTS_TOTAL,
        "Total number of HTTP requests received"
    );
    describe_histogram!(
        HTTP_REQUEST_DURATION_SECONDS,
        "HTTP request duration in seconds"
    );
    describe_counter!(SALES_RECORDED_TOTAL, "Total number of recorded sales");
    describe_counter!(
        LEDGER_UPDATES_TOTAL,
        "Customer ledger updates after a sale by outcome (applied/skipped/failed)"
    );
    describe_counter!(LOGIN_FAILURES_TOTAL, "Total number of rejected logins");
    describe_gauge!(PRODUCTS_TOTAL, "Number of products in the catalog");
    describe_gauge!(CUSTOMERS_TOTAL, "Number of customers in the ledger");

    Ok(handle)
}

/// GET /metrics - Returns Prometheus-formatted metrics.
///
/// This endpoint is accessible without authentication.
pub async fn metrics_endpoint(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    update_gauge_metrics(&state).await;

    match state.metrics_handle.as_ref() {
        Some(h) => (StatusCode::OK, h.render()),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            "Metrics not initialized".to_string(),
        ),
    }
}

async fn update_gauge_metrics(state: &AppState) {
    if let Ok(count) = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products")
        .fetch_one(&state.db)
        .await
    {
        gauge!(PRODUCTS_TOTAL).set(count as f64);
    }

    if let Ok(count) = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM customers")
        .fetch_one(&state.db)
        .await
    {
        gauge!(CUSTOMERS_TOTAL).set(count as f64);
    }
}

/// Middleware to track HTTP request metrics.
///
/// Records:
/// - `http_requests_total` counter with method, path, and status labels
/// - `http_request_duration_seconds` histogram with method and path labels
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();

    // Matched route template (e.g. /api/products/:id) keeps label cardinality bounded
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|mp| mp.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let method = request.method().to_string();

    let response = next.run(request).await;

    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    counter!(HTTP_REQUESTS_TOTAL, "method" => method.clone(), "path" => path.clone(), "status" => status).increment(1);
    histogram!(HTTP_REQUEST_DURATION_SECONDS, "method" => method, "path" => path).record(duration);

    response
}

pub fn record_sale() {
    counter!(SALES_RECORDED_TOTAL).increment(1);
}

/// Record the outcome of the ledger step that follows a sale
pub fn record_ledger_update(outcome: &'static str) {
    counter!(LEDGER_UPDATES_TOTAL, "outcome" => outcome).increment(1);
}

pub fn record_login_failure() {
    counter!(LOGIN_FAILURES_TOTAL).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names() {
        for name in [
            HTTP_REQUESTS_TOTAL,
            SALES_RECORDED_TOTAL,
            LEDGER_UPDATES_TOTAL,
            LOGIN_FAILURES_TOTAL,
        ] {
            assert!(name.ends_with("_total"), "{}", name);
        }
        assert!(HTTP_REQUEST_DURATION_SECONDS.ends_with("_seconds"));
    }
}
