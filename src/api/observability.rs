//! Request logging and Prometheus metrics.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{Instrument, field, info, info_span};
use uuid::Uuid;

use super::{AppState, auth::GateOutcome};

/// GET /metrics
pub async fn get_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.prometheus_handle.as_ref().map_or_else(
        || "Metrics not enabled or failed to initialize".to_string(),
        metrics_exporter_prometheus::PrometheusHandle::render,
    )
}

/// Route label for a request path. Food names never become label values.
fn route_label(path: &str) -> &'static str {
    match path {
        "/test" => "/test",
        "/login" => "/login",
        "/create-account" => "/create-account",
        "/google-login" => "/google-login",
        "/metrics" => "/metrics",
        "/api/search-history" => "/api/search-history",
        p if p.starts_with("/api/") && !p[5..].contains('/') => "/api/{food}",
        _ => "unmatched",
    }
}

/// Wraps every request in a `request` span and emits one "Request finished"
/// event carrying the session-gate outcome and, once admitted, the username.
pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let route = route_label(req.uri().path());

    let span = info_span!(
        "request",
        request_id = %Uuid::new_v4(),
        method = %method,
        path = %req.uri().path(),
        user_id = field::Empty,
    );

    let response = next.run(req).instrument(span.clone()).await;

    let status = response.status().as_u16();
    let gate = response.extensions().get::<GateOutcome>();
    let gate_label = gate.map_or("public", GateOutcome::label);
    let username = match gate {
        Some(GateOutcome::Admitted { username }) => Some(username.as_str()),
        _ => None,
    };

    let labels = [
        ("method", method),
        ("route", route.to_string()),
        ("status", status.to_string()),
        ("gate", gate_label.to_string()),
    ];
    metrics::counter!("http_requests_total", &labels).increment(1);
    metrics::histogram!("http_request_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());

    if let Some(username) = username {
        span.record("user_id", username);
    }

    span.in_scope(|| {
        info!(
            status_code = status,
            duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            gate = gate_label,
            user = username.unwrap_or("-"),
            "Request finished"
        );
    });

    response
}
