use axum::{extract::State, routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;

/// Process-health surface: `/health` for liveness probes and `/metrics`
/// for Prometheus scrapes. The collectors never touch this router.
pub fn create_app(metrics_handle: PrometheusHandle) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(render_metrics))
        .with_state(metrics_handle)
}

async fn health() -> &'static str {
    "OK"
}

async fn render_metrics(State(handle): State<PrometheusHandle>) -> String {
    handle.render()
}
