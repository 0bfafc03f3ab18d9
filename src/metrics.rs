use axum::{http::StatusCode, routing::get, Router};
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

static HANDLE: OnceCell<Option<PrometheusHandle>> = OnceCell::new();

#[derive(Clone)]
pub struct Metrics {
    handle: Option<PrometheusHandle>,
}

impl Metrics {
    /// Install the Prometheus recorder once per process and describe the series.
    /// Later calls reuse the same handle (tests build many routers).
    pub fn init() -> Self {
        let handle = HANDLE
            .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
                Ok(h) => {
                    describe();
                    Some(h)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "prometheus recorder not installed");
                    None
                }
            })
            .clone();
        Self { handle }
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router<S>(&self) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move {
                    match h {
                        Some(h) => (StatusCode::OK, h.render()),
                        None => (
                            StatusCode::SERVICE_UNAVAILABLE,
                            "metrics recorder unavailable".to_string(),
                        ),
                    }
                }
            }),
        )
    }
}

fn describe() {
    describe_counter!("sov_analyses_total", "Completed share-of-voice analyses.");
    describe_counter!(
        "sov_upstream_requests_total",
        "Calls made to the video platform API, by endpoint."
    );
    describe_counter!(
        "sov_upstream_errors_total",
        "Failed video platform calls, by error kind."
    );
    describe_counter!(
        "sov_comments_absorbed_total",
        "Videos whose comments were disabled and scored as neutral."
    );
    describe_histogram!("sov_analysis_ms", "End-to-end analysis time in milliseconds.");
}
