use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::export::{ExportError, ExportStore};
use crate::metrics::Metrics;
use crate::report::{Analyzer, Report, ReportError};
use crate::youtube::{UpstreamError, MAX_PAGE_SIZE};

pub const CSV_NOT_FOUND: &str = "CSV not found. Run /analyze first.";

#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<Analyzer>,
    pub exports: Arc<ExportStore>,
    pub default_results: u32,
    pub cors_origin: HeaderValue,
    pub metrics: Metrics,
}

pub fn router(state: AppState) -> Router {
    // credentialed requests from exactly one origin, GET only;
    // other origins get no Access-Control-Allow-Origin at all
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list([state.cors_origin.clone()]))
        .allow_methods([Method::GET])
        .allow_credentials(true);

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/analyze", get(analyze))
        .route("/download_csv", get(download_latest))
        .route("/download_csv/{id}", get(download_by_id))
        .merge(state.metrics.router())
        .layer(cors)
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct AnalyzeParams {
    #[serde(default)]
    query: Option<String>,
    // kept as text so a bad value gets our JSON error, not the extractor's
    #[serde(default)]
    results: Option<String>,
}

async fn analyze(
    State(state): State<AppState>,
    Query(params): Query<AnalyzeParams>,
) -> Result<Json<Report>, ApiError> {
    let query = params.query.as_deref().map(str::trim).unwrap_or("");
    if query.is_empty() {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "invalid_query",
            "query must not be empty",
        ));
    }

    let results = match params.results.as_deref().map(str::trim) {
        None | Some("") => state.default_results,
        Some(raw) => raw
            .parse::<u32>()
            .ok()
            .filter(|n| *n <= MAX_PAGE_SIZE)
            .ok_or_else(|| {
                ApiError::new(
                    StatusCode::BAD_REQUEST,
                    "invalid_results",
                    format!("results must be an integer between 0 and {MAX_PAGE_SIZE}"),
                )
            })?,
    };

    let report = state.analyzer.run(query, results).await?;
    Ok(Json(report))
}

async fn download_latest(State(state): State<AppState>) -> Result<Response, ApiError> {
    let handle = state.exports.latest().ok_or(ExportError::NotFound)?;
    let bytes = state.exports.read(&handle).await?;
    Ok(csv_attachment(bytes))
}

async fn download_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let handle = state.exports.resolve(&id).await?;
    let bytes = state.exports.read(&handle).await?;
    Ok(csv_attachment(bytes))
}

fn csv_attachment(bytes: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"results.csv\""),
        ],
        bytes,
    )
        .into_response()
}

/// JSON error body `{ "error": <message>, "code": <machine code> }` with a non-2xx status.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.message, "code": self.code });
        (self.status, Json(body)).into_response()
    }
}

impl From<UpstreamError> for ApiError {
    fn from(e: UpstreamError) -> Self {
        let (status, code) = match &e {
            UpstreamError::Auth(_) => (StatusCode::BAD_GATEWAY, "upstream_auth"),
            UpstreamError::QuotaExceeded(_) => (StatusCode::TOO_MANY_REQUESTS, "upstream_quota"),
            UpstreamError::NotFound(_) => (StatusCode::BAD_GATEWAY, "upstream_not_found"),
            UpstreamError::Transient(_) => (StatusCode::SERVICE_UNAVAILABLE, "upstream_unavailable"),
            UpstreamError::Decode(_) => (StatusCode::BAD_GATEWAY, "upstream_decode"),
            UpstreamError::CommentsDisabled(_) => {
                (StatusCode::BAD_GATEWAY, "upstream_comments_disabled")
            }
            UpstreamError::Rejected { .. } => (StatusCode::BAD_GATEWAY, "upstream_rejected"),
        };
        tracing::warn!(error = %e, code, "analysis aborted by upstream failure");
        ApiError::new(status, code, e.to_string())
    }
}

impl From<ExportError> for ApiError {
    fn from(e: ExportError) -> Self {
        match e {
            ExportError::NotFound => ApiError::new(StatusCode::NOT_FOUND, "csv_not_found", CSV_NOT_FOUND),
            ExportError::InvalidId => ApiError::new(
                StatusCode::BAD_REQUEST,
                "invalid_export_id",
                "export id must be a sha256 hex digest",
            ),
            other => {
                tracing::error!(error = %other, "csv export failed");
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "export_failed", other.to_string())
            }
        }
    }
}

impl From<ReportError> for ApiError {
    fn from(e: ReportError) -> Self {
        match e {
            ReportError::Upstream(u) => u.into(),
            ReportError::Export(x) => x.into(),
            ReportError::Aggregate(a) => {
                tracing::error!(error = %a, "aggregation failed");
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "aggregate_failed", a.to_string())
            }
            ReportError::Chart(c) => {
                tracing::error!(error = %c, "chart rendering failed");
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "chart_failed", c.to_string())
            }
            ReportError::Worker(w) => {
                tracing::error!(error = %w, "per-video worker failed");
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "internal", w)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_kinds_map_to_distinct_codes() {
        let quota: ApiError = UpstreamError::QuotaExceeded("q".into()).into();
        assert_eq!(quota.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(quota.code(), "upstream_quota");

        let auth: ApiError = UpstreamError::Auth("k".into()).into();
        assert_eq!(auth.code(), "upstream_auth");

        let net: ApiError = UpstreamError::Transient("t".into()).into();
        assert_eq!(net.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn missing_export_is_404_with_code() {
        let e: ApiError = ExportError::NotFound.into();
        assert_eq!(e.status(), StatusCode::NOT_FOUND);
        assert_eq!(e.code(), "csv_not_found");
    }
}
