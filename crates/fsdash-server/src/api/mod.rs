mod records;
mod summary;

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use fsdash_core::ServiceKind;
use fsdash_feed::{CacheStatus, CachedRecords, FailureKind, FeedError, FeedSource, RecordCache};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{request_id, RequestId, REQUEST_ID_HEADER};

#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<RecordCache<FeedSource>>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

/// A feed that could not be loaded, reported inside an otherwise successful
/// response so the dashboard can render the other kind and an error banner.
#[derive(Debug, Clone, Serialize)]
pub(super) struct FeedFailure {
    pub kind: ServiceKind,
    pub category: FailureKind,
    pub message: String,
}

impl FeedFailure {
    fn new(kind: ServiceKind, error: &FeedError) -> Self {
        Self {
            kind,
            category: error.category(),
            message: format!("{} are unavailable: {error}", kind.label()),
        }
    }
}

#[derive(Debug, Serialize)]
struct HealthData {
    status: &'static str,
    cache: Vec<CacheStatus>,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn parse_kind(request_id: &str, raw: &str) -> Result<ServiceKind, ApiError> {
    raw.parse::<ServiceKind>()
        .map_err(|e| ApiError::new(request_id, "bad_request", e.to_string()))
}

/// Reads `kind` through the cache, converting a feed failure into a
/// [`FeedFailure`] for the response body.
pub(super) async fn load_records(
    state: &AppState,
    kind: ServiceKind,
) -> Result<CachedRecords, FeedFailure> {
    state.cache.snapshot(kind).await.map_err(|e| {
        tracing::warn!(%kind, error = %e, category = ?e.category(), "serving degraded response");
        FeedFailure::new(kind, &e)
    })
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/records/{kind}", get(records::list_records))
        .route("/api/v1/pins/{kind}", get(records::list_pins))
        .route("/api/v1/districts/{kind}", get(records::list_districts))
        .route("/api/v1/summary", get(summary::get_summary))
        .route("/api/v1/refresh", post(summary::refresh))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    Json(ApiResponse {
        data: HealthData {
            status: "ok",
            cache: state.cache.status().await,
        },
        meta: ResponseMeta::new(req_id.0),
    })
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
