use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use fsdash_core::{summarize, ServiceKind, ServiceSummary};
use fsdash_feed::CacheStatus;
use serde::Serialize;

use crate::middleware::RequestId;

use super::{load_records, ApiResponse, AppState, FeedFailure, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct SummaryData {
    pub summary: ServiceSummary,
    pub ambulance_fetched_at: Option<DateTime<Utc>>,
    pub fire_station_fetched_at: Option<DateTime<Utc>>,
    /// One entry per kind that could not be loaded; its figures count as zero.
    pub errors: Vec<FeedFailure>,
}

#[derive(Debug, Serialize)]
pub(super) struct RefreshData {
    pub invalidated: bool,
    pub cache: Vec<CacheStatus>,
}

pub(super) async fn get_summary(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<SummaryData>> {
    let mut errors = Vec::new();

    let ambulance = match load_records(&state, ServiceKind::AmbulanceDepot).await {
        Ok(cached) => Some(cached),
        Err(failure) => {
            errors.push(failure);
            None
        }
    };
    let fire_stations = match load_records(&state, ServiceKind::FireStation).await {
        Ok(cached) => Some(cached),
        Err(failure) => {
            errors.push(failure);
            None
        }
    };

    let summary = summarize(
        ambulance.as_ref().map_or(&[][..], |c| &c.records[..]),
        fire_stations.as_ref().map_or(&[][..], |c| &c.records[..]),
    );

    Json(ApiResponse {
        data: SummaryData {
            summary,
            ambulance_fetched_at: ambulance.map(|c| c.fetched_at),
            fire_station_fetched_at: fire_stations.map(|c| c.fetched_at),
            errors,
        },
        meta: ResponseMeta::new(req_id.0),
    })
}

/// Drops both cached record sets; the next read of each kind re-fetches.
pub(super) async fn refresh(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<RefreshData>> {
    state.cache.invalidate().await;
    tracing::info!(request_id = %req_id.0, "manual refresh requested");

    Json(ApiResponse {
        data: RefreshData {
            invalidated: true,
            cache: state.cache.status().await,
        },
        meta: ResponseMeta::new(req_id.0),
    })
}
